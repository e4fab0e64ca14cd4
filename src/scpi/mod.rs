use bytes::Bytes;
use log::debug;

pub mod com_cmd;
#[cfg(test)]
pub(crate) mod mock;
pub mod scpi_error;

use scpi_error::ScpiError;

type Result<T> = std::result::Result<T, ScpiError>;

/// A link that carries SCPI messages: one command per `scpi_send`,
/// one reply per `scpi_read`.
pub trait Scpi {
    fn scpi_send<C: AsRef<[u8]>>(&mut self, command: C) -> Result<()>;
    fn scpi_read(&mut self) -> Result<Bytes>;
    /// Reads a reply that may carry arbitrary bytes, such as a
    /// definite-length block. Links that frame replies on newlines
    /// override this.
    fn scpi_read_raw(&mut self) -> Result<Bytes> {
        self.scpi_read()
    }
    fn scpi_query<C: AsRef<[u8]>>(&mut self, command: C) -> Result<String> {
        self.scpi_send(command)?;
        let reply = self.scpi_read()?;
        let reply = String::from_utf8_lossy(&reply).trim().to_string();
        debug!("reply: {}", reply);
        Ok(reply)
    }
    fn get_event_byte(&mut self) -> Result<EventStatusByte> {
        let reply = self.scpi_query(Command::from(com_cmd::Query::ESR))?;
        Ok(EventStatusByte::new(parse_register(&reply)?))
    }
    fn get_status_byte(&mut self) -> Result<StatusByte> {
        let reply = self.scpi_query(Command::from(com_cmd::Query::STB))?;
        Ok(StatusByte::new(parse_register(&reply)?))
    }
    fn set_event_mask(&mut self, byte: EventStatusByte) -> Result<()> {
        self.scpi_send(Command::from(com_cmd::Command::ESE).para(byte.to_string()))
    }
    fn set_service_mask(&mut self, byte: StatusByte) -> Result<()> {
        self.scpi_send(Command::from(com_cmd::Command::SRE).para(byte.to_string()))
    }
    /// Pops one entry of the instrument's error queue, `None` once empty.
    fn next_error(&mut self) -> Result<Option<ScpiError>> {
        let reply = self.scpi_query("SYSTem:ERRor?")?;
        parse_error_entry(&reply)
    }
}

fn parse_register(reply: &str) -> Result<u8> {
    let trimmed = reply.trim().trim_start_matches('+');
    trimmed
        .parse::<u8>()
        .map_err(|_| ScpiError::InvalidReply(format!("register value '{}'", reply)))
}

/// Parses a `SYSTem:ERRor?` entry such as `-113,"Undefined header"`.
pub fn parse_error_entry(reply: &str) -> Result<Option<ScpiError>> {
    let (code, message) = match reply.split_once(',') {
        Some((code, message)) => (code, message),
        None => (reply, ""),
    };
    let code = code
        .trim()
        .trim_start_matches('+')
        .parse::<i32>()
        .map_err(|_| ScpiError::InvalidReply(format!("error queue entry '{}'", reply)))?;
    if code == 0 {
        return Ok(None);
    }
    Ok(Some(ScpiError::Instrument {
        code,
        message: message.trim().trim_matches('"').to_string(),
    }))
}

/// Extracts the payload of an IEEE 488.2 definite-length block
/// (`#<n><length><payload>`). A `#0` header marks an indefinite block that
/// runs up to the final newline.
pub fn definite_block(data: &[u8]) -> Result<&[u8]> {
    let start = data
        .iter()
        .position(|b| *b == b'#')
        .ok_or_else(|| ScpiError::MalformedBlock("missing '#' header".to_string()))?;
    let data = &data[start + 1..];
    let digits = data
        .first()
        .and_then(|d| (*d as char).to_digit(10))
        .ok_or_else(|| ScpiError::MalformedBlock("missing length digit count".to_string()))?
        as usize;
    let data = &data[1..];
    if digits == 0 {
        let end = data
            .iter()
            .rposition(|b| *b == b'\n')
            .unwrap_or(data.len());
        return Ok(&data[..end]);
    }
    if data.len() < digits {
        return Err(ScpiError::MalformedBlock("truncated length field".to_string()));
    }
    let len = std::str::from_utf8(&data[..digits])
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| ScpiError::MalformedBlock("non-numeric length field".to_string()))?;
    let payload = &data[digits..];
    if payload.len() < len {
        return Err(ScpiError::MalformedBlock(format!(
            "expected {} bytes, found {}",
            len,
            payload.len()
        )));
    }
    Ok(&payload[..len])
}

/// A SCPI program message under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    pub fn new<S: ToString>(s: S) -> Self {
        Self(s.to_string())
    }
    pub fn query(mut self) -> Self {
        self.0.push('?');
        self
    }
    /// Appends a parameter, separated from the header by a space and
    /// from previous parameters by a comma.
    pub fn para<P: AsRef<str>>(mut self, para: P) -> Self {
        if self.0.contains(' ') {
            self.0.push(',');
        } else {
            self.0.push(' ');
        }
        self.0.push_str(para.as_ref());
        self
    }
    /// Appends a quoted string parameter.
    pub fn quoted<P: AsRef<str>>(self, para: P) -> Self {
        let escaped = para.as_ref().replace('"', "\"\"");
        self.para(format!("\"{}\"", escaped))
    }
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
    pub fn into_inner(self) -> String {
        self.0
    }
}
impl AsRef<[u8]> for Command {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
impl From<&str> for Command {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
impl From<String> for Command {
    fn from(s: String) -> Self {
        Self(s)
    }
}
impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusByte(u8);
impl StatusByte {
    pub fn new(b: u8) -> Self {
        Self(b)
    }
    pub fn byte(&self) -> u8 {
        self.0
    }

    pub fn is_triggered(&self) -> bool {
        self.0 & (1 << 0) != 0
    }
    pub fn triggered(mut self) -> Self {
        self.0 |= 1 << 0;
        self
    }
    pub fn is_displaying_message(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    pub fn displaying_message(mut self) -> Self {
        self.0 |= 1 << 2;
        self
    }
    pub fn is_message_available(&self) -> bool {
        self.0 & (1 << 4) != 0
    }
    pub fn message_available(mut self) -> Self {
        self.0 |= 1 << 4;
        self
    }
    pub fn is_event_happened(&self) -> bool {
        self.0 & (1 << 5) != 0
    }
    pub fn event_happened(mut self) -> Self {
        self.0 |= 1 << 5;
        self
    }
    pub fn is_requesting_service(&self) -> bool {
        self.0 & (1 << 6) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventStatusByte(u8);
impl EventStatusByte {
    pub fn new(b: u8) -> Self {
        Self(b)
    }
    pub fn byte(&self) -> u8 {
        self.0
    }
    pub fn is_command_err(&self) -> bool {
        self.0 & (1 << 5) != 0
    }
    pub fn command_err(mut self) -> Self {
        self.0 |= 1 << 5;
        self
    }
    pub fn is_execution_err(&self) -> bool {
        self.0 & (1 << 4) != 0
    }
    pub fn execution_err(mut self) -> Self {
        self.0 |= 1 << 4;
        self
    }
    pub fn is_device_dep_err(&self) -> bool {
        self.0 & (1 << 3) != 0
    }
    pub fn device_dep_err(mut self) -> Self {
        self.0 |= 1 << 3;
        self
    }
    pub fn is_query_err(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    pub fn query_err(mut self) -> Self {
        self.0 |= 1 << 2;
        self
    }
    pub fn is_opera_complete(&self) -> bool {
        self.0 & (1 << 0) != 0
    }
    pub fn opera_complete(mut self) -> Self {
        self.0 |= 1 << 0;
        self
    }
    /// The most severe error flagged in the register, if any.
    pub fn into_result(self) -> Result<()> {
        if self.is_command_err() {
            Err(ScpiError::CommandError)
        } else if self.is_execution_err() {
            Err(ScpiError::ExecutionError)
        } else if self.is_device_dep_err() {
            Err(ScpiError::DevDependError)
        } else if self.is_query_err() {
            Err(ScpiError::QueryError)
        } else {
            Ok(())
        }
    }
}
impl std::fmt::Display for StatusByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for EventStatusByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockLink;
    use super::*;

    #[test]
    fn command_builder_joins_parameters() {
        let cmd = Command::new("MEASure:VAVerage").query().para("DISPlay").para("CHANnel1");
        assert_eq!(cmd.as_str(), "MEASure:VAVerage? DISPlay,CHANnel1");
        let text = Command::new("DISPlay:ANN:TEXT").quoted("say \"hi\"");
        assert_eq!(text.as_str(), "DISPlay:ANN:TEXT \"say \"\"hi\"\"\"");
    }

    #[test]
    fn definite_block_payload() {
        let raw = b"#3005hello\n";
        assert_eq!(definite_block(raw).unwrap(), b"hello");
        let indefinite = b"#0abc\n";
        assert_eq!(definite_block(indefinite).unwrap(), b"abc");
    }

    #[test]
    fn short_block_is_rejected() {
        assert!(matches!(
            definite_block(b"#210abc"),
            Err(ScpiError::MalformedBlock(_))
        ));
        assert!(definite_block(b"PNG").is_err());
    }

    #[test]
    fn error_queue_entries() {
        assert!(parse_error_entry("+0,\"No error\"").unwrap().is_none());
        match parse_error_entry("-113,\"Undefined header\"").unwrap() {
            Some(ScpiError::Instrument { code, message }) => {
                assert_eq!(code, -113);
                assert_eq!(message, "Undefined header");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn event_status_register_round_trip() {
        let mut link = MockLink::new().reply("+36");
        let esr = link.get_event_byte().unwrap();
        assert!(esr.is_command_err());
        assert!(esr.is_query_err());
        assert!(matches!(esr.into_result(), Err(ScpiError::CommandError)));
        assert_eq!(link.sent(), ["*ESR?"]);

        link.set_event_mask(EventStatusByte::new(0).opera_complete())
            .unwrap();
        assert_eq!(link.sent()[1], "*ESE 1");
    }

    #[test]
    fn status_byte_bits() {
        let stb = StatusByte::new(0).message_available().event_happened();
        assert_eq!(stb.byte(), 0b0011_0000);
        assert!(stb.is_message_available());
        assert!(!stb.is_requesting_service());
    }
}
