use std::{
    io::{BufRead, BufReader, Read, Write},
    net::TcpStream,
    time::Duration,
};

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, info};
use serial::SystemPort;

use crate::{
    error::Error,
    protocols::{protocol_error::ProtocolError, Instr, Protocol, Serial, Tcp, Vxi11},
    scpi::{com_cmd, scpi_error::ScpiError, Command, Scpi},
    visa::{self, Resource},
};

const TERMINATOR: u8 = b'\n';

/// Newline framed SCPI over any byte stream (raw socket, serial port).
pub struct Messenger<IO: Write + Read> {
    io: BufReader<IO>,
    buf: Vec<u8>,
}

impl<IO: Write + Read> Messenger<IO> {
    pub fn new(io: IO) -> Self {
        Self {
            io: BufReader::new(io),
            buf: Vec::new(),
        }
    }
    pub fn get_mut(&mut self) -> &mut IO {
        self.io.get_mut()
    }
    pub fn into_inner(self) -> IO {
        self.io.into_inner()
    }

    fn read_line(&mut self) -> std::io::Result<()> {
        self.buf.clear();
        let n = self.io.read_until(TERMINATOR, &mut self.buf)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "instrument closed the connection",
            ));
        }
        Ok(())
    }
}

impl<IO: Write + Read> Scpi for Messenger<IO> {
    fn scpi_send<C: AsRef<[u8]>>(&mut self, command: C) -> Result<(), ScpiError> {
        let command = command.as_ref();
        debug!("-> {}", String::from_utf8_lossy(command));
        let io = self.io.get_mut();
        io.write_all(command)?;
        if command.last() != Some(&TERMINATOR) {
            io.write_all(&[TERMINATOR])?;
        }
        io.flush()?;
        Ok(())
    }

    fn scpi_read(&mut self) -> Result<Bytes, ScpiError> {
        self.read_line()?;
        Ok(Bytes::copy_from_slice(&self.buf))
    }

    /// Reads a definite-length block without looking for newlines inside
    /// the payload. Replies that do not start with `#` are read as a line.
    fn scpi_read_raw(&mut self) -> Result<Bytes, ScpiError> {
        let mut head = [0u8; 2];
        self.io.read_exact(&mut head)?;
        if head[0] != b'#' {
            let mut out = BytesMut::from(&head[..]);
            if head[1] != TERMINATOR {
                self.read_line()?;
                out.put_slice(&self.buf);
            }
            return Ok(out.freeze());
        }
        let digits = (head[1] as char).to_digit(10).ok_or_else(|| {
            ScpiError::MalformedBlock(format!("bad digit count '{}'", head[1] as char))
        })? as usize;
        let mut out = BytesMut::from(&head[..]);
        if digits == 0 {
            self.read_line()?;
            out.put_slice(&self.buf);
            return Ok(out.freeze());
        }
        let mut len_field = vec![0u8; digits];
        self.io.read_exact(&mut len_field)?;
        let len = std::str::from_utf8(&len_field)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| ScpiError::MalformedBlock("non-numeric length field".to_string()))?;
        out.put_slice(&len_field);
        let mut payload = vec![0u8; len];
        self.io.read_exact(&mut payload)?;
        out.put_slice(&payload);
        // trailing newline after the block
        self.read_line()?;
        Ok(out.freeze())
    }
}

impl Scpi for Vxi11 {
    fn scpi_send<C: AsRef<[u8]>>(&mut self, command: C) -> Result<(), ScpiError> {
        let command = command.as_ref();
        debug!("-> {}", String::from_utf8_lossy(command));
        let mut message = command.to_vec();
        if message.last() != Some(&TERMINATOR) {
            message.push(TERMINATOR);
        }
        self.device_write(&message).map_err(ProtocolError::from)?;
        Ok(())
    }

    fn scpi_read(&mut self) -> Result<Bytes, ScpiError> {
        Ok(self.device_read().map_err(ProtocolError::from)?)
    }
}

/// An open link to an instrument, chosen by its VISA resource string.
pub enum Session {
    Socket(Messenger<TcpStream>),
    Serial(Messenger<SystemPort>),
    Vxi11(Vxi11),
}

impl Session {
    pub fn open(resource: &Resource, time_out: Duration) -> Result<Self, Error> {
        info!("opening {}", resource);
        let session = match resource {
            Resource::Instr { host, device, .. } => {
                let ip = visa::resolve_ip(host)?;
                let link = Instr {
                    device: device.clone(),
                }
                .connect(ip, time_out)
                .map_err(ProtocolError::from)?;
                Session::Vxi11(link)
            }
            Resource::Socket { host, port, .. } => {
                let addr = visa::resolve(host, *port)?;
                let stream = Tcp.connect(addr, time_out).map_err(ProtocolError::from)?;
                Session::Socket(Messenger::new(stream))
            }
            Resource::Serial { board } => {
                let port = Serial::default()
                    .connect(*board, time_out)
                    .map_err(ProtocolError::from)?;
                Session::Serial(Messenger::new(port))
            }
        };
        Ok(session)
    }

    /// Device clear: aborts pending output and empties the input buffer.
    pub fn clear(&mut self) -> Result<(), ScpiError> {
        match self {
            Session::Vxi11(link) => Ok(link.device_clear().map_err(ProtocolError::from)?),
            _ => self.scpi_send(Command::from(com_cmd::Command::CLS)),
        }
    }

    /// Returns the front panel to the operator.
    pub fn set_local(&mut self) -> Result<(), ScpiError> {
        match self {
            Session::Vxi11(link) => Ok(link.device_local().map_err(ProtocolError::from)?),
            _ => {
                debug!("go-to-local has no meaning on a stream link");
                Ok(())
            }
        }
    }

    pub fn close(self) -> Result<(), Error> {
        info!("closing session");
        match self {
            Session::Vxi11(link) => link.close().map_err(ProtocolError::from)?,
            Session::Socket(messenger) => {
                messenger
                    .into_inner()
                    .shutdown(std::net::Shutdown::Both)
                    .map_err(ProtocolError::from)?;
            }
            Session::Serial(_) => {}
        }
        Ok(())
    }
}

impl Scpi for Session {
    fn scpi_send<C: AsRef<[u8]>>(&mut self, command: C) -> Result<(), ScpiError> {
        match self {
            Session::Socket(m) => m.scpi_send(command),
            Session::Serial(m) => m.scpi_send(command),
            Session::Vxi11(v) => v.scpi_send(command),
        }
    }
    fn scpi_read(&mut self) -> Result<Bytes, ScpiError> {
        match self {
            Session::Socket(m) => m.scpi_read(),
            Session::Serial(m) => m.scpi_read(),
            Session::Vxi11(v) => v.scpi_read(),
        }
    }
    fn scpi_read_raw(&mut self) -> Result<Bytes, ScpiError> {
        match self {
            Session::Socket(m) => m.scpi_read_raw(),
            Session::Serial(m) => m.scpi_read_raw(),
            Session::Vxi11(v) => v.scpi_read_raw(),
        }
    }
}
