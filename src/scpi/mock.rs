use std::collections::VecDeque;

use bytes::Bytes;

use super::{scpi_error::ScpiError, Scpi};

/// In-memory link: records every command and answers reads from a script.
#[derive(Default)]
pub(crate) struct MockLink {
    sent: Vec<String>,
    replies: VecDeque<Bytes>,
}

impl MockLink {
    pub(crate) fn new() -> Self {
        Self::default()
    }
    pub(crate) fn reply<R: AsRef<[u8]>>(mut self, reply: R) -> Self {
        self.push_reply(reply);
        self
    }
    pub(crate) fn push_reply<R: AsRef<[u8]>>(&mut self, reply: R) {
        self.replies
            .push_back(Bytes::copy_from_slice(reply.as_ref()));
    }
    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Scpi for MockLink {
    fn scpi_send<C: AsRef<[u8]>>(&mut self, command: C) -> Result<(), ScpiError> {
        self.sent
            .push(String::from_utf8_lossy(command.as_ref()).into_owned());
        Ok(())
    }
    fn scpi_read(&mut self) -> Result<Bytes, ScpiError> {
        self.replies
            .pop_front()
            .ok_or_else(|| ScpiError::InvalidReply("no scripted reply left".to_string()))
    }
}
