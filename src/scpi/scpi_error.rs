use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScpiError {
    #[error("command error")]
    CommandError,
    #[error("execution error")]
    ExecutionError,
    #[error("device-dependent error")]
    DevDependError,
    #[error("query error")]
    QueryError,
    #[error("instrument error {code}: {message}")]
    Instrument { code: i32, message: String },
    #[error("malformed definite-length block: {0}")]
    MalformedBlock(String),
    #[error("unexpected reply: {0}")]
    InvalidReply(String),
    #[error("transfer layer error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    ProtocolError(#[from] crate::protocols::protocol_error::ProtocolError),
}

impl ScpiError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ScpiError::IOError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            ScpiError::ProtocolError(e) => e.is_timeout(),
            _ => false,
        }
    }
}
