use std::ops::Deref;

use thiserror::Error;

use crate::{protocols::protocol_error::ProtocolError, scpi::scpi_error::ScpiError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("transfer layer error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),
    #[error("scpi error: {0}")]
    ScpiError(#[from] ScpiError),
    #[error("configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("invalid VISA resource {0}")]
    InvalidResource(String),
    #[error("invalid channel '{channel}' for {model}")]
    InvalidChannel { channel: String, model: &'static str },
    #[error("too many channels for autoscale: {count} given, {model} accepts at most {max}")]
    TooManyChannels {
        count: usize,
        max: usize,
        model: &'static str,
    },
    #[error("unknown oscilloscope model '{0}'")]
    UnknownModel(String),
    #[error("unknown measurement '{0}'")]
    UnknownMeasurement(String),
    #[error("{feature} is not available on {model}")]
    Unsupported {
        feature: &'static str,
        model: &'static str,
    },
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("{0}")]
    Other(#[from] OtherError),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::IOError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            Error::ProtocolError(e) => e.is_timeout(),
            Error::ScpiError(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct OtherError(String);

impl std::fmt::Display for OtherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.0)
    }
}

impl std::error::Error for OtherError {}
impl<'a> From<&'a str> for OtherError {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}
impl From<String> for OtherError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for Error {
    fn from(s: &'a str) -> Self {
        Error::Other(OtherError::from(s))
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(OtherError::from(s))
    }
}

pub fn other_error<S: Deref<Target = str>>(s: S) -> OtherError {
    OtherError(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_detected_through_layers() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow scope");
        assert!(Error::from(ScpiError::from(io)).is_timeout());
        assert!(!Error::from("plain").is_timeout());
    }

    #[test]
    fn validation_errors_name_the_model() {
        let e = Error::TooManyChannels {
            count: 6,
            max: 5,
            model: "MSOX3000",
        };
        assert_eq!(
            e.to_string(),
            "too many channels for autoscale: 6 given, MSOX3000 accepts at most 5"
        );
        assert_eq!(
            Error::from(other_error("boom")).to_string(),
            "error: boom"
        );
    }
}
