use thiserror::Error;

#[derive(Error, Debug)]
pub enum Vxi11Error {
    #[error("syntax error")]
    SyntaxError,
    #[error("device not accessible")]
    NotAccessible,
    #[error("invalid link identifier")]
    InvalidIdentifier,
    #[error("parameter error")]
    ParameterError,
    #[error("channel not established")]
    NotEstablished,
    #[error("operation not supported")]
    NotSupported,
    #[error("out of resources")]
    OutOfResources,
    #[error("device locked by another link")]
    LockedByAnother,
    #[error("no lock held by this link")]
    NoLockHeld,
    #[error("I/O timeout")]
    IOTimeOut,
    #[error("I/O error")]
    IOError,
    #[error("invalid address")]
    InvalidAddress,
    #[error("abort")]
    Abort,
    #[error("channel already established")]
    AlreadyEstablished,
    #[error("unknown vxi11 error code: '{0}'")]
    Vxi11Unknown(i32),
    #[error("one-rpc error: {0}")]
    OncRpcError(#[from] super::super::oncrpc_error::OncRpcError),
    #[error("parse socket adderss error: {0}")]
    InvalidSocketAddr(#[from] std::io::Error),
    #[error("core channel is not registered with the port mapper")]
    NotRegistered,
    #[error("device accepted none of a {0} byte write")]
    WriteStalled(usize),
}

impl Vxi11Error {
    /// Maps a `Device_ErrorCode` to `Ok(())` or the matching error.
    pub fn check(code: i32) -> Result<(), Self> {
        use Vxi11Error::*;
        Err(match code {
            0 => return Ok(()),
            1 => SyntaxError,
            3 => NotAccessible,
            4 => InvalidIdentifier,
            5 => ParameterError,
            6 => NotEstablished,
            8 => NotSupported,
            9 => OutOfResources,
            11 => LockedByAnother,
            12 => NoLockHeld,
            15 => IOTimeOut,
            17 => IOError,
            21 => InvalidAddress,
            23 => Abort,
            29 => AlreadyEstablished,
            n => Vxi11Unknown(n),
        })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Vxi11Error::IOTimeOut => true,
            Vxi11Error::OncRpcError(e) => e.is_timeout(),
            Vxi11Error::InvalidSocketAddr(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
