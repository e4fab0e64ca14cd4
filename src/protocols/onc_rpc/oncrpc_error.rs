use thiserror::Error;

#[derive(Error, Debug)]
pub enum OncRpcError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("malformed rpc record: {0}")]
    Framing(#[from] onc_rpc::Error),
    #[error("procedure {procedure} not run: {refusal}")]
    Refused { procedure: u32, refusal: Refusal },
    #[error("cannot encode call arguments: {0}")]
    Encode(#[from] super::xdr::SerializationError),
    #[error("cannot decode reply results: {0}")]
    Decode(#[from] super::xdr::Error),
    #[error("reply xid {found:#010x} does not answer call {sent:#010x}")]
    XidMismatch { sent: u32, found: u32 },
    #[error("rpc error: '{0}'")]
    Other(String),
}

impl OncRpcError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            OncRpcError::IOError(e)
                if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock)
        )
    }
}

/// A reply that carries no results: the server either denied the call
/// or accepted it without running the procedure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    #[error("program not served")]
    ProgramUnavailable,
    #[error("program version not served, server has {low}-{high}")]
    ProgramMismatch { low: u32, high: u32 },
    #[error("procedure unknown to the server")]
    ProcedureUnavailable,
    #[error("server could not decode the arguments")]
    GarbageArgs,
    #[error("server error")]
    SystemError,
    #[error("rpc version not served, server has {low}-{high}")]
    RpcMismatch { low: u32, high: u32 },
    #[error("credentials rejected ({0})")]
    AuthRejected(String),
}
