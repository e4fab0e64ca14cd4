pub mod oncrpc_error;
pub mod port_mapper;
pub mod vxi11;
pub mod xdr;

use bytes::{Bytes, BytesMut};
use onc_rpc::{
    auth::AuthFlavor, AcceptedStatus, CallBody, MessageType, RejectedReply, ReplyBody, RpcMessage,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, net::TcpStream, time::Duration};

use oncrpc_error::{OncRpcError, Refusal};

type Result<T> = std::result::Result<T, OncRpcError>;

/// Transport named in a port mapper query. Only TCP is spoken here.
pub enum IpProtocol {
    Tcp,
}

impl From<IpProtocol> for u32 {
    fn from(p: IpProtocol) -> Self {
        match p {
            IpProtocol::Tcp => 6,
        }
    }
}

const HEAD_LEN: usize = 4;

fn parse_bytes(bytes: Bytes) -> Result<RpcMessage<Bytes, Bytes>> {
    match RpcMessage::try_from(bytes) {
        Ok(m) => Ok(m),
        Err(onc_rpc::Error::IncompleteHeader) | Err(onc_rpc::Error::IncompleteMessage { .. }) => {
            Err(OncRpcError::Other(
                "record marker announced more bytes than were received".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// A record-marked byte stream carrying ONC-RPC messages.
pub trait RpcStream {
    fn raw_write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
    fn raw_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    fn flush(&mut self) -> std::io::Result<()>;
    fn send<T, P>(&mut self, message: RpcMessage<T, P>) -> Result<()>
    where
        T: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        raw_write_all(self, &message.serialise()?)?;
        self.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: BytesMut) -> Result<RpcMessage<Bytes, Bytes>> {
        let mut buf_cursor = MyCursor::new(buf);
        buf_cursor.reserve(HEAD_LEN);
        let expected_len = loop {
            let num_read = self.raw_read(buf_cursor.as_mut())?;
            if num_read == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed while waiting for a reply",
                )
                .into());
            }
            buf_cursor.advance(num_read);
            match onc_rpc::expected_message_len(buf_cursor.as_ref()) {
                Ok(len) => break len as usize,
                Err(onc_rpc::Error::IncompleteHeader) => {
                    buf_cursor.reserve(HEAD_LEN);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
        };
        if expected_len > buf_cursor.filled {
            let current_len = buf_cursor.filled;
            buf_cursor.reserve(expected_len - current_len);

            // The buffer does not contain a full message, read more data
            raw_read_exact(self, &mut buf_cursor.as_mut()[..expected_len - current_len])?;
            buf_cursor.advance(expected_len - current_len);
        }
        let mut buf = buf_cursor.into_inner();
        let msg_bytes = buf.split_to(expected_len).freeze();
        parse_bytes(msg_bytes)
    }
    fn set_read_timeout<T: Into<Option<Duration>>>(&self, dur: T) -> Result<()>;
    fn set_write_timeout<T: Into<Option<Duration>>>(&self, dur: T) -> Result<()>;
}

fn raw_write_all<S: RpcStream + ?Sized>(s: &mut S, buf: &[u8]) -> Result<()> {
    let mut buf = buf;
    while !buf.is_empty() {
        match s.raw_write(buf) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                )
                .into());
            }
            Ok(n) => buf = &buf[n..],
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn raw_read_exact<S: RpcStream + ?Sized>(s: &mut S, mut buf: &mut [u8]) -> Result<()> {
    while !buf.is_empty() {
        match s.raw_read(buf) {
            Ok(0) => break,
            Ok(n) => {
                let tmp = buf;
                buf = &mut tmp[n..];
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    if !buf.is_empty() {
        Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "failed to fill whole buffer",
        )
        .into())
    } else {
        Ok(())
    }
}

struct MyCursor<T: AsRef<[u8]> + AsMut<[u8]>> {
    inner: T,
    filled: usize,
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> MyCursor<T> {
    fn new(inner: T) -> Self {
        Self { inner, filled: 0 }
    }
    fn advance(&mut self, step: usize) -> &mut Self {
        self.filled += step;
        self
    }
    fn into_inner(self) -> T {
        self.inner
    }
    fn capacity(&self) -> usize {
        self.inner.as_ref().len()
    }
}
impl MyCursor<BytesMut> {
    fn reserve(&mut self, additional: usize) {
        if self.filled + additional > self.capacity() {
            self.inner.resize(self.filled + additional, 0);
        }
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> AsRef<[u8]> for MyCursor<T> {
    fn as_ref(&self) -> &[u8] {
        debug_assert!(self.inner.as_ref().len() >= self.filled);
        &self.inner.as_ref()[..self.filled]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> AsMut<[u8]> for MyCursor<T> {
    fn as_mut(&mut self) -> &mut [u8] {
        debug_assert!(self.inner.as_ref().len() >= self.filled);
        &mut self.inner.as_mut()[self.filled..]
    }
}

pub trait RpcProgram {
    type IO;
    const PROGRAM: u32;
    const VERSION: u32;
    fn gen_xid(&mut self) -> u32 {
        rand::random()
    }
    fn get_io(&self) -> &Self::IO;
    fn mut_io(&mut self) -> &mut Self::IO;
    fn buffer(&self) -> BytesMut;
}

pub trait Rpc {
    fn call<P, T, C, R>(
        &mut self,
        procedure: P,
        auth_credentials: AuthFlavor<T>,
        auth_verifier: AuthFlavor<T>,
        content: C,
    ) -> Result<R>
    where
        P: Into<u32>,
        T: AsRef<[u8]>,
        C: Serialize,
        R: DeserializeOwned;
    fn call_anonymously<P, C, R>(&mut self, procedure: P, content: C) -> Result<R>
    where
        P: Into<u32>,
        C: Serialize,
        R: DeserializeOwned,
    {
        self.call::<P, &[u8], C, R>(
            procedure,
            AuthFlavor::AuthNone(None),
            AuthFlavor::AuthNone(None),
            content,
        )
    }
}

impl<S> Rpc for S
where
    S: RpcProgram,
    <S as RpcProgram>::IO: RpcStream,
{
    fn call<P, T, C, R>(
        &mut self,
        procedure: P,
        auth_credentials: AuthFlavor<T>,
        auth_verifier: AuthFlavor<T>,
        content: C,
    ) -> Result<R>
    where
        P: Into<u32>,
        T: AsRef<[u8]>,
        C: Serialize,
        R: DeserializeOwned,
    {
        let xid = self.gen_xid();
        let procedure: u32 = procedure.into();
        let content = xdr::to_bytes(&content)?;
        let call_body = CallBody::new(
            Self::PROGRAM,
            Self::VERSION,
            procedure,
            auth_credentials,
            auth_verifier,
            &content[..],
        );
        self.mut_io()
            .send(RpcMessage::new(xid, MessageType::Call(call_body)))?;
        let buf = self.buffer();
        let reply = self.mut_io().read(buf)?;
        if reply.xid() != xid {
            return Err(OncRpcError::XidMismatch {
                sent: xid,
                found: reply.xid(),
            });
        }
        let refusal = match reply
            .reply_body()
            .ok_or_else(|| OncRpcError::Other("expected reply, found call".to_string()))?
        {
            ReplyBody::Accepted(a) => match a.status() {
                AcceptedStatus::Success(p) => return Ok(xdr::from_bytes(p.as_ref())?),
                AcceptedStatus::ProgramUnavailable => Refusal::ProgramUnavailable,
                AcceptedStatus::ProgramMismatch { low, high } => Refusal::ProgramMismatch {
                    low: *low,
                    high: *high,
                },
                AcceptedStatus::ProcedureUnavailable => Refusal::ProcedureUnavailable,
                AcceptedStatus::GarbageArgs => Refusal::GarbageArgs,
                AcceptedStatus::SystemError => Refusal::SystemError,
            },
            ReplyBody::Denied(RejectedReply::RpcVersionMismatch { low, high }) => {
                Refusal::RpcMismatch {
                    low: *low,
                    high: *high,
                }
            }
            ReplyBody::Denied(RejectedReply::AuthError(e)) => {
                Refusal::AuthRejected(format!("{:?}", e))
            }
        };
        Err(OncRpcError::Refused { procedure, refusal })
    }
}

impl RpcStream for TcpStream {
    fn raw_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        <Self as std::io::Read>::read(self, buf)
    }
    fn raw_write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        <Self as std::io::Write>::write(self, buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        <Self as std::io::Write>::flush(self)
    }
    fn set_read_timeout<T: Into<Option<Duration>>>(&self, dur: T) -> Result<()> {
        Ok(TcpStream::set_read_timeout(self, dur.into())?)
    }
    fn set_write_timeout<T: Into<Option<Duration>>>(&self, dur: T) -> Result<()> {
        Ok(TcpStream::set_write_timeout(self, dur.into())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onc_rpc::{AcceptedReply, AuthError};
    use std::io::{Cursor, Read};

    struct Canned {
        sent: Vec<u8>,
        replies: Cursor<Vec<u8>>,
    }

    impl RpcStream for Canned {
        fn raw_write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn raw_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.replies.read(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn set_read_timeout<T: Into<Option<Duration>>>(&self, _: T) -> Result<()> {
            Ok(())
        }
        fn set_write_timeout<T: Into<Option<Duration>>>(&self, _: T) -> Result<()> {
            Ok(())
        }
    }

    struct Lookup {
        io: Canned,
        xid: u32,
    }

    impl RpcProgram for Lookup {
        type IO = Canned;
        const PROGRAM: u32 = 100000;
        const VERSION: u32 = 2;
        fn gen_xid(&mut self) -> u32 {
            self.xid
        }
        fn get_io(&self) -> &Self::IO {
            &self.io
        }
        fn mut_io(&mut self) -> &mut Self::IO {
            &mut self.io
        }
        fn buffer(&self) -> BytesMut {
            BytesMut::new()
        }
    }

    fn answering(xid: u32, body: ReplyBody<&[u8], &[u8]>) -> Lookup {
        let reply = RpcMessage::new(xid, MessageType::Reply(body))
            .serialise()
            .unwrap();
        Lookup {
            io: Canned {
                sent: Vec::new(),
                replies: Cursor::new(reply),
            },
            xid: 0x1234,
        }
    }

    fn accepted(status: AcceptedStatus<&[u8]>) -> ReplyBody<&[u8], &[u8]> {
        ReplyBody::Accepted(AcceptedReply::new(AuthFlavor::AuthNone(None), status))
    }

    #[test]
    fn success_decodes_the_results() {
        let results = xdr::to_bytes(&5025u32).unwrap();
        let mut program = answering(0x1234, accepted(AcceptedStatus::Success(&results[..])));
        let port: u32 = program.call_anonymously(3u32, 7u32).unwrap();
        assert_eq!(port, 5025);

        let call = RpcMessage::try_from(&program.io.sent[..]).unwrap();
        assert_eq!(call.xid(), 0x1234);
        let body = call.call_body().unwrap();
        assert_eq!(body.program(), 100000);
        assert_eq!(body.procedure(), 3);
        assert_eq!(&body.payload()[..], &7u32.to_be_bytes());
    }

    #[test]
    fn unaccepted_status_names_the_procedure() {
        let mut program = answering(
            0x1234,
            accepted(AcceptedStatus::ProgramMismatch { low: 3, high: 4 }),
        );
        match program.call_anonymously::<u32, u32, u32>(3, 0) {
            Err(OncRpcError::Refused { procedure, refusal }) => {
                assert_eq!(procedure, 3);
                assert_eq!(refusal, Refusal::ProgramMismatch { low: 3, high: 4 });
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn denied_reply_is_refused() {
        let mut program = answering(
            0x1234,
            ReplyBody::Denied(RejectedReply::AuthError(AuthError::BadCredentials)),
        );
        let err = program.call_anonymously::<u32, u32, u32>(3, 0).unwrap_err();
        assert!(matches!(
            err,
            OncRpcError::Refused {
                refusal: Refusal::AuthRejected(_),
                ..
            }
        ));
        assert!(!err.is_timeout());
    }

    #[test]
    fn stray_xid_is_rejected() {
        let results = xdr::to_bytes(&0u32).unwrap();
        let mut program = answering(0x9999, accepted(AcceptedStatus::Success(&results[..])));
        assert!(matches!(
            program.call_anonymously::<u32, u32, u32>(3, 0),
            Err(OncRpcError::XidMismatch {
                sent: 0x1234,
                found: 0x9999
            })
        ));
    }

    #[test]
    fn closed_stream_is_an_io_error() {
        let mut program = Lookup {
            io: Canned {
                sent: Vec::new(),
                replies: Cursor::new(Vec::new()),
            },
            xid: 1,
        };
        assert!(matches!(
            program.call_anonymously::<u32, u32, u32>(3, 0),
            Err(OncRpcError::IOError(_))
        ));
    }
}
