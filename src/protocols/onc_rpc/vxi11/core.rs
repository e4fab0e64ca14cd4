use super::{vxi11_error::Vxi11Error, DeviceFlags};
use crate::protocols::onc_rpc::{xdr, Rpc, RpcProgram, RpcStream};
use bytes::{Bytes, BytesMut};
use serde_bytes::ByteBuf;
use std::{
    net::{SocketAddr, TcpStream},
    time::Duration,
};

type Result<T> = std::result::Result<T, Vxi11Error>;

pub enum Procedure {
    ///opens a link to a device
    CreateLink,
    ///device receives a message
    DeviceWrite,
    ///device returns a result
    DeviceRead,
    ///device returns its status byte
    DeviceReadStb,
    ///device clears itself
    DeviceClear,
    ///device disables its front panel
    DeviceRemote,
    ///device enables its front panel
    DeviceLocal,
    ///closes a link to a device
    DestroyLink,
}

impl From<Procedure> for u32 {
    fn from(p: Procedure) -> Self {
        use Procedure::*;
        match p {
            CreateLink => 10,
            DeviceWrite => 11,
            DeviceRead => 12,
            DeviceReadStb => 13,
            DeviceClear => 15,
            DeviceRemote => 16,
            DeviceLocal => 17,
            DestroyLink => 23,
        }
    }
}
use Procedure::*;

/// Link parameters returned by `create_link`.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub link_id: i32,
    pub abort_port: u16,
    pub max_recv_size: u32,
}

pub struct Core<S> {
    io: S,
    buffer: BytesMut,
}

impl<S> RpcProgram for Core<S> {
    type IO = S;
    const PROGRAM: u32 = 0x0607AF;
    const VERSION: u32 = super::VERSION;
    fn get_io(&self) -> &Self::IO {
        &self.io
    }
    fn mut_io(&mut self) -> &mut Self::IO {
        &mut self.io
    }
    fn buffer(&self) -> BytesMut {
        self.buffer.clone()
    }
}

impl<S> Core<S> {
    pub fn new(io: S) -> Self {
        Self {
            io,
            buffer: BytesMut::new(),
        }
    }
}

impl Core<TcpStream> {
    pub fn new_tcp(addr: SocketAddr, time_out: Duration) -> Result<Self> {
        let io = TcpStream::connect_timeout(&addr, time_out)?;
        Ok(Self::new(io))
    }
}

impl<S: RpcStream> Core<S> {
    pub fn set_rpc_timeout(&self, dur: Duration) -> Result<()> {
        self.io.set_read_timeout(dur)?;
        self.io.set_write_timeout(dur)?;
        Ok(())
    }

    pub fn create_link(
        &mut self,
        client_id: i32,
        lock: bool,
        lock_timeout: u32,
        device: String,
    ) -> Result<Link> {
        let resp: xdr::CreateLinkResp = self.call_anonymously(
            CreateLink,
            xdr::CreateLinkParms {
                client_id,
                lock_device: lock,
                lock_timeout,
                device,
            },
        )?;
        Vxi11Error::check(resp.error)?;
        Ok(Link {
            link_id: resp.lid,
            abort_port: resp.abort_port as u16,
            max_recv_size: resp.max_recv_size,
        })
    }

    pub fn destroy_link(&mut self, link_id: i32) -> Result<()> {
        let resp: xdr::DeviceError = self.call_anonymously(DestroyLink, link_id)?;
        Vxi11Error::check(resp.error)
    }

    pub fn device_write(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
        data: &[u8],
    ) -> Result<usize> {
        let resp: xdr::DeviceWriteResp = self.call_anonymously(
            DeviceWrite,
            xdr::DeviceWriteParms {
                lid: link_id,
                io_timeout,
                lock_timeout,
                flags: flags.into(),
                data: ByteBuf::from(data),
            },
        )?;
        Vxi11Error::check(resp.error)?;
        Ok(resp.size as usize)
    }

    /// Returns the data chunk together with the raw `reason` bits.
    pub fn device_read(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
        req_size: u32,
        term: u8,
    ) -> Result<(Bytes, ReadReason)> {
        let resp: xdr::DeviceReadResp = self.call_anonymously(
            DeviceRead,
            xdr::DeviceReadParms {
                lid: link_id,
                request_size: req_size,
                io_timeout,
                lock_timeout,
                flags: flags.into(),
                term_char: term as u32,
            },
        )?;
        Vxi11Error::check(resp.error)?;
        Ok((
            Bytes::from(resp.data.into_vec()),
            ReadReason(resp.reason),
        ))
    }

    pub fn device_read_stb(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
    ) -> Result<u8> {
        let resp: xdr::DeviceReadStbResp = self.call_anonymously(
            DeviceReadStb,
            generic(link_id, flags, lock_timeout, io_timeout),
        )?;
        Vxi11Error::check(resp.error)?;
        Ok(resp.stb as u8)
    }

    pub fn device_clear(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
    ) -> Result<()> {
        let resp: xdr::DeviceError = self.call_anonymously(
            DeviceClear,
            generic(link_id, flags, lock_timeout, io_timeout),
        )?;
        Vxi11Error::check(resp.error)
    }

    pub fn device_remote(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
    ) -> Result<()> {
        let resp: xdr::DeviceError = self.call_anonymously(
            DeviceRemote,
            generic(link_id, flags, lock_timeout, io_timeout),
        )?;
        Vxi11Error::check(resp.error)
    }

    pub fn device_local(
        &mut self,
        link_id: i32,
        flags: DeviceFlags,
        lock_timeout: u32,
        io_timeout: u32,
    ) -> Result<()> {
        let resp: xdr::DeviceError = self.call_anonymously(
            DeviceLocal,
            generic(link_id, flags, lock_timeout, io_timeout),
        )?;
        Vxi11Error::check(resp.error)
    }
}

fn generic(
    link_id: i32,
    flags: DeviceFlags,
    lock_timeout: u32,
    io_timeout: u32,
) -> xdr::DeviceGenericParms {
    xdr::DeviceGenericParms {
        lid: link_id,
        flags: flags.into(),
        lock_timeout,
        io_timeout,
    }
}

/// `reason` bits of a `device_read` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadReason(i32);

impl ReadReason {
    pub fn request_count(&self) -> bool {
        self.0 & (1 << 0) != 0
    }
    pub fn term_char(&self) -> bool {
        self.0 & (1 << 1) != 0
    }
    pub fn end(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    /// The device has no more data for this message.
    pub fn is_complete(&self) -> bool {
        self.end() || self.term_char()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_reason_bits() {
        assert!(ReadReason(4).is_complete());
        assert!(ReadReason(2).is_complete());
        let partial = ReadReason(1);
        assert!(partial.request_count());
        assert!(!partial.is_complete());
    }

    #[test]
    fn procedure_numbers() {
        assert_eq!(u32::from(CreateLink), 10);
        assert_eq!(u32::from(DeviceRead), 12);
        assert_eq!(u32::from(DestroyLink), 23);
    }
}
