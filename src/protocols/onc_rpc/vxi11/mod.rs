use std::{
    net::{IpAddr, SocketAddr, TcpStream},
    time::Duration,
};

use bytes::{Bytes, BytesMut};
use log::{debug, info};

use self::{core::Core, vxi11_error::Vxi11Error};
use super::{port_mapper::PortMapper, IpProtocol};

pub mod core;
pub mod vxi11_error;

const VERSION: u32 = 1;
const CORE_PROGRAM: u32 = 0x0607AF;

type Result<T> = std::result::Result<T, Vxi11Error>;

#[derive(Debug, Clone, Copy)]
pub struct DeviceFlags(i32);
impl DeviceFlags {
    pub fn new_zero() -> Self {
        Self(0)
    }
    pub fn end(mut self) -> Self {
        self.0 |= 1 << 3;
        self
    }
}
impl From<DeviceFlags> for i32 {
    fn from(d: DeviceFlags) -> Self {
        d.0
    }
}

const REQ_SIZE: u32 = 0x10000;
//https://zone.ni.com/reference/en-XX/help/370131S-01/ni-visa/visaresourcesyntaxandexamples/
pub const DEFAULT_DEVICE_NAME: &str = "inst0";

/// An open VXI-11 link, what a VISA `TCPIP::<host>::INSTR` resource talks to.
pub struct Vxi11 {
    link_id: i32,
    lock_timeout: Duration,
    io_timeout: Duration,
    max_recv_size: u32,
    core: Core<TcpStream>,
}

impl Vxi11 {
    pub fn open(host: IpAddr, device: &str, io_timeout: Duration) -> Result<Self> {
        let port = PortMapper::new_tcp(host, io_timeout)?.get_port(
            CORE_PROGRAM,
            VERSION,
            IpProtocol::Tcp,
        )?;
        if port == 0 {
            return Err(Vxi11Error::NotRegistered);
        }
        debug!("vxi11 core channel of {} on port {}", host, port);
        let core = Core::new_tcp(SocketAddr::new(host, port), io_timeout)?;
        let client_id = std::process::id() as i32 & i32::MAX;
        Self::with_core(core, client_id, device, io_timeout)
    }

    fn with_core(
        mut core: Core<TcpStream>,
        client_id: i32,
        device: &str,
        io_timeout: Duration,
    ) -> Result<Self> {
        // the rpc layer must outlive the device's own io timeout
        core.set_rpc_timeout(io_timeout + Duration::from_secs(1))?;
        let lock_timeout = Duration::from_millis(0);
        let link = core.create_link(
            client_id,
            false,
            lock_timeout.as_millis() as u32,
            device.to_string(),
        )?;
        info!(
            "vxi11 link {} to '{}' established, max receive size {}",
            link.link_id, device, link.max_recv_size
        );
        Ok(Self {
            link_id: link.link_id,
            lock_timeout,
            io_timeout,
            max_recv_size: link.max_recv_size.max(1),
            core,
        })
    }

    fn timeouts(&self) -> (u32, u32) {
        (
            self.lock_timeout.as_millis() as u32,
            self.io_timeout.as_millis() as u32,
        )
    }

    /// Writes one message, split at the device's maximum receive size.
    /// Whatever the device does not accept is sent again. The END flag
    /// goes with the piece that completes the message.
    pub fn device_write(&mut self, message: &[u8]) -> Result<usize> {
        let (lock_timeout, io_timeout) = self.timeouts();
        let chunk_size = self.max_recv_size as usize;
        let mut rest = message;
        while !rest.is_empty() {
            let piece = &rest[..rest.len().min(chunk_size)];
            let flags = if piece.len() == rest.len() {
                DeviceFlags::new_zero().end()
            } else {
                DeviceFlags::new_zero()
            };
            let accepted =
                self.core
                    .device_write(self.link_id, flags, lock_timeout, io_timeout, piece)?;
            if accepted == 0 {
                return Err(Vxi11Error::WriteStalled(piece.len()));
            }
            if accepted < piece.len() {
                debug!("device took {} of {} bytes", accepted, piece.len());
            }
            rest = &rest[accepted.min(piece.len())..];
        }
        Ok(message.len())
    }

    /// Reads one complete message, following `request_count` partial reads.
    pub fn device_read(&mut self) -> Result<Bytes> {
        let (lock_timeout, io_timeout) = self.timeouts();
        let mut message = BytesMut::new();
        loop {
            let (data, reason) = self.core.device_read(
                self.link_id,
                DeviceFlags::new_zero(),
                lock_timeout,
                io_timeout,
                REQ_SIZE,
                0,
            )?;
            message.extend_from_slice(&data);
            if reason.is_complete() {
                break;
            }
        }
        Ok(message.freeze())
    }

    pub fn device_read_stb(&mut self) -> Result<u8> {
        let (lock_timeout, io_timeout) = self.timeouts();
        self.core.device_read_stb(
            self.link_id,
            DeviceFlags::new_zero(),
            lock_timeout,
            io_timeout,
        )
    }

    pub fn device_clear(&mut self) -> Result<()> {
        let (lock_timeout, io_timeout) = self.timeouts();
        self.core
            .device_clear(self.link_id, DeviceFlags::new_zero(), lock_timeout, io_timeout)
    }

    pub fn device_remote(&mut self) -> Result<()> {
        let (lock_timeout, io_timeout) = self.timeouts();
        self.core
            .device_remote(self.link_id, DeviceFlags::new_zero(), lock_timeout, io_timeout)
    }

    pub fn device_local(&mut self) -> Result<()> {
        let (lock_timeout, io_timeout) = self.timeouts();
        self.core
            .device_local(self.link_id, DeviceFlags::new_zero(), lock_timeout, io_timeout)
    }

    pub fn close(mut self) -> Result<()> {
        info!("destroying vxi11 link {}", self.link_id);
        self.core.destroy_link(self.link_id)
    }
}
