use super::Protocol;
use std::{
    io::Error,
    net::{SocketAddr, TcpStream},
};

/// Raw SCPI socket, newline terminated (Keysight scopes listen on 5025).
pub struct Tcp;

pub const SCPI_RAW_PORT: u16 = 5025;

impl Default for Tcp {
    fn default() -> Self {
        Tcp
    }
}

impl Protocol for Tcp {
    type IO = TcpStream;
    type Address = SocketAddr;
    type Error = Error;
    fn connect(
        self,
        address: Self::Address,
        time_out: std::time::Duration,
    ) -> Result<Self::IO, Self::Error> {
        let stream = TcpStream::connect_timeout(&address, time_out)?;
        stream.set_read_timeout(Some(time_out))?;
        stream.set_write_timeout(Some(time_out))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
