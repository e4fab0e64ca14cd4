use super::{xdr, IpProtocol, Result, Rpc, RpcProgram, RpcStream};
use bytes::BytesMut;
use std::{
    net::{IpAddr, SocketAddr, TcpStream},
    time::Duration,
};

pub const PORT: u16 = 111;

pub struct PortMapper<S> {
    io: S,
    buffer: BytesMut,
}

impl<S> RpcProgram for PortMapper<S> {
    type IO = S;
    const PROGRAM: u32 = 100000;
    const VERSION: u32 = 2;
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

impl<S> PortMapper<S> {
    pub fn new(io: S) -> Self {
        Self {
            io,
            buffer: BytesMut::new(),
        }
    }
}

impl PortMapper<TcpStream> {
    pub fn new_tcp<A: Into<IpAddr>>(addr: A, time_out: Duration) -> Result<PortMapper<TcpStream>> {
        let io = TcpStream::connect_timeout(&SocketAddr::new(addr.into(), PORT), time_out)?;
        RpcStream::set_read_timeout(&io, time_out)?;
        RpcStream::set_write_timeout(&io, time_out)?;
        Ok(Self::new(io))
    }
}

impl<S: RpcStream> PortMapper<S> {
    /// Asks the port mapper on which port `program`/`version` listens.
    /// A returned port of 0 means the program is not registered.
    pub fn get_port(&mut self, program: u32, version: u32, protocol: IpProtocol) -> Result<u16> {
        let port: u32 = self.call_anonymously(
            Procedure::GetPort,
            xdr::Mapping {
                prog: program,
                vers: version,
                prot: protocol.into(),
                port: 0,
            },
        )?;
        Ok(port as u16)
    }
}

pub enum Procedure {
    GetPort,
}

impl From<Procedure> for u32 {
    fn from(p: Procedure) -> Self {
        match p {
            Procedure::GetPort => 3,
        }
    }
}
