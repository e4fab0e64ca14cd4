pub mod onc_rpc;
pub mod protocol_error;
pub mod serial;
pub mod tcp;

use std::time::Duration;

pub use self::onc_rpc::vxi11::Vxi11;
pub use self::serial::Serial;
pub use self::tcp::Tcp;

/// A way of reaching an instrument. `connect` opens the link and applies
/// `time_out` to both the connection attempt and subsequent I/O.
pub trait Protocol {
    type Address;
    type Error;
    type IO;
    fn connect(self, address: Self::Address, time_out: Duration)
        -> Result<Self::IO, Self::Error>;
}

/// VXI-11 core channel to a named LAN device, `inst0` unless the resource names another.
#[derive(Clone, Debug)]
pub struct Instr {
    pub device: String,
}

impl Default for Instr {
    fn default() -> Self {
        Self {
            device: onc_rpc::vxi11::DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

impl Protocol for Instr {
    type Address = std::net::IpAddr;
    type Error = onc_rpc::vxi11::vxi11_error::Vxi11Error;
    type IO = Vxi11;
    fn connect(self, address: Self::Address, time_out: Duration) -> Result<Self::IO, Self::Error> {
        Vxi11::open(address, &self.device, time_out)
    }
}
