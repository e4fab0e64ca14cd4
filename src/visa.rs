//! VISA resource strings.
//!
//! Only the resource classes a LAN or serial oscilloscope answers on are
//! understood:
//!
//! - `TCPIP[board]::<host>[::<lan device name>]::INSTR` (VXI-11)
//! - `TCPIP[board]::<host>[::<port>]::SOCKET` (raw SCPI socket, port 5025
//!   when omitted)
//! - `ASRL<board>::INSTR` (serial port)
//!
//! See <https://zone.ni.com/reference/en-XX/help/370131S-01/ni-visa/visaresourcesyntaxandexamples/>.

use std::{
    fmt,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
    str::FromStr,
};

use crate::error::Error;
use crate::protocols::{onc_rpc::vxi11::DEFAULT_DEVICE_NAME, tcp::SCPI_RAW_PORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Instr {
        board: u8,
        host: String,
        device: String,
    },
    Socket {
        board: u8,
        host: String,
        port: u16,
    },
    Serial {
        board: u8,
    },
}

fn invalid<S: AsRef<str>>(resource: S, why: &str) -> Error {
    Error::InvalidResource(format!("'{}': {}", resource.as_ref(), why))
}

fn board_number(resource: &str, digits: &str) -> Result<u8, Error> {
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| invalid(resource, "board number is not a small integer"))
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split("::").collect();
        let interface = parts[0].to_ascii_uppercase();
        let class = parts
            .last()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_default();

        if let Some(board) = interface.strip_prefix("TCPIP") {
            let board = board_number(s, board)?;
            match (class.as_str(), parts.len()) {
                ("INSTR", 3) => Ok(Resource::Instr {
                    board,
                    host: parts[1].to_string(),
                    device: DEFAULT_DEVICE_NAME.to_string(),
                }),
                ("INSTR", 4) => Ok(Resource::Instr {
                    board,
                    host: parts[1].to_string(),
                    device: parts[2].to_string(),
                }),
                ("SOCKET", 3) => Ok(Resource::Socket {
                    board,
                    host: parts[1].to_string(),
                    port: SCPI_RAW_PORT,
                }),
                ("SOCKET", 4) => Ok(Resource::Socket {
                    board,
                    host: parts[1].to_string(),
                    port: parts[2]
                        .parse()
                        .map_err(|_| invalid(s, "socket port is not a number"))?,
                }),
                _ => Err(invalid(s, "expected TCPIP::<host>[::<device>]::INSTR or TCPIP::<host>[::<port>]::SOCKET")),
            }
        } else if let Some(board) = interface.strip_prefix("ASRL") {
            if parts.len() != 2 || class != "INSTR" {
                return Err(invalid(s, "expected ASRL<board>::INSTR"));
            }
            Ok(Resource::Serial {
                board: board_number(s, board)?,
            })
        } else {
            Err(invalid(s, "unsupported interface type"))
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Instr {
                board,
                host,
                device,
            } if device == DEFAULT_DEVICE_NAME => write!(f, "TCPIP{}::{}::INSTR", board, host),
            Resource::Instr {
                board,
                host,
                device,
            } => write!(f, "TCPIP{}::{}::{}::INSTR", board, host, device),
            Resource::Socket { board, host, port } => {
                write!(f, "TCPIP{}::{}::{}::SOCKET", board, host, port)
            }
            Resource::Serial { board } => write!(f, "ASRL{}::INSTR", board),
        }
    }
}

/// Resolves a host name of a LAN resource.
pub(crate) fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    let mut candidates = (host, port)
        .to_socket_addrs()
        .map_err(|e| invalid(host, &format!("cannot resolve host: {}", e)))?;
    candidates
        .next()
        .ok_or_else(|| invalid(host, "host resolves to no address"))
}

pub(crate) fn resolve_ip(host: &str) -> Result<IpAddr, Error> {
    Ok(resolve(host, 0)?.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vxi11_resource_defaults_to_inst0() {
        let r: Resource = "TCPIP0::172.16.2.13::INSTR".parse().unwrap();
        assert_eq!(
            r,
            Resource::Instr {
                board: 0,
                host: "172.16.2.13".to_string(),
                device: "inst0".to_string(),
            }
        );
        assert_eq!(r.to_string(), "TCPIP0::172.16.2.13::INSTR");
    }

    #[test]
    fn socket_and_named_device_resources() {
        let r: Resource = "tcpip::scope.lab::5025::socket".parse().unwrap();
        assert_eq!(
            r,
            Resource::Socket {
                board: 0,
                host: "scope.lab".to_string(),
                port: 5025,
            }
        );
        let r: Resource = "TCPIP0::scope.lab::SOCKET".parse().unwrap();
        assert_eq!(r.to_string(), "TCPIP0::scope.lab::5025::SOCKET");
        let r: Resource = "TCPIP1::10.0.0.2::inst1::INSTR".parse().unwrap();
        assert_eq!(r.to_string(), "TCPIP1::10.0.0.2::inst1::INSTR");
    }

    #[test]
    fn serial_resource() {
        let r: Resource = "ASRL3::INSTR".parse().unwrap();
        assert_eq!(r, Resource::Serial { board: 3 });
    }

    #[test]
    fn unsupported_resources_are_rejected() {
        for bad in [
            "USB0::0x0957::0x17A6::MY123::INSTR",
            "TCPIP0::10.0.0.2::notaport::SOCKET",
            "TCPIP0::INSTR",
            "ASRL1::SOCKET",
            "",
        ] {
            assert!(
                matches!(bad.parse::<Resource>(), Err(Error::InvalidResource(_))),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn localhost_resolves() {
        assert!(resolve_ip("127.0.0.1").unwrap().is_loopback());
    }
}
