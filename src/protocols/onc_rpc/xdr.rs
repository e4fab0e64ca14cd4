//! XDR payloads of the VXI-11 core channel and the port mapper.
//!
//! Field order follows the RPCL definitions of the VXI-11 specification;
//! serde-xdr encodes struct fields in declaration order.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_bytes::ByteBuf;

pub type SerializationError = serde_xdr::CompatSerializationError;
pub type Error = serde_xdr::CompatDeserializationError;

pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    serde_xdr::to_bytes(value)
}

pub fn from_bytes<T: DeserializeOwned>(mut bytes: &[u8]) -> Result<T, Error> {
    serde_xdr::from_reader(&mut bytes)
}

pub type DeviceLink = i32;
pub type DeviceErrorCode = i32;

#[derive(Debug, Serialize)]
pub struct CreateLinkParms {
    pub client_id: i32,
    pub lock_device: bool,
    pub lock_timeout: u32,
    pub device: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkResp {
    pub error: DeviceErrorCode,
    pub lid: DeviceLink,
    pub abort_port: u32,
    pub max_recv_size: u32,
}

#[derive(Debug, Serialize)]
pub struct DeviceWriteParms {
    pub lid: DeviceLink,
    pub io_timeout: u32,
    pub lock_timeout: u32,
    pub flags: i32,
    pub data: ByteBuf,
}

#[derive(Debug, Deserialize)]
pub struct DeviceWriteResp {
    pub error: DeviceErrorCode,
    pub size: u32,
}

#[derive(Debug, Serialize)]
pub struct DeviceReadParms {
    pub lid: DeviceLink,
    pub request_size: u32,
    pub io_timeout: u32,
    pub lock_timeout: u32,
    pub flags: i32,
    pub term_char: u32,
}

#[derive(Debug, Deserialize)]
pub struct DeviceReadResp {
    pub error: DeviceErrorCode,
    pub reason: i32,
    pub data: ByteBuf,
}

#[derive(Debug, Deserialize)]
pub struct DeviceReadStbResp {
    pub error: DeviceErrorCode,
    pub stb: u32,
}

#[derive(Debug, Serialize)]
pub struct DeviceGenericParms {
    pub lid: DeviceLink,
    pub flags: i32,
    pub lock_timeout: u32,
    pub io_timeout: u32,
}

#[derive(Debug, Deserialize)]
pub struct DeviceError {
    pub error: DeviceErrorCode,
}

/// Port mapper `mapping` argument of `PMAPPROC_GETPORT`.
#[derive(Debug, Serialize)]
pub struct Mapping {
    pub prog: u32,
    pub vers: u32,
    pub prot: u32,
    pub port: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_parms_pad_opaque_data() {
        let parms = DeviceWriteParms {
            lid: 1,
            io_timeout: 2,
            lock_timeout: 3,
            flags: 8,
            data: ByteBuf::from(b"*IDN?".to_vec()),
        };
        let bytes = to_bytes(&parms).unwrap();
        // four words, a length word, five data bytes padded to eight
        assert_eq!(bytes.len(), 4 * 4 + 4 + 8);
        assert_eq!(&bytes[16..20], &5u32.to_be_bytes());
        assert_eq!(&bytes[20..25], b"*IDN?");
    }

    #[test]
    fn read_resp_decodes_reason_and_data() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0i32.to_be_bytes());
        raw.extend_from_slice(&4i32.to_be_bytes());
        raw.extend_from_slice(&3u32.to_be_bytes());
        raw.extend_from_slice(b"1.0\0");
        let resp: DeviceReadResp = from_bytes(&raw).unwrap();
        assert_eq!(resp.error, 0);
        assert_eq!(resp.reason, 4);
        assert_eq!(resp.data.as_ref(), b"1.0");
    }
}
