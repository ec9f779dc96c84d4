//! The binary object file format: a fixed header followed by a code region.

use std::fmt;

pub const MAGIC: u32 = 0x706F_636F; // "poco", little-endian on disk
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 24;
pub const MEMORY_SIZE: usize = 640_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub entry_point: u64,
    pub code_size: u64,
}

impl Header {
    pub fn new(entry_point: u64, code_size: u64) -> Self {
        Header {
            magic: MAGIC,
            version: VERSION,
            entry_point,
            code_size,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..16].copy_from_slice(&self.entry_point.to_le_bytes());
        buf[16..24].copy_from_slice(&self.code_size.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Header, DecodeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated);
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let entry_point = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let code_size = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        Ok(Header { magic, version, entry_point, code_size })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    Truncated,
    BadMagic(u32),
    UnsupportedVersion(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "object file is too short to contain a header"),
            DecodeError::BadMagic(got) => write!(f, "bad magic number: 0x{got:08x}"),
            DecodeError::UnsupportedVersion(got) => write!(f, "unsupported object version: {got}"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = Header::new(24, 16);
        let bytes = header.encode();
        let decoded = Header::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Header::new(24, 16).encode();
        bytes[0] = 0;
        assert_eq!(Header::decode(&bytes), Err(DecodeError::BadMagic(0x706F_6300)));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = [0u8; 10];
        assert_eq!(Header::decode(&bytes), Err(DecodeError::Truncated));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = Header::new(24, 16).encode();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(Header::decode(&bytes), Err(DecodeError::UnsupportedVersion(99)));
    }
}
