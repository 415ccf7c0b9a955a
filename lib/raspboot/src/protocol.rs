//! Bytes exchanged with the host.
//!
//! ```text
//! loader -> host   03 03 03          send me a kernel
//! host -> loader   u32 LE            compressed size
//! loader -> host   "SE" | "OK"       rejected (start over) | accepted
//! host -> loader   size bytes        zlib stream
//! ```

/// Break sequence asking the host to start a transfer.
pub const REQUEST: [u8; 3] = [0x03, 0x03, 0x03];

/// Number of bytes in the size announcement.
pub const SIZE_LEN: usize = 4;

/// The loader's answer to a size announcement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Accepted,
    Rejected,
}

impl Reply {
    pub fn as_bytes(self) -> &'static [u8; 2] {
        match self {
            Reply::Accepted => b"OK",
            Reply::Rejected => b"SE",
        }
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Option<Reply> {
        match &bytes {
            b"OK" => Some(Reply::Accepted),
            b"SE" => Some(Reply::Rejected),
            _ => None,
        }
    }
}

pub fn decode_size(bytes: [u8; SIZE_LEN]) -> u32 {
    u32::from_le_bytes(bytes)
}

pub fn encode_size(size: u32) -> [u8; SIZE_LEN] {
    size.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_little_endian() {
        assert_eq!(decode_size([0x10, 0x00, 0x00, 0x00]), 16);
        assert_eq!(decode_size([0x01, 0x00, 0x20, 0x00]), 0x20_0001);
        assert_eq!(encode_size(0xdead_beef), [0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn replies() {
        assert_eq!(Reply::from_bytes(*b"OK"), Some(Reply::Accepted));
        assert_eq!(Reply::from_bytes(*b"SE"), Some(Reply::Rejected));
        assert_eq!(Reply::from_bytes(*b"ok"), None);
        assert_eq!(Reply::Rejected.as_bytes(), b"SE");
    }
}
