use crate::error::{Error, Result};
use crate::struct_codec::Codec;

/// Index of each well-known slot in the 16-entry data directory array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirectorySlot {
    Export = 0,
    Import = 1,
    Resource = 2,
    Exception = 3,
    Certificate = 4,
    BaseReloc = 5,
    Debug = 6,
    Architecture = 7,
    GlobalPtr = 8,
    Tls = 9,
    LoadConfig = 10,
    BoundImport = 11,
    Iat = 12,
    DelayImport = 13,
    ClrRuntimeHeader = 14,
    Reserved = 15,
}

/// One `(VirtualAddress, Size)` pair in the optional header's data directory array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0
    }
}

impl Codec for DataDirectory {
    const SIZE: usize = 8;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedHeader {
                record: "IMAGE_DATA_DIRECTORY",
                offset: 0,
            });
        }
        Ok(Self {
            virtual_address: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.virtual_address.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out
    }
}
