use crate::error::{Error, Result};
use crate::struct_codec::Codec;

/// Required signature of a valid MS-DOS / PE header: the ASCII bytes `MZ`.
pub const IMAGE_DOS_SIGNATURE: u16 = 0x5A4D;

/// The classic `IMAGE_DOS_HEADER`. Only `e_magic` and `e_lfanew` are consumed by the
/// rest of the parser; the remaining 15 reserved/legacy fields are carried through
/// unexamined as opaque bytes so a round trip reproduces them exactly.
#[derive(Debug, Clone)]
pub struct DosHeader {
    raw: [u8; Self::SIZE],
    pub e_magic: u16,
    pub e_lfanew: u32,
}

impl DosHeader {
    const E_LFANEW_OFFSET: usize = 0x3C;
}

impl Codec for DosHeader {
    const SIZE: usize = 64;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedHeader {
                record: "DOS_HEADER",
                offset: 0,
            });
        }
        let mut raw = [0u8; Self::SIZE];
        raw.copy_from_slice(&bytes[..Self::SIZE]);
        let e_magic = u16::from_le_bytes([raw[0], raw[1]]);
        let e_lfanew = u32::from_le_bytes([
            raw[Self::E_LFANEW_OFFSET],
            raw[Self::E_LFANEW_OFFSET + 1],
            raw[Self::E_LFANEW_OFFSET + 2],
            raw[Self::E_LFANEW_OFFSET + 3],
        ]);
        Ok(Self {
            raw,
            e_magic,
            e_lfanew,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = self.raw.to_vec();
        out[0..2].copy_from_slice(&self.e_magic.to_le_bytes());
        out[Self::E_LFANEW_OFFSET..Self::E_LFANEW_OFFSET + 4]
            .copy_from_slice(&self.e_lfanew.to_le_bytes());
        out
    }
}
