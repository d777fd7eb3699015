use crate::error::{Error, Result};
use crate::struct_codec::{Codec, UnionCell};

/// `IMAGE_SECTION_HEADER`. `misc` models the union between `VirtualSize` (image
/// files) and `PhysicalAddress` (object files) as a single shared storage cell with
/// two names, per the specification's union handling.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    pub name_raw: [u8; 8],
    pub misc: UnionCell<u32>,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_linenumbers: u32,
    pub number_of_relocations: u16,
    pub number_of_linenumbers: u16,
    pub characteristics: u32,
}

impl SectionHeader {
    /// The section name with trailing NUL padding trimmed, decoded losslessly as
    /// UTF-8 when possible (object-file `/nnnn` string-table-offset names are left
    /// untouched: resolving them requires the COFF string table, out of scope here).
    pub fn name(&self) -> String {
        let end = self
            .name_raw
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name_raw.len());
        String::from_utf8_lossy(&self.name_raw[..end]).into_owned()
    }

    pub fn virtual_size(&self) -> u32 {
        self.misc.get("VirtualSize")
    }

    pub fn physical_address(&self) -> u32 {
        self.misc.get("PhysicalAddress")
    }
}

impl Codec for SectionHeader {
    const SIZE: usize = 40;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedHeader {
                record: "IMAGE_SECTION_HEADER",
                offset: 0,
            });
        }
        let mut name_raw = [0u8; 8];
        name_raw.copy_from_slice(&bytes[0..8]);
        let misc_value = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        Ok(Self {
            name_raw,
            misc: UnionCell::new(&["VirtualSize", "PhysicalAddress"], misc_value),
            virtual_address: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            size_of_raw_data: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            pointer_to_raw_data: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
            pointer_to_relocations: u32::from_le_bytes([
                bytes[24], bytes[25], bytes[26], bytes[27],
            ]),
            pointer_to_linenumbers: u32::from_le_bytes([
                bytes[28], bytes[29], bytes[30], bytes[31],
            ]),
            number_of_relocations: u16::from_le_bytes([bytes[32], bytes[33]]),
            number_of_linenumbers: u16::from_le_bytes([bytes[34], bytes[35]]),
            characteristics: u32::from_le_bytes([bytes[36], bytes[37], bytes[38], bytes[39]]),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.name_raw);
        out.extend_from_slice(&self.misc.resolve().to_le_bytes());
        out.extend_from_slice(&self.virtual_address.to_le_bytes());
        out.extend_from_slice(&self.size_of_raw_data.to_le_bytes());
        out.extend_from_slice(&self.pointer_to_raw_data.to_le_bytes());
        out.extend_from_slice(&self.pointer_to_relocations.to_le_bytes());
        out.extend_from_slice(&self.pointer_to_linenumbers.to_le_bytes());
        out.extend_from_slice(&self.number_of_relocations.to_le_bytes());
        out.extend_from_slice(&self.number_of_linenumbers.to_le_bytes());
        out.extend_from_slice(&self.characteristics.to_le_bytes());
        out
    }
}
