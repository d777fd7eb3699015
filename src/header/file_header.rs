use crate::error::{Error, Result};
use crate::header::characteristics::Characteristics;
use crate::header::machine_types::Machine;
use crate::struct_codec::Codec;
use chrono::{DateTime, Utc};

/// COFF File Header structure.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Identifies the type of target machine. See [`Machine`].
    pub machine: Machine,
    pub machine_raw: u16,
    /// Indicates the size of the section table, which immediately follows the headers.
    pub number_of_sections: u16,
    /// Seconds since the Unix epoch at which the file was created.
    pub time_date_stamp_raw: u32,
    /// The file offset of the COFF symbol table, or zero if none is present.
    pub pointer_to_symbol_table: u32,
    /// The number of entries in the symbol table.
    pub number_of_symbols: u32,
    /// The size of the optional header, required for executable files.
    pub size_of_optional_header: u16,
    /// Raw characteristics bitfield. See [`Characteristics`] for the decoded view.
    pub characteristics: u16,
}

impl FileHeader {
    /// Best-effort decode of `time_date_stamp_raw` as a UTC timestamp. Malware commonly
    /// forges this field, so callers that need a timestamp should treat `None` (an
    /// out-of-range value) as unremarkable rather than a parse failure.
    pub fn time_date_stamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time_date_stamp_raw as i64, 0)
    }

    pub fn characteristics(&self) -> Characteristics {
        Characteristics::from(self.characteristics)
    }
}

impl Codec for FileHeader {
    const SIZE: usize = 20;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedHeader {
                record: "FILE_HEADER",
                offset: 0,
            });
        }
        let machine_raw = u16::from_le_bytes([bytes[0], bytes[1]]);
        let number_of_sections = u16::from_le_bytes([bytes[2], bytes[3]]);
        let time_date_stamp_raw = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let pointer_to_symbol_table =
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let number_of_symbols = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        let size_of_optional_header = u16::from_le_bytes([bytes[16], bytes[17]]);
        let characteristics = u16::from_le_bytes([bytes[18], bytes[19]]);

        Ok(Self {
            machine: Machine::from(machine_raw),
            machine_raw,
            number_of_sections,
            time_date_stamp_raw,
            pointer_to_symbol_table,
            number_of_symbols,
            size_of_optional_header,
            characteristics,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.machine_raw.to_le_bytes());
        out.extend_from_slice(&self.number_of_sections.to_le_bytes());
        out.extend_from_slice(&self.time_date_stamp_raw.to_le_bytes());
        out.extend_from_slice(&self.pointer_to_symbol_table.to_le_bytes());
        out.extend_from_slice(&self.number_of_symbols.to_le_bytes());
        out.extend_from_slice(&self.size_of_optional_header.to_le_bytes());
        out.extend_from_slice(&self.characteristics.to_le_bytes());
        out
    }
}
