use crate::address_map::AddressMap;
use crate::warnings::WarningLog;

/// `IMAGE_DEBUG_DIRECTORY`.
#[derive(Debug, Clone)]
pub struct DebugEntry {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub kind: u32,
    pub size_of_data: u32,
    pub address_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

const ENTRY_SIZE: usize = 28;

fn decode(bytes: &[u8]) -> Option<DebugEntry> {
    if bytes.len() < ENTRY_SIZE {
        return None;
    }
    let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
    let u32_at = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
    Some(DebugEntry {
        characteristics: u32_at(0),
        time_date_stamp: u32_at(4),
        major_version: u16_at(8),
        minor_version: u16_at(10),
        kind: u32_at(12),
        size_of_data: u32_at(16),
        address_of_raw_data: u32_at(20),
        pointer_to_raw_data: u32_at(24),
    })
}

/// Decode one `IMAGE_DEBUG_DIRECTORY` entry per `ENTRY_SIZE` bytes of the directory.
pub fn parse_debug_directory(
    map: &AddressMap,
    rva: u32,
    size: u32,
    warnings: &mut WarningLog,
) -> Vec<DebugEntry> {
    let count = size as usize / ENTRY_SIZE;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let entry_rva = rva + (i * ENTRY_SIZE) as u32;
        match map.read_at_rva(entry_rva, ENTRY_SIZE).ok().and_then(decode) {
            Some(e) => out.push(e),
            None => {
                warnings.push(format!(
                    "debug directory truncated after {i} of {count} entries"
                ));
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::ByteView;
    use crate::section::Section;

    fn map(buf: &[u8]) -> AddressMap {
        let view = ByteView::new(buf);
        let sections: &[Section] = &[];
        AddressMap::new(view, sections, buf.len() as u64)
    }

    fn entry_bytes(kind: u32, size_of_data: u32) -> Vec<u8> {
        let mut b = vec![0u8; ENTRY_SIZE];
        b[12..16].copy_from_slice(&kind.to_le_bytes());
        b[16..20].copy_from_slice(&size_of_data.to_le_bytes());
        b
    }

    #[test]
    fn count_derives_from_directory_size_divided_by_entry_size() {
        let mut buf = entry_bytes(2, 0x100); // IMAGE_DEBUG_TYPE_CODEVIEW
        buf.extend(entry_bytes(1, 0x40)); // IMAGE_DEBUG_TYPE_COFF
        let map = map(&buf);
        let mut warnings = WarningLog::new();
        let entries = parse_debug_directory(&map, 0, buf.len() as u32, &mut warnings);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, 2);
        assert_eq!(entries[1].size_of_data, 0x40);
        assert!(warnings.is_empty());
    }

    #[test]
    fn truncated_final_entry_warns_and_stops() {
        let mut buf = entry_bytes(2, 0x100);
        buf.truncate(ENTRY_SIZE - 1);
        let map = map(&buf);
        let mut warnings = WarningLog::new();
        let entries = parse_debug_directory(&map, 0, ENTRY_SIZE as u32, &mut warnings);
        assert!(entries.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
