use crate::address_map::AddressMap;
use crate::warnings::WarningLog;

/// One fixup within a base relocation block: a 4-bit type and a 12-bit offset from
/// the block's `VirtualAddress`.
#[derive(Debug, Clone, Copy)]
pub struct Relocation {
    pub kind: u8,
    pub offset: u16,
}

impl Relocation {
    pub fn rva(&self, block_va: u32) -> u32 {
        block_va + self.offset as u32
    }
}

#[derive(Debug, Clone)]
pub struct RelocationBlock {
    pub virtual_address: u32,
    pub entries: Vec<Relocation>,
}

/// Walk `IMAGE_BASE_RELOCATION` blocks from `rva` until `rva + size` is reached or a
/// block cannot be read.
pub fn parse_base_relocations(
    map: &AddressMap,
    rva: u32,
    size: u32,
    warnings: &mut WarningLog,
) -> Vec<RelocationBlock> {
    let end = rva as u64 + size as u64;
    let mut blocks = Vec::new();
    let mut cur = rva as u64;

    while cur < end {
        let header = match map.read_at_rva(cur as u32, 8) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(format!("unreadable base relocation block at rva {cur:#x}"));
                break;
            }
        };
        let virtual_address = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let size_of_block = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if size_of_block < 8 {
            warnings.push(format!(
                "base relocation block at rva {cur:#x} has implausible SizeOfBlock {size_of_block}"
            ));
            break;
        }

        let entry_count = (size_of_block as usize - 8) / 2;
        let entries_bytes = match map.read_at_rva(cur as u32 + 8, entry_count * 2) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(format!(
                    "base relocation block at rva {cur:#x} truncated before {entry_count} entries"
                ));
                break;
            }
        };
        let entries = entries_bytes
            .chunks_exact(2)
            .map(|c| {
                let word = u16::from_le_bytes([c[0], c[1]]);
                Relocation {
                    kind: (word >> 12) as u8,
                    offset: word & 0x0fff,
                }
            })
            .collect();

        blocks.push(RelocationBlock {
            virtual_address,
            entries,
        });
        cur += size_of_block as u64;
    }

    blocks
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

    #[test]
    fn decodes_two_fixups_and_stops_at_end_of_directory() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x1000u32.to_le_bytes());
        buf.extend_from_slice(&12u32.to_le_bytes()); // SizeOfBlock: 8 + 2 entries
        buf.extend_from_slice(&((3u16 << 12) | 0x004).to_le_bytes()); // HIGHLOW @ 0x004
        buf.extend_from_slice(&((0u16 << 12) | 0x000).to_le_bytes()); // ABSOLUTE padding
        let map = map(&buf);
        let mut warnings = WarningLog::new();
        let blocks = parse_base_relocations(&map, 0, buf.len() as u32, &mut warnings);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].virtual_address, 0x1000);
        assert_eq!(blocks[0].entries.len(), 2);
        assert_eq!(blocks[0].entries[0].kind, 3);
        assert_eq!(blocks[0].entries[0].rva(0x1000), 0x1004);
        assert!(warnings.is_empty());
    }

    #[test]
    fn implausible_size_of_block_warns_and_stops() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x2000u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes()); // smaller than the 8-byte header itself
        let map = map(&buf);
        let mut warnings = WarningLog::new();
        let blocks = parse_base_relocations(&map, 0, buf.len() as u32, &mut warnings);
        assert!(blocks.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
