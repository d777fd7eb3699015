use crate::address_map::AddressMap;
use crate::directories::version_info::{parse_version_info, VersionInfo};
use crate::warnings::WarningLog;

const RT_VERSION: u16 = 16;

/// Either a string name (decoded from a length-prefixed UTF-16 block) or a numeric id.
#[derive(Debug, Clone)]
pub enum ResourceName {
    Id(u16),
    Name(String),
}

impl ResourceName {
    pub fn as_id(&self) -> Option<u16> {
        match self {
            ResourceName::Id(id) => Some(*id),
            ResourceName::Name(_) => None,
        }
    }
}

/// `IMAGE_RESOURCE_DATA_ENTRY` plus the language/sublanguage split out of the owning
/// entry's numeric `Name`, per the specification's leaf-decoding rule.
#[derive(Debug, Clone)]
pub struct ResourceDataEntry {
    pub offset_to_data: u32,
    pub size: u32,
    pub code_page: u32,
    pub lang: u8,
    pub sublang: u8,
}

/// A node's payload: either another directory or a terminal data entry, never both.
#[derive(Debug, Clone)]
pub enum ResourceNode {
    Directory(ResourceDirectory),
    Data(ResourceDataEntry),
}

#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub name: ResourceName,
    pub node: ResourceNode,
}

#[derive(Debug, Clone)]
pub struct ResourceDirectory {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub entries: Vec<ResourceEntry>,
}

struct RawDirHeader {
    characteristics: u32,
    time_date_stamp: u32,
    major_version: u16,
    minor_version: u16,
    number_of_named_entries: u16,
    number_of_id_entries: u16,
}

impl RawDirHeader {
    const SIZE: usize = 16;

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            characteristics: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            time_date_stamp: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            major_version: u16::from_le_bytes([bytes[8], bytes[9]]),
            minor_version: u16::from_le_bytes([bytes[10], bytes[11]]),
            number_of_named_entries: u16::from_le_bytes([bytes[12], bytes[13]]),
            number_of_id_entries: u16::from_le_bytes([bytes[14], bytes[15]]),
        })
    }
}

struct RawEntry {
    name_raw: u32,
    offset_to_data_raw: u32,
}

const ENTRY_SIZE: u64 = 8;
const NAME_IS_STRING: u32 = 0x8000_0000;
const DATA_IS_DIRECTORY: u32 = 0x8000_0000;

fn decode_entry(bytes: &[u8]) -> Option<RawEntry> {
    if bytes.len() < ENTRY_SIZE as usize {
        return None;
    }
    Some(RawEntry {
        name_raw: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        offset_to_data_raw: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    })
}

/// Decode the resource directory rooted at `rva`. `rva` doubles as both the node being
/// decoded and (only for the outermost call) the cycle-detection anchor; recursive
/// calls pass the same `base_rva` (the root's own RVA) down unchanged.
pub fn parse_resource_directory(
    map: &AddressMap,
    rva: u32,
    base_rva: u32,
    warnings: &mut WarningLog,
) -> ResourceDirectory {
    let header_bytes = match map.read_at_rva(rva, RawDirHeader::SIZE) {
        Ok(b) => b,
        Err(_) => {
            warnings.push(format!("could not read resource directory at rva {rva:#x}"));
            return empty_directory();
        }
    };
    let header = match RawDirHeader::decode(header_bytes) {
        Some(h) => h,
        None => {
            warnings.push(format!("truncated resource directory at rva {rva:#x}"));
            return empty_directory();
        }
    };

    let child_count = header.number_of_named_entries as u32 + header.number_of_id_entries as u32;
    let mut entries = Vec::new();

    for i in 0..child_count as u64 {
        let entry_offset_rva = rva + RawDirHeader::SIZE as u32 + (i * ENTRY_SIZE) as u32;
        let entry_bytes = match map.read_at_rva(entry_offset_rva, ENTRY_SIZE as usize) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(format!(
                    "resource directory at rva {rva:#x} truncated after {i} entries"
                ));
                break;
            }
        };
        let raw = match decode_entry(entry_bytes) {
            Some(e) => e,
            None => break,
        };

        let name = if raw.name_raw & NAME_IS_STRING != 0 {
            let name_rva = base_rva + (raw.name_raw & 0x7fff_ffff);
            match read_resource_string(map, name_rva) {
                Some(s) => ResourceName::Name(s),
                None => {
                    warnings.push(format!(
                        "unreadable resource name string at rva {name_rva:#x}"
                    ));
                    ResourceName::Id((raw.name_raw & 0xffff) as u16)
                }
            }
        } else {
            ResourceName::Id((raw.name_raw & 0xffff) as u16)
        };

        let is_directory = raw.offset_to_data_raw & DATA_IS_DIRECTORY != 0;
        let node = if is_directory {
            let child_rva = base_rva + (raw.offset_to_data_raw & 0x7fff_ffff);
            if child_rva == rva {
                // Self-referential directory: stop enumerating this node's children.
                break;
            }
            ResourceNode::Directory(parse_resource_directory(map, child_rva, base_rva, warnings))
        } else {
            let data_rva = base_rva + raw.offset_to_data_raw;
            match parse_data_entry(map, data_rva, &name) {
                Some(d) => ResourceNode::Data(d),
                None => {
                    warnings.push(format!(
                        "unreadable resource data entry at rva {data_rva:#x}"
                    ));
                    continue;
                }
            }
        };

        entries.push(ResourceEntry { name, node });
    }

    ResourceDirectory {
        characteristics: header.characteristics,
        time_date_stamp: header.time_date_stamp,
        major_version: header.major_version,
        minor_version: header.minor_version,
        entries,
    }
}

/// `children[-1].directory.entries[0].directory.entries[0].data` per the specification:
/// last id-level entry, its first lang-level entry, that entry's leaf data.
fn find_version_leaf(id_level: &ResourceDirectory) -> Option<(u32, u32)> {
    let id_entry = id_level.entries.last()?;
    let lang_level = match &id_entry.node {
        ResourceNode::Directory(d) => d,
        ResourceNode::Data(_) => return None,
    };
    let lang_entry = lang_level.entries.first()?;
    match &lang_entry.node {
        ResourceNode::Data(d) => Some((d.offset_to_data, d.size)),
        ResourceNode::Directory(_) => None,
    }
}

fn empty_directory() -> ResourceDirectory {
    ResourceDirectory {
        characteristics: 0,
        time_date_stamp: 0,
        major_version: 0,
        minor_version: 0,
        entries: Vec::new(),
    }
}

fn read_resource_string(map: &AddressMap, rva: u32) -> Option<String> {
    let len = map.u16_at_rva(rva).ok()? as usize;
    map.utf16_at_rva(rva + 2, len).ok()
}

fn parse_data_entry(map: &AddressMap, rva: u32, name: &ResourceName) -> Option<ResourceDataEntry> {
    let bytes = map.read_at_rva(rva, 16).ok()?;
    let offset_to_data = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let code_page = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let id = name.as_id().unwrap_or(0);
    Some(ResourceDataEntry {
        offset_to_data,
        size,
        code_page,
        lang: (id & 0xff) as u8,
        sublang: ((id >> 8) & 0xff) as u8,
    })
}

/// Re-walk the tree to extract the decoded `VS_VERSIONINFO` payload, if a RT_VERSION
/// leaf was found and successfully parsed during the initial top-level decode.
pub fn resolve_version_info(
    map: &AddressMap,
    root: &ResourceDirectory,
    warnings: &mut WarningLog,
) -> Option<VersionInfo> {
    let type_entry = root.entries.iter().find(|e| e.name.as_id() == Some(RT_VERSION))?;
    let id_level = match &type_entry.node {
        ResourceNode::Directory(d) => d,
        ResourceNode::Data(_) => return None,
    };
    let (offset_to_data, size) = find_version_leaf(id_level)?;
    let file_offset = map.offset_of(offset_to_data).ok()?;
    parse_version_info(&map.view(), file_offset, size, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(offset_to_data: u32, size: u32) -> ResourceEntry {
        ResourceEntry {
            name: ResourceName::Id(0x0409),
            node: ResourceNode::Data(ResourceDataEntry {
                offset_to_data,
                size,
                code_page: 0,
                lang: 0x09,
                sublang: 0x04,
            }),
        }
    }

    fn dir(entries: Vec<ResourceEntry>) -> ResourceDirectory {
        ResourceDirectory {
            characteristics: 0,
            time_date_stamp: 0,
            major_version: 0,
            minor_version: 0,
            entries,
        }
    }

    #[test]
    fn find_version_leaf_takes_last_id_entry_and_first_lang_entry() {
        let lang_level = dir(vec![leaf(0x3000, 0x200)]);
        let id_level = dir(vec![
            ResourceEntry {
                name: ResourceName::Id(1),
                node: ResourceNode::Directory(dir(vec![])),
            },
            ResourceEntry {
                name: ResourceName::Id(2),
                node: ResourceNode::Directory(lang_level),
            },
        ]);
        assert_eq!(find_version_leaf(&id_level), Some((0x3000, 0x200)));
    }

    #[test]
    fn find_version_leaf_returns_none_when_last_entry_is_a_data_leaf() {
        let id_level = dir(vec![leaf(0x1000, 0x10)]);
        assert!(find_version_leaf(&id_level).is_none());
    }
}
