use crate::address_map::AddressMap;
use crate::error::Result;
use crate::struct_codec::{Codec, RebuildEntry, UnionCell};
use crate::warnings::WarningLog;

/// High bit of a 32-bit (PE32) thunk marking an ordinal import.
pub const IMAGE_ORDINAL_FLAG32: u32 = 0x8000_0000;
/// High bit of a 64-bit (PE32+) thunk marking an ordinal import.
pub const IMAGE_ORDINAL_FLAG64: u64 = 0x8000_0000_0000_0000;

/// `IMAGE_IMPORT_DESCRIPTOR`.
#[derive(Debug, Clone)]
pub struct ImportDescriptor {
    pub original_first_thunk: u32,
    pub time_date_stamp: u32,
    pub forwarder_chain: u32,
    pub name: u32,
    pub first_thunk: u32,
}

impl Codec for ImportDescriptor {
    const SIZE: usize = 20;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        Ok(Self {
            original_first_thunk: u32_at(0),
            time_date_stamp: u32_at(4),
            forwarder_chain: u32_at(8),
            name: u32_at(12),
            first_thunk: u32_at(16),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.original_first_thunk.to_le_bytes());
        out.extend_from_slice(&self.time_date_stamp.to_le_bytes());
        out.extend_from_slice(&self.forwarder_chain.to_le_bytes());
        out.extend_from_slice(&self.name.to_le_bytes());
        out.extend_from_slice(&self.first_thunk.to_le_bytes());
        out
    }
}

/// A single pointer-sized cell in an ILT or IAT. The cell's one value is
/// simultaneously `ForwarderString`, `Function`, `Ordinal`, and `AddressOfData`,
/// modeled with [`UnionCell`] per the specification's union-field rule.
#[derive(Debug, Clone)]
pub struct Thunk {
    pub offset: u64,
    pub is_64: bool,
    cell: UnionCell<u64>,
}

const THUNK_ALIASES: [&str; 4] = ["ForwarderString", "Function", "Ordinal", "AddressOfData"];

impl Thunk {
    fn new(offset: u64, is_64: bool, value: u64) -> Self {
        Self {
            offset,
            is_64,
            cell: UnionCell::new(&THUNK_ALIASES, value),
        }
    }

    pub fn raw(&self) -> u64 {
        self.cell.get("AddressOfData")
    }

    pub fn width(&self) -> usize {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    pub fn is_ordinal(&self) -> bool {
        if self.is_64 {
            self.raw() & IMAGE_ORDINAL_FLAG64 != 0
        } else {
            self.raw() & (IMAGE_ORDINAL_FLAG32 as u64) != 0
        }
    }

    pub fn ordinal(&self) -> u16 {
        (self.raw() & 0xffff) as u16
    }
}

impl RebuildEntry for Thunk {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode(&self) -> Vec<u8> {
        let v = self.cell.resolve();
        if self.is_64 {
            v.to_le_bytes().to_vec()
        } else {
            (v as u32).to_le_bytes().to_vec()
        }
    }
}

/// Read thunk words one at a time starting at `rva` until an all-zeroes thunk
/// terminates the table or a read fails. Per the documented source behavior, the
/// `rva == 0` guard is only checked once, before the loop starts — not on every
/// subsequent address as the table is walked (see DESIGN.md).
pub fn get_import_table(
    map: &AddressMap,
    rva: u32,
    is_64: bool,
    warnings: &mut WarningLog,
    label: &str,
) -> Vec<Thunk> {
    let mut table = Vec::new();
    if rva == 0 {
        return table;
    }
    let width = if is_64 { 8u32 } else { 4u32 };
    let mut cur = rva;
    loop {
        let offset = match map.offset_of(cur) {
            Ok(o) => o,
            Err(_) => {
                warnings.push(format!(
                    "{label}: invalid data reading import table at rva {cur:#x}"
                ));
                break;
            }
        };
        let value = if is_64 {
            map.u64_at_rva(cur)
        } else {
            map.u32_at_rva(cur).map(|v| v as u64)
        };
        let value = match value {
            Ok(v) => v,
            Err(_) => {
                warnings.push(format!(
                    "{label}: invalid data reading import table at rva {cur:#x}"
                ));
                break;
            }
        };
        if value == 0 {
            break;
        }
        table.push(Thunk::new(offset, is_64, value));
        cur = cur.wrapping_add(width);
    }
    table
}

#[derive(Debug, Clone, Copy)]
enum SelectedTable {
    None,
    Ilt,
    Iat,
    Abandon,
}

/// Implements the five-case ILT/IAT preference order from the specification.
fn select_table(ilt: &[Thunk], iat: &[Thunk]) -> SelectedTable {
    let (ilt_empty, iat_empty) = (ilt.is_empty(), iat.is_empty());
    if ilt_empty && iat_empty {
        SelectedTable::None
    } else if iat_empty && !ilt_empty {
        SelectedTable::Ilt
    } else if ilt_empty && !iat_empty {
        SelectedTable::Iat
    } else if ilt.len() == iat.len() {
        SelectedTable::Ilt
    } else {
        SelectedTable::Abandon
    }
}

/// One resolved import: either a named function or an ordinal-only import.
#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub ordinal: Option<u16>,
    pub name: Option<Vec<u8>>,
    pub hint: Option<u16>,
    pub bound: Option<u64>,
    pub address: u64,
}

impl ImportEntry {
    pub fn name_lossy(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|n| String::from_utf8_lossy(n).into_owned())
    }
}

/// One DLL's import descriptor plus its resolved entries.
#[derive(Debug, Clone)]
pub struct ImportDescData {
    pub dll: Vec<u8>,
    pub entries: Vec<ImportEntry>,
}

impl ImportDescData {
    pub fn dll_lossy(&self) -> String {
        String::from_utf8_lossy(&self.dll).into_owned()
    }
}

/// Walk the import directory at `rva`, decoding one `IMAGE_IMPORT_DESCRIPTOR` at a
/// time until an all-zeroes sentinel or an unreadable descriptor ends the list.
pub fn parse_import_directory(
    map: &AddressMap,
    rva: u32,
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
) -> Vec<ImportDescData> {
    parse_descriptor_table(map, rva, is_64, image_base, warnings, false)
}

/// Same shape as the import directory, but for delay-load imports: `pINT`/`pIAT`
/// stand in for `OriginalFirstThunk`/`FirstThunk`, and there is no forwarder chain.
pub fn parse_delay_import_directory(
    map: &AddressMap,
    rva: u32,
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
) -> Vec<ImportDescData> {
    parse_descriptor_table(map, rva, is_64, image_base, warnings, true)
}

fn parse_descriptor_table(
    map: &AddressMap,
    mut rva: u32,
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
    delay: bool,
) -> Vec<ImportDescData> {
    let mut out = Vec::new();
    let desc_size = if delay { DelayImportDescriptor::SIZE } else { ImportDescriptor::SIZE } as u32;

    loop {
        let desc_rva = rva;
        let bytes = match map.read_at_rva(desc_rva, desc_size as usize) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(format!(
                    "error parsing the import directory at rva {desc_rva:#x}"
                ));
                break;
            }
        };
        if bytes.iter().all(|&b| b == 0) {
            break;
        }

        let (ilt_rva, iat_rva, name_rva) = if delay {
            let d = match DelayImportDescriptor::decode(bytes) {
                Ok(d) => d,
                Err(_) => break,
            };
            (d.pint_rva, d.piat_rva, d.name_rva)
        } else {
            let d = match ImportDescriptor::decode(bytes) {
                Ok(d) => d,
                Err(_) => break,
            };
            (d.original_first_thunk, d.first_thunk, d.name)
        };

        rva += desc_size;

        let entries = match parse_imports(map, ilt_rva, iat_rva, is_64, image_base, warnings) {
            Some(entries) => entries,
            None => {
                warnings.push(format!(
                    "invalid import data at rva {desc_rva:#x}; abandoning descriptor"
                ));
                continue;
            }
        };
        if entries.is_empty() && ilt_rva == 0 && iat_rva == 0 {
            continue;
        }

        let dll = match map.ascii_at_rva(name_rva) {
            Ok(d) => d,
            Err(_) => continue,
        };
        if dll.is_empty() {
            continue;
        }

        out.push(ImportDescData { dll, entries });
    }
    out
}

fn parse_imports(
    map: &AddressMap,
    ilt_rva: u32,
    iat_rva: u32,
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
) -> Option<Vec<ImportEntry>> {
    let ilt = get_import_table(map, ilt_rva, is_64, warnings, "ILT");
    let iat = get_import_table(map, iat_rva, is_64, warnings, "IAT");

    let table = match select_table(&ilt, &iat) {
        SelectedTable::None => return Some(Vec::new()),
        SelectedTable::Ilt => &ilt,
        SelectedTable::Iat => &iat,
        SelectedTable::Abandon => return None,
    };

    let thunk_size = if is_64 { 8u64 } else { 4u64 };
    let mut out = Vec::with_capacity(table.len());
    for (idx, thunk) in table.iter().enumerate() {
        let mut ordinal = None;
        let mut name = None;
        let mut hint = None;

        if thunk.raw() != 0 {
            if thunk.is_ordinal() {
                ordinal = Some(thunk.ordinal());
            } else {
                let data_rva = thunk.raw() as u32;
                if let Ok(h) = map.u16_at_rva(data_rva) {
                    hint = Some(h);
                    if let Ok(n) = map.ascii_at_rva(data_rva + 2) {
                        if !n.is_empty() {
                            name = Some(n);
                        }
                    }
                }
            }
        }

        if ordinal.is_none() && name.is_none() {
            continue;
        }

        let address = (iat_rva as u64)
            .wrapping_add(image_base)
            .wrapping_add(idx as u64 * thunk_size);

        let bound = if idx < ilt.len() && idx < iat.len() && ilt[idx].raw() != iat[idx].raw() {
            Some(iat[idx].raw())
        } else {
            None
        };

        out.push(ImportEntry {
            ordinal,
            name,
            hint,
            bound,
            address,
        });
    }
    Some(out)
}

/// `delay-load import descriptor`.
#[derive(Debug, Clone)]
pub struct DelayImportDescriptor {
    pub attributes: u32,
    pub name_rva: u32,
    pub module_handle_rva: u32,
    pub piat_rva: u32,
    pub pint_rva: u32,
    pub bound_iat_rva: u32,
    pub unload_iat_rva: u32,
    pub time_date_stamp: u32,
}

impl Codec for DelayImportDescriptor {
    const SIZE: usize = 32;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        Ok(Self {
            attributes: u32_at(0),
            name_rva: u32_at(4),
            module_handle_rva: u32_at(8),
            piat_rva: u32_at(12),
            pint_rva: u32_at(16),
            bound_iat_rva: u32_at(20),
            unload_iat_rva: u32_at(24),
            time_date_stamp: u32_at(28),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.attributes.to_le_bytes());
        out.extend_from_slice(&self.name_rva.to_le_bytes());
        out.extend_from_slice(&self.module_handle_rva.to_le_bytes());
        out.extend_from_slice(&self.piat_rva.to_le_bytes());
        out.extend_from_slice(&self.pint_rva.to_le_bytes());
        out.extend_from_slice(&self.bound_iat_rva.to_le_bytes());
        out.extend_from_slice(&self.unload_iat_rva.to_le_bytes());
        out.extend_from_slice(&self.time_date_stamp.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thunk(v: u64) -> Thunk {
        Thunk::new(0, false, v)
    }

    #[test]
    fn select_table_prefers_ilt_when_lengths_match() {
        let ilt = vec![thunk(1), thunk(2)];
        let iat = vec![thunk(3), thunk(4)];
        assert!(matches!(select_table(&ilt, &iat), SelectedTable::Ilt));
    }

    #[test]
    fn select_table_falls_back_to_whichever_table_is_nonempty() {
        let empty: Vec<Thunk> = Vec::new();
        let iat = vec![thunk(1)];
        assert!(matches!(select_table(&empty, &iat), SelectedTable::Iat));
        assert!(matches!(select_table(&iat, &empty), SelectedTable::Ilt));
        assert!(matches!(select_table(&empty, &empty), SelectedTable::None));
    }

    #[test]
    fn select_table_abandons_on_length_mismatch() {
        let ilt = vec![thunk(1), thunk(2)];
        let iat = vec![thunk(3)];
        assert!(matches!(select_table(&ilt, &iat), SelectedTable::Abandon));
    }

    #[test]
    fn ordinal_thunk_reports_high_bit_and_low_word() {
        let t = thunk(IMAGE_ORDINAL_FLAG32 as u64 | 42);
        assert!(t.is_ordinal());
        assert_eq!(t.ordinal(), 42);
    }
}
