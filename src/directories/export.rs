use crate::address_map::AddressMap;
use crate::warnings::WarningLog;

/// `IMAGE_EXPORT_DIRECTORY`'s fixed fields (the three parallel array RVAs it also
/// carries are consumed directly by [`parse_export_directory`], not stored here).
#[derive(Debug, Clone)]
pub struct ExportDirectoryHeader {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub name: u32,
    pub base: u32,
    pub number_of_functions: u32,
    pub number_of_names: u32,
    pub address_of_functions: u32,
    pub address_of_names: u32,
    pub address_of_name_ordinals: u32,
}

impl ExportDirectoryHeader {
    const SIZE: usize = 40;

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        Some(Self {
            characteristics: u32_at(0),
            time_date_stamp: u32_at(4),
            major_version: u16_at(8),
            minor_version: u16_at(10),
            name: u32_at(12),
            base: u32_at(16),
            number_of_functions: u32_at(20),
            number_of_names: u32_at(24),
            address_of_functions: u32_at(28),
            address_of_names: u32_at(32),
            address_of_name_ordinals: u32_at(36),
        })
    }
}

/// One resolved export symbol: named, ordinal-only, or a forwarder to another module.
#[derive(Debug, Clone)]
pub struct ExportSymbol {
    pub ordinal: u32,
    pub address: u32,
    pub name: Option<Vec<u8>>,
    pub forwarder: Option<Vec<u8>>,
}

impl ExportSymbol {
    pub fn name_lossy(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|n| String::from_utf8_lossy(n).into_owned())
    }

    pub fn forwarder_lossy(&self) -> Option<String> {
        self.forwarder
            .as_ref()
            .map(|n| String::from_utf8_lossy(n).into_owned())
    }
}

/// The decoded export directory: its own name plus every resolved symbol, named
/// entries first (in table order) followed by anonymous ordinal-only exports.
#[derive(Debug, Clone)]
pub struct ExportDirectory {
    pub name: Option<Vec<u8>>,
    pub header: ExportDirectoryHeader,
    pub symbols: Vec<ExportSymbol>,
}

/// Decode the export directory at `rva`/`size`. A directory that cannot be read at
/// all, or whose name-ordinal/function arrays don't bounds-check, is abandoned —
/// the whole directory is dropped, not just the offending entry, since a corrupt
/// index array makes every subsequent lookup suspect.
pub fn parse_export_directory(
    map: &AddressMap,
    rva: u32,
    _size: u32,
    warnings: &mut WarningLog,
) -> Option<ExportDirectory> {
    let bytes = match map.read_at_rva(rva, ExportDirectoryHeader::SIZE) {
        Ok(b) => b,
        Err(_) => {
            warnings.push(format!("could not read export directory at rva {rva:#x}"));
            return None;
        }
    };
    let header = ExportDirectoryHeader::decode(bytes)?;

    let name = map.ascii_at_rva(header.name).ok();

    let functions_len = header.number_of_functions as usize * 4;
    let functions_bytes = match map.read_at_rva(header.address_of_functions, functions_len) {
        Ok(b) => b,
        Err(_) => {
            warnings.push("export directory has an unreadable AddressOfFunctions array".into());
            return None;
        }
    };
    let read_function = |idx: u32| -> u32 {
        let o = idx as usize * 4;
        u32::from_le_bytes([
            functions_bytes[o],
            functions_bytes[o + 1],
            functions_bytes[o + 2],
            functions_bytes[o + 3],
        ])
    };

    let mut named_ordinal_indices = vec![false; header.number_of_functions as usize];
    let mut symbols = Vec::new();

    if header.number_of_names > 0 {
        let names_bytes = match map.read_at_rva(header.address_of_names, header.number_of_names as usize * 4) {
            Ok(b) => b,
            Err(_) => {
                warnings.push("export directory has an unreadable AddressOfNames array".into());
                return None;
            }
        };
        let ordinals_bytes = match map.read_at_rva(
            header.address_of_name_ordinals,
            header.number_of_names as usize * 2,
        ) {
            Ok(b) => b,
            Err(_) => {
                warnings.push("export directory has an unreadable AddressOfNameOrdinals array".into());
                return None;
            }
        };

        for i in 0..header.number_of_names as usize {
            let name_rva = u32::from_le_bytes([
                names_bytes[i * 4],
                names_bytes[i * 4 + 1],
                names_bytes[i * 4 + 2],
                names_bytes[i * 4 + 3],
            ]);
            let ordinal_index =
                u16::from_le_bytes([ordinals_bytes[i * 2], ordinals_bytes[i * 2 + 1]]) as u32;

            if (ordinal_index as usize) * 4 >= functions_bytes.len() {
                warnings.push(format!(
                    "export name ordinal index {ordinal_index} out of range; abandoning directory"
                ));
                return None;
            }

            let symbol_name = map.ascii_at_rva(name_rva).ok();
            let function_rva = read_function(ordinal_index);
            named_ordinal_indices[ordinal_index as usize] = true;

            symbols.push(build_symbol(
                header.base + ordinal_index,
                function_rva,
                symbol_name,
                rva,
                _size,
                map,
            ));
        }
    }

    for idx in 0..header.number_of_functions {
        if named_ordinal_indices[idx as usize] {
            continue;
        }
        let function_rva = read_function(idx);
        if function_rva == 0 {
            continue;
        }
        symbols.push(build_symbol(header.base + idx, function_rva, None, rva, _size, map));
    }

    Some(ExportDirectory {
        name,
        header,
        symbols,
    })
}

fn build_symbol(
    ordinal: u32,
    function_rva: u32,
    name: Option<Vec<u8>>,
    dir_rva: u32,
    dir_size: u32,
    map: &AddressMap,
) -> ExportSymbol {
    let is_forwarder = function_rva >= dir_rva && (function_rva as u64) < dir_rva as u64 + dir_size as u64;
    let forwarder = if is_forwarder {
        map.ascii_at_rva(function_rva).ok()
    } else {
        None
    };
    ExportSymbol {
        ordinal,
        address: function_rva,
        name,
        forwarder,
    }
}
