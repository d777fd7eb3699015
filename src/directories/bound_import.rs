use crate::address_map::AddressMap;
use crate::warnings::WarningLog;

/// One forwarder reference beneath a bound-import descriptor.
#[derive(Debug, Clone)]
pub struct BoundForwarderRef {
    pub time_date_stamp: u32,
    pub module_name: Vec<u8>,
}

/// `IMAGE_BOUND_IMPORT_DESCRIPTOR` plus its resolved module name and forwarder refs.
#[derive(Debug, Clone)]
pub struct BoundImportDescriptor {
    pub time_date_stamp: u32,
    pub module_name: Vec<u8>,
    pub forwarders: Vec<BoundForwarderRef>,
}

/// Walk `IMAGE_BOUND_IMPORT_DESCRIPTOR` records at `rva`. Module name offsets are
/// relative to the start of the bound-import directory itself, not to an RVA base —
/// they are read directly as file-relative offsets from the directory's own offset.
pub fn parse_bound_import_directory(
    map: &AddressMap,
    rva: u32,
    warnings: &mut WarningLog,
) -> Vec<BoundImportDescriptor> {
    let mut out = Vec::new();
    let mut cur = rva;

    loop {
        let bytes = match map.read_at_rva(cur, 8) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(format!("unreadable bound import descriptor at rva {cur:#x}"));
                break;
            }
        };
        if bytes.iter().all(|&b| b == 0) {
            break;
        }
        let time_date_stamp = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let offset_module_name = u16::from_le_bytes([bytes[4], bytes[5]]);
        let forwarder_count = u16::from_le_bytes([bytes[6], bytes[7]]);

        let module_name = map
            .ascii_at_rva(rva + offset_module_name as u32)
            .unwrap_or_default();

        let mut forwarders = Vec::with_capacity(forwarder_count as usize);
        cur += 8;
        for _ in 0..forwarder_count {
            let fwd_bytes = match map.read_at_rva(cur, 8) {
                Ok(b) => b,
                Err(_) => {
                    warnings.push(format!(
                        "unreadable bound forwarder ref at rva {cur:#x}"
                    ));
                    break;
                }
            };
            let fwd_time = u32::from_le_bytes([fwd_bytes[0], fwd_bytes[1], fwd_bytes[2], fwd_bytes[3]]);
            let fwd_offset = u16::from_le_bytes([fwd_bytes[4], fwd_bytes[5]]);
            let fwd_name = map
                .ascii_at_rva(rva + fwd_offset as u32)
                .unwrap_or_default();
            forwarders.push(BoundForwarderRef {
                time_date_stamp: fwd_time,
                module_name: fwd_name,
            });
            cur += 8;
        }

        if module_name.is_empty() {
            continue;
        }

        out.push(BoundImportDescriptor {
            time_date_stamp,
            module_name,
            forwarders,
        });
    }

    out
}
