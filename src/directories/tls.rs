use crate::address_map::AddressMap;
use crate::warnings::WarningLog;

/// `IMAGE_TLS_DIRECTORY`. All address fields are absolute virtual addresses in the
/// source structure, not RVAs; they are translated to RVAs (by subtracting
/// `ImageBase`) before being resolved through the section table.
#[derive(Debug, Clone)]
pub struct TlsDirectory {
    pub start_address_of_raw_data: u64,
    pub end_address_of_raw_data: u64,
    pub address_of_index: u64,
    pub address_of_callbacks: u64,
    pub size_of_zero_fill: u32,
    pub characteristics: u32,
    pub callbacks: Vec<u64>,
}

fn va_to_rva(va: u64, image_base: u64) -> Option<u32> {
    if va < image_base {
        return None;
    }
    u32::try_from(va - image_base).ok()
}

/// Decode the `IMAGE_TLS_DIRECTORY` at `rva` and, if `AddressOfCallBacks` is set,
/// the NUL-terminated array of callback VAs it points to.
pub fn parse_tls_directory(
    map: &AddressMap,
    rva: u32,
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
) -> Option<TlsDirectory> {
    let width = if is_64 { 8 } else { 4 };
    let fixed_size = width * 4 + 8;
    let bytes = match map.read_at_rva(rva, fixed_size) {
        Ok(b) => b,
        Err(_) => {
            warnings.push(format!("could not read TLS directory at rva {rva:#x}"));
            return None;
        }
    };

    let read_addr = |o: usize| -> u64 {
        if is_64 {
            u64::from_le_bytes(bytes[o..o + 8].try_into().unwrap())
        } else {
            u32::from_le_bytes(bytes[o..o + 4].try_into().unwrap()) as u64
        }
    };

    let start_address_of_raw_data = read_addr(0);
    let end_address_of_raw_data = read_addr(width);
    let address_of_index = read_addr(width * 2);
    let address_of_callbacks = read_addr(width * 3);
    let size_of_zero_fill = u32::from_le_bytes(bytes[width * 4..width * 4 + 4].try_into().unwrap());
    let characteristics = u32::from_le_bytes(bytes[width * 4 + 4..width * 4 + 8].try_into().unwrap());

    let mut callbacks = Vec::new();
    if address_of_callbacks != 0 {
        if let Some(mut cb_rva) = va_to_rva(address_of_callbacks, image_base) {
            loop {
                let value = if is_64 {
                    map.u64_at_rva(cb_rva)
                } else {
                    map.u32_at_rva(cb_rva).map(|v| v as u64)
                };
                match value {
                    Ok(0) | Err(_) => break,
                    Ok(v) => callbacks.push(v),
                }
                cb_rva += width as u32;
            }
        } else {
            warnings.push("TLS callback array VA precedes ImageBase".into());
        }
    }

    Some(TlsDirectory {
        start_address_of_raw_data,
        end_address_of_raw_data,
        address_of_index,
        address_of_callbacks,
        size_of_zero_fill,
        characteristics,
        callbacks,
    })
}
