use crate::bytes::ByteView;
use crate::error::{Error, Result};
use crate::header::dll_characteristics::DllCharacteristics;
use crate::header::win_subsystem::Subsystem;
use crate::struct_codec::RebuildEntry;

/// `Magic` value identifying a PE32 optional header.
pub const IMAGE_NT_OPTIONAL_HDR32_MAGIC: u16 = 0x10b;
/// `Magic` value identifying a PE32+ optional header.
pub const IMAGE_NT_OPTIONAL_HDR64_MAGIC: u16 = 0x20b;

const MIN_VALID_RAW_SIZE_32: usize = 69;
const MIN_VALID_RAW_SIZE_64: usize = 73;
const ZERO_PAD: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeFormat {
    Pe32,
    Pe32Plus,
}

impl PeFormat {
    /// Size of the optional header's fixed portion, excluding the trailing data
    /// directory array.
    pub fn fixed_size(self) -> usize {
        match self {
            PeFormat::Pe32 => 96,
            PeFormat::Pe32Plus => 112,
        }
    }
}

/// The Optional Header, covering both the PE32 and PE32+ layouts. Fields that are
/// 32-bit in PE32 and 64-bit in PE32+ (`ImageBase` and the stack/heap reserve/commit
/// sizes) are widened to `u64` uniformly; `encode()` narrows them back down for PE32.
#[derive(Debug, Clone)]
pub struct OptionalHeader {
    pub format: PeFormat,
    pub magic: u16,
    pub major_linker_version: u8,
    pub minor_linker_version: u8,
    pub size_of_code: u32,
    pub size_of_initialized_data: u32,
    pub size_of_uninitialized_data: u32,
    pub address_of_entry_point: u32,
    pub base_of_code: u32,
    /// Present only for PE32; PE32+ drops this field.
    pub base_of_data: Option<u32>,
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub major_operating_system_version: u16,
    pub minor_operating_system_version: u16,
    pub major_image_version: u16,
    pub minor_image_version: u16,
    pub major_subsystem_version: u16,
    pub minor_subsystem_version: u16,
    pub win32_version_value: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub check_sum: u32,
    pub subsystem_raw: u16,
    pub dll_characteristics_raw: u16,
    pub size_of_stack_reserve: u64,
    pub size_of_stack_commit: u64,
    pub size_of_heap_reserve: u64,
    pub size_of_heap_commit: u64,
    pub loader_flags: u32,
    pub number_of_rva_and_sizes: u32,
}

impl OptionalHeader {
    pub fn subsystem(&self) -> Subsystem {
        Subsystem::from(self.subsystem_raw)
    }

    pub fn dll_characteristics(&self) -> DllCharacteristics {
        DllCharacteristics::from(self.dll_characteristics_raw)
    }

    fn decode_fixed(format: PeFormat, bytes: &[u8]) -> Self {
        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        let u64_at = |o: usize| {
            u64::from_le_bytes([
                bytes[o],
                bytes[o + 1],
                bytes[o + 2],
                bytes[o + 3],
                bytes[o + 4],
                bytes[o + 5],
                bytes[o + 6],
                bytes[o + 7],
            ])
        };

        let magic = u16_at(0);
        let major_linker_version = bytes[2];
        let minor_linker_version = bytes[3];
        let size_of_code = u32_at(4);
        let size_of_initialized_data = u32_at(8);
        let size_of_uninitialized_data = u32_at(12);
        let address_of_entry_point = u32_at(16);
        let base_of_code = u32_at(20);

        match format {
            PeFormat::Pe32 => {
                let base_of_data = Some(u32_at(24));
                let image_base = u32_at(28) as u64;
                let section_alignment = u32_at(32);
                let file_alignment = u32_at(36);
                let major_operating_system_version = u16_at(40);
                let minor_operating_system_version = u16_at(42);
                let major_image_version = u16_at(44);
                let minor_image_version = u16_at(46);
                let major_subsystem_version = u16_at(48);
                let minor_subsystem_version = u16_at(50);
                let win32_version_value = u32_at(52);
                let size_of_image = u32_at(56);
                let size_of_headers = u32_at(60);
                let check_sum = u32_at(64);
                let subsystem_raw = u16_at(68);
                let dll_characteristics_raw = u16_at(70);
                let size_of_stack_reserve = u32_at(72) as u64;
                let size_of_stack_commit = u32_at(76) as u64;
                let size_of_heap_reserve = u32_at(80) as u64;
                let size_of_heap_commit = u32_at(84) as u64;
                let loader_flags = u32_at(88);
                let number_of_rva_and_sizes = u32_at(92);

                Self {
                    format,
                    magic,
                    major_linker_version,
                    minor_linker_version,
                    size_of_code,
                    size_of_initialized_data,
                    size_of_uninitialized_data,
                    address_of_entry_point,
                    base_of_code,
                    base_of_data,
                    image_base,
                    section_alignment,
                    file_alignment,
                    major_operating_system_version,
                    minor_operating_system_version,
                    major_image_version,
                    minor_image_version,
                    major_subsystem_version,
                    minor_subsystem_version,
                    win32_version_value,
                    size_of_image,
                    size_of_headers,
                    check_sum,
                    subsystem_raw,
                    dll_characteristics_raw,
                    size_of_stack_reserve,
                    size_of_stack_commit,
                    size_of_heap_reserve,
                    size_of_heap_commit,
                    loader_flags,
                    number_of_rva_and_sizes,
                }
            }
            PeFormat::Pe32Plus => {
                let image_base = u64_at(24);
                let section_alignment = u32_at(32);
                let file_alignment = u32_at(36);
                let major_operating_system_version = u16_at(40);
                let minor_operating_system_version = u16_at(42);
                let major_image_version = u16_at(44);
                let minor_image_version = u16_at(46);
                let major_subsystem_version = u16_at(48);
                let minor_subsystem_version = u16_at(50);
                let win32_version_value = u32_at(52);
                let size_of_image = u32_at(56);
                let size_of_headers = u32_at(60);
                let check_sum = u32_at(64);
                let subsystem_raw = u16_at(68);
                let dll_characteristics_raw = u16_at(70);
                let size_of_stack_reserve = u64_at(72);
                let size_of_stack_commit = u64_at(80);
                let size_of_heap_reserve = u64_at(88);
                let size_of_heap_commit = u64_at(96);
                let loader_flags = u32_at(104);
                let number_of_rva_and_sizes = u32_at(108);

                Self {
                    format,
                    magic,
                    major_linker_version,
                    minor_linker_version,
                    size_of_code,
                    size_of_initialized_data,
                    size_of_uninitialized_data,
                    address_of_entry_point,
                    base_of_code,
                    base_of_data: None,
                    image_base,
                    section_alignment,
                    file_alignment,
                    major_operating_system_version,
                    minor_operating_system_version,
                    major_image_version,
                    minor_image_version,
                    major_subsystem_version,
                    minor_subsystem_version,
                    win32_version_value,
                    size_of_image,
                    size_of_headers,
                    check_sum,
                    subsystem_raw,
                    dll_characteristics_raw,
                    size_of_stack_reserve,
                    size_of_stack_commit,
                    size_of_heap_reserve,
                    size_of_heap_commit,
                    loader_flags,
                    number_of_rva_and_sizes,
                }
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.format.fixed_size()];
        out[0..2].copy_from_slice(&self.magic.to_le_bytes());
        out[2] = self.major_linker_version;
        out[3] = self.minor_linker_version;
        out[4..8].copy_from_slice(&self.size_of_code.to_le_bytes());
        out[8..12].copy_from_slice(&self.size_of_initialized_data.to_le_bytes());
        out[12..16].copy_from_slice(&self.size_of_uninitialized_data.to_le_bytes());
        out[16..20].copy_from_slice(&self.address_of_entry_point.to_le_bytes());
        out[20..24].copy_from_slice(&self.base_of_code.to_le_bytes());

        match self.format {
            PeFormat::Pe32 => {
                out[24..28].copy_from_slice(&self.base_of_data.unwrap_or(0).to_le_bytes());
                out[28..32].copy_from_slice(&(self.image_base as u32).to_le_bytes());
                out[32..36].copy_from_slice(&self.section_alignment.to_le_bytes());
                out[36..40].copy_from_slice(&self.file_alignment.to_le_bytes());
                out[40..42].copy_from_slice(&self.major_operating_system_version.to_le_bytes());
                out[42..44].copy_from_slice(&self.minor_operating_system_version.to_le_bytes());
                out[44..46].copy_from_slice(&self.major_image_version.to_le_bytes());
                out[46..48].copy_from_slice(&self.minor_image_version.to_le_bytes());
                out[48..50].copy_from_slice(&self.major_subsystem_version.to_le_bytes());
                out[50..52].copy_from_slice(&self.minor_subsystem_version.to_le_bytes());
                out[52..56].copy_from_slice(&self.win32_version_value.to_le_bytes());
                out[56..60].copy_from_slice(&self.size_of_image.to_le_bytes());
                out[60..64].copy_from_slice(&self.size_of_headers.to_le_bytes());
                out[64..68].copy_from_slice(&self.check_sum.to_le_bytes());
                out[68..70].copy_from_slice(&self.subsystem_raw.to_le_bytes());
                out[70..72].copy_from_slice(&self.dll_characteristics_raw.to_le_bytes());
                out[72..76].copy_from_slice(&(self.size_of_stack_reserve as u32).to_le_bytes());
                out[76..80].copy_from_slice(&(self.size_of_stack_commit as u32).to_le_bytes());
                out[80..84].copy_from_slice(&(self.size_of_heap_reserve as u32).to_le_bytes());
                out[84..88].copy_from_slice(&(self.size_of_heap_commit as u32).to_le_bytes());
                out[88..92].copy_from_slice(&self.loader_flags.to_le_bytes());
                out[92..96].copy_from_slice(&self.number_of_rva_and_sizes.to_le_bytes());
            }
            PeFormat::Pe32Plus => {
                out[24..32].copy_from_slice(&self.image_base.to_le_bytes());
                out[32..36].copy_from_slice(&self.section_alignment.to_le_bytes());
                out[36..40].copy_from_slice(&self.file_alignment.to_le_bytes());
                out[40..42].copy_from_slice(&self.major_operating_system_version.to_le_bytes());
                out[42..44].copy_from_slice(&self.minor_operating_system_version.to_le_bytes());
                out[44..46].copy_from_slice(&self.major_image_version.to_le_bytes());
                out[46..48].copy_from_slice(&self.minor_image_version.to_le_bytes());
                out[48..50].copy_from_slice(&self.major_subsystem_version.to_le_bytes());
                out[50..52].copy_from_slice(&self.minor_subsystem_version.to_le_bytes());
                out[52..56].copy_from_slice(&self.win32_version_value.to_le_bytes());
                out[56..60].copy_from_slice(&self.size_of_image.to_le_bytes());
                out[60..64].copy_from_slice(&self.size_of_headers.to_le_bytes());
                out[64..68].copy_from_slice(&self.check_sum.to_le_bytes());
                out[68..70].copy_from_slice(&self.subsystem_raw.to_le_bytes());
                out[70..72].copy_from_slice(&self.dll_characteristics_raw.to_le_bytes());
                out[72..80].copy_from_slice(&self.size_of_stack_reserve.to_le_bytes());
                out[80..88].copy_from_slice(&self.size_of_stack_commit.to_le_bytes());
                out[88..96].copy_from_slice(&self.size_of_heap_reserve.to_le_bytes());
                out[96..104].copy_from_slice(&self.size_of_heap_commit.to_le_bytes());
                out[104..108].copy_from_slice(&self.loader_flags.to_le_bytes());
                out[108..112].copy_from_slice(&self.number_of_rva_and_sizes.to_le_bytes());
            }
        }
        out
    }
}

/// Decode the optional header at `offset`, trying the PE32 layout first (to read
/// `Magic`), then re-decoding with the PE32+ layout if the magic says so. Both
/// attempts zero-pad a short-but-plausible remainder rather than failing outright,
/// matching the "Tiny PE" tolerance the real Windows loader is known to have.
pub fn decode_optional_header(view: &ByteView, offset: u64) -> Result<OptionalHeaderRecord> {
    let raw32 = read_with_padding(view, offset, PeFormat::Pe32.fixed_size(), MIN_VALID_RAW_SIZE_32)
        .ok_or(Error::MissingOptionalHeader)?;
    let probe = OptionalHeader::decode_fixed(PeFormat::Pe32, &raw32);

    match probe.magic {
        IMAGE_NT_OPTIONAL_HDR32_MAGIC => Ok(OptionalHeaderRecord {
            offset,
            original_bytes: raw32,
            value: probe,
        }),
        IMAGE_NT_OPTIONAL_HDR64_MAGIC => {
            let raw64 = read_with_padding(
                view,
                offset,
                PeFormat::Pe32Plus.fixed_size(),
                MIN_VALID_RAW_SIZE_64,
            )
            .ok_or(Error::MissingOptionalHeader)?;
            let value = OptionalHeader::decode_fixed(PeFormat::Pe32Plus, &raw64);
            Ok(OptionalHeaderRecord {
                offset,
                original_bytes: raw64,
                value,
            })
        }
        other => Err(Error::InvalidOptionalMagic(other)),
    }
}

/// Fetch exactly `want` bytes at `offset`, falling back to zero-padding the tail
/// when fewer than `want` (but at least `min_valid`) bytes remain in the buffer.
fn read_with_padding(view: &ByteView, offset: u64, want: usize, min_valid: usize) -> Option<Vec<u8>> {
    if let Ok(bytes) = view.fetch(offset, want) {
        return Some(bytes.to_vec());
    }
    let available = view.len().saturating_sub(offset as usize);
    if available < min_valid {
        return None;
    }
    let mut padded = view.fetch(offset, available).ok()?.to_vec();
    padded.resize(want.max(available) + ZERO_PAD, 0);
    padded.truncate(want);
    Some(padded)
}

/// An `OptionalHeader` plus its file offset and originally-decoded bytes, so the
/// rebuilder can locate and overwrite it. Kept outside [`crate::struct_codec::Record`]
/// because the optional header's packed size is a runtime value (96 or 112), not a
/// `Codec::SIZE` constant.
#[derive(Debug, Clone)]
pub struct OptionalHeaderRecord {
    pub offset: u64,
    pub original_bytes: Vec<u8>,
    pub value: OptionalHeader,
}

impl RebuildEntry for OptionalHeaderRecord {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode(&self) -> Vec<u8> {
        self.value.encode()
    }
}
