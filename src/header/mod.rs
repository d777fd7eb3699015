pub mod characteristics;
pub mod data_directory;
pub mod dll_characteristics;
pub mod dos;
pub mod file_header;
pub mod machine_types;
pub mod optional_header;
pub mod section_header;
pub mod win_subsystem;

use crate::bytes::ByteView;
use crate::error::{Error, Result};
use crate::struct_codec::{Codec, Record};
use crate::warnings::WarningLog;
use data_directory::DataDirectory;
use dos::DosHeader;
use file_header::FileHeader;
use optional_header::{decode_optional_header, OptionalHeaderRecord};
use section_header::SectionHeader;

/// Correct value of the NT signature dword, `"PE\0\0"` read little-endian.
pub const IMAGE_NT_SIGNATURE: u32 = 0x0000_4550;

/// Everything `HeaderParser` recovers: DOS stub, NT/file/optional headers, the data
/// directory array, and the byte range the header itself occupies.
#[derive(Debug, Clone)]
pub struct Headers {
    pub dos_header: Record<DosHeader>,
    pub nt_signature_offset: u64,
    pub nt_signature: u32,
    pub file_header: Record<FileHeader>,
    pub optional_header: OptionalHeaderRecord,
    pub data_directories: Vec<Record<DataDirectory>>,
    pub sections_offset: u64,
    pub header_len: u64,
}

/// Decode DOS header → NT signature → file header → optional header → data
/// directories, in that fixed order (mirrors §4.3 of the PE core specification).
/// Returns the offset at which the section table begins so the caller can hand it to
/// [`crate::section::parse_sections`].
pub fn parse_headers(view: &ByteView, warnings: &mut WarningLog) -> Result<Headers> {
    let dos_header = Record::<DosHeader>::decode_at(view, 0, "DOS_HEADER")
        .map_err(|_| Error::InvalidDosSignature)?;
    if dos_header.value.e_magic != dos::IMAGE_DOS_SIGNATURE {
        return Err(Error::InvalidDosSignature);
    }

    let e_lfanew = dos_header.value.e_lfanew as u64;
    if e_lfanew > view.len() as u64 {
        return Err(Error::InvalidLfanew(e_lfanew));
    }

    let nt_signature_offset = e_lfanew;
    let nt_signature = view
        .u32(nt_signature_offset)
        .map_err(|_| Error::InvalidNtSignature)?;
    if nt_signature != IMAGE_NT_SIGNATURE {
        return Err(Error::InvalidNtSignature);
    }

    let file_header_offset = nt_signature_offset + 4;
    let file_header = Record::<FileHeader>::decode_at(view, file_header_offset, "FILE_HEADER")
        .map_err(|_| Error::MissingFileHeader)?;

    let optional_header_offset = file_header_offset + FileHeader::SIZE as u64;
    let optional_header = decode_optional_header(view, optional_header_offset)?;

    let mut data_directories = Vec::new();
    {
        let opt = &optional_header;
        let raw_count = opt.value.number_of_rva_and_sizes;
        if raw_count > 16 {
            warnings.push(format!(
                "NumberOfRvaAndSizes {raw_count} exceeds 16; clamping"
            ));
        }
        let count = (raw_count & 0x7fff_ffff).min(16);
        let dd_start = optional_header_offset + opt.value.format.fixed_size() as u64;
        let dd_end_bound = dd_start + 8 * 16;
        for i in 0..count as u64 {
            let entry_offset = dd_start + i * DataDirectory::SIZE as u64;
            if entry_offset + DataDirectory::SIZE as u64 > dd_end_bound {
                break;
            }
            match Record::<DataDirectory>::decode_at(view, entry_offset, "IMAGE_DATA_DIRECTORY") {
                Ok(record) => data_directories.push(record),
                Err(_) => {
                    warnings.push(format!("data directory array truncated after {i} entries"));
                    break;
                }
            }
        }
    }

    let sections_offset = optional_header_offset + file_header.value.size_of_optional_header as u64;

    let end_of_section_table =
        sections_offset + file_header.value.number_of_sections as u64 * SectionHeader::SIZE as u64;

    Ok(Headers {
        dos_header,
        nt_signature_offset,
        nt_signature,
        file_header,
        optional_header,
        data_directories,
        sections_offset,
        header_len: end_of_section_table,
    })
}

/// Finalize the header byte range now that sections are decoded: `min(end of section
/// table, smallest nonzero PointerToRawData)`.
pub fn finalize_header_len(end_of_section_table: u64, sections: &[crate::section::Section]) -> u64 {
    let min_nonzero = sections
        .iter()
        .map(|s| s.record.value.pointer_to_raw_data as u64)
        .filter(|&p| p != 0)
        .min();
    match min_nonzero {
        Some(p) => end_of_section_table.min(p),
        None => end_of_section_table,
    }
}
