use crate::bytes::ByteView;
use crate::error::{Error, Result};
use crate::section::Section;
use crate::warnings::WarningLog;

/// Translates between RVAs and file offsets using the section table, falling back to
/// treating the header itself as a pseudo-section rooted at file offset 0 when no
/// section claims the RVA.
pub struct AddressMap<'a, 'b> {
    view: ByteView<'a>,
    sections: &'b [Section<'a>],
    header_len: u64,
}

impl<'a, 'b> AddressMap<'a, 'b> {
    pub fn new(view: ByteView<'a>, sections: &'b [Section<'a>], header_len: u64) -> Self {
        Self {
            view,
            sections,
            header_len,
        }
    }

    /// First section whose `[VirtualAddress, VirtualAddress + len(raw_data))` range
    /// contains `rva`. Linear scan: PE images rarely carry more than a few dozen
    /// sections, and preserving file order (rather than sorting by address) matches
    /// observed loader behavior on overlapping sections.
    pub fn section_of(&self, rva: u32) -> Option<&Section<'a>> {
        self.sections.iter().find(|s| s.contains_rva(rva))
    }

    pub fn offset_of(&self, rva: u32) -> Result<u64> {
        if let Some(section) = self.section_of(rva) {
            let delta = rva - section.virtual_address();
            return Ok(section.record.value.pointer_to_raw_data as u64 + delta as u64);
        }
        if (rva as u64) < self.header_len {
            return Ok(rva as u64);
        }
        Err(Error::UnmappedRva(rva))
    }

    pub fn read_at_rva(&self, rva: u32, n: usize) -> Result<&'a [u8]> {
        let offset = self.offset_of(rva)?;
        self.view.fetch(offset, n)
    }

    pub fn ascii_at_rva(&self, rva: u32) -> Result<Vec<u8>> {
        let offset = self.offset_of(rva)?;
        self.view.ascii_cstr(offset)
    }

    pub fn utf16_at_rva(&self, rva: u32, max_units: usize) -> Result<String> {
        let offset = self.offset_of(rva)?;
        self.view.utf16_cstr(offset, max_units)
    }

    pub fn u16_at_rva(&self, rva: u32) -> Result<u16> {
        let offset = self.offset_of(rva)?;
        self.view.u16(offset)
    }

    pub fn u32_at_rva(&self, rva: u32) -> Result<u32> {
        let offset = self.offset_of(rva)?;
        self.view.u32(offset)
    }

    pub fn u64_at_rva(&self, rva: u32) -> Result<u64> {
        let offset = self.offset_of(rva)?;
        self.view.u64(offset)
    }

    /// Raw byte access at absolute file offsets, for parsers (version-info) that walk
    /// a contiguous blob by offset once its starting RVA has been translated.
    pub fn view(&self) -> ByteView<'a> {
        self.view
    }

    /// Check (and warn about, but not correct) a raw `PointerToRawData` that is not a
    /// multiple of `file_alignment`. Correction is deliberately left undone; see
    /// DESIGN.md's note on this divergence from real loader behavior.
    pub fn check_alignment(&self, warnings: &mut WarningLog, file_alignment: u32) {
        if file_alignment == 0 {
            return;
        }
        for section in self.sections {
            let ptr = section.record.value.pointer_to_raw_data;
            if ptr != 0 && ptr % file_alignment != 0 {
                warnings.push(format!(
                    "section {:?} has PointerToRawData {:#x} not aligned to FileAlignment {:#x}",
                    section.name(),
                    ptr,
                    file_alignment
                ));
            }
        }
    }
}
