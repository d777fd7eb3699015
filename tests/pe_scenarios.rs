//! End-to-end scenarios driven by hand-assembled PE32/PE32+ buffers. No fixture
//! binaries: every buffer below is built byte-by-byte by `builder::PeBuilder` so the
//! six cases exercise exactly the fields under test.

use pecore::{Image, ParseOptions};

mod builder {
    pub const FILE_ALIGNMENT: u32 = 0x200;
    pub const SECTION_ALIGNMENT: u32 = 0x1000;

    pub struct SectionSpec {
        pub name: &'static str,
        pub virtual_address: u32,
        pub virtual_size: u32,
        pub characteristics: u32,
        pub data: Vec<u8>,
    }

    pub struct PeBuilder {
        pub is_64: bool,
        pub image_base: u64,
        pub sections: Vec<SectionSpec>,
        pub data_directories: [(u32, u32); 16],
        pub characteristics: u16,
        pub number_of_rva_and_sizes_override: Option<u32>,
    }

    impl PeBuilder {
        pub fn new(is_64: bool) -> Self {
            Self {
                is_64,
                image_base: if is_64 { 0x1_4000_0000 } else { 0x0040_0000 },
                sections: Vec::new(),
                data_directories: [(0, 0); 16],
                characteristics: 0x0102,
                number_of_rva_and_sizes_override: None,
            }
        }

        pub fn section(mut self, spec: SectionSpec) -> Self {
            self.sections.push(spec);
            self
        }

        pub fn directory(mut self, slot: usize, rva: u32, size: u32) -> Self {
            self.data_directories[slot] = (rva, size);
            self
        }

        pub fn number_of_rva_and_sizes(mut self, value: u32) -> Self {
            self.number_of_rva_and_sizes_override = Some(value);
            self
        }

        fn align_up(v: u32, align: u32) -> u32 {
            if align == 0 {
                v
            } else {
                (v + align - 1) / align * align
            }
        }

        pub fn build(&self) -> Vec<u8> {
            let optional_header_fixed = if self.is_64 { 112usize } else { 96usize };
            let num_sections = self.sections.len() as u16;
            let header_size_unaligned =
                64 + 4 + 20 + optional_header_fixed as u32 + 16 * 8 + num_sections as u32 * 40;
            let header_size = Self::align_up(header_size_unaligned, FILE_ALIGNMENT);

            let mut file_offsets = Vec::with_capacity(self.sections.len());
            let mut cur = header_size;
            for s in &self.sections {
                file_offsets.push(cur);
                cur += Self::align_up(s.data.len() as u32, FILE_ALIGNMENT);
            }
            let total_size = cur.max(header_size);

            let mut out = vec![0u8; total_size as usize];

            out[0..2].copy_from_slice(&0x5A4Du16.to_le_bytes());
            let e_lfanew: u32 = 64;
            out[0x3C..0x40].copy_from_slice(&e_lfanew.to_le_bytes());

            let nt_off = e_lfanew as usize;
            out[nt_off..nt_off + 4].copy_from_slice(&0x0000_4550u32.to_le_bytes());

            let fh_off = nt_off + 4;
            let machine: u16 = if self.is_64 { 0x8664 } else { 0x014c };
            out[fh_off..fh_off + 2].copy_from_slice(&machine.to_le_bytes());
            out[fh_off + 2..fh_off + 4].copy_from_slice(&num_sections.to_le_bytes());
            let size_of_optional_header = (optional_header_fixed + 16 * 8) as u16;
            out[fh_off + 16..fh_off + 18].copy_from_slice(&size_of_optional_header.to_le_bytes());
            out[fh_off + 18..fh_off + 20].copy_from_slice(&self.characteristics.to_le_bytes());

            let oh_off = fh_off + 20;
            let magic: u16 = if self.is_64 { 0x20b } else { 0x10b };
            out[oh_off..oh_off + 2].copy_from_slice(&magic.to_le_bytes());
            out[oh_off + 16..oh_off + 20].copy_from_slice(&0u32.to_le_bytes());

            if self.is_64 {
                out[oh_off + 24..oh_off + 32].copy_from_slice(&self.image_base.to_le_bytes());
            } else {
                out[oh_off + 24..oh_off + 28].copy_from_slice(&0u32.to_le_bytes());
                out[oh_off + 28..oh_off + 32]
                    .copy_from_slice(&(self.image_base as u32).to_le_bytes());
            }

            out[oh_off + 32..oh_off + 36].copy_from_slice(&SECTION_ALIGNMENT.to_le_bytes());
            out[oh_off + 36..oh_off + 40].copy_from_slice(&FILE_ALIGNMENT.to_le_bytes());

            let size_of_image = if let Some(last) = self.sections.last() {
                Self::align_up(
                    last.virtual_address + last.virtual_size,
                    SECTION_ALIGNMENT,
                )
            } else {
                SECTION_ALIGNMENT
            };
            out[oh_off + 56..oh_off + 60].copy_from_slice(&size_of_image.to_le_bytes());
            out[oh_off + 60..oh_off + 64].copy_from_slice(&header_size.to_le_bytes());

            let number_of_rva_and_sizes = self.number_of_rva_and_sizes_override.unwrap_or(16);
            let nrs_off = oh_off + optional_header_fixed - 4;
            out[nrs_off..nrs_off + 4].copy_from_slice(&number_of_rva_and_sizes.to_le_bytes());

            let dd_off = oh_off + optional_header_fixed;
            for (i, (rva, size)) in self.data_directories.iter().enumerate() {
                let o = dd_off + i * 8;
                out[o..o + 4].copy_from_slice(&rva.to_le_bytes());
                out[o + 4..o + 8].copy_from_slice(&size.to_le_bytes());
            }

            let sh_off = dd_off + 16 * 8;
            for (i, s) in self.sections.iter().enumerate() {
                let o = sh_off + i * 40;
                let mut name = [0u8; 8];
                let bytes = s.name.as_bytes();
                let n = bytes.len().min(8);
                name[..n].copy_from_slice(&bytes[..n]);
                out[o..o + 8].copy_from_slice(&name);
                out[o + 8..o + 12].copy_from_slice(&s.virtual_size.to_le_bytes());
                out[o + 12..o + 16].copy_from_slice(&s.virtual_address.to_le_bytes());
                let raw_len = Self::align_up(s.data.len() as u32, FILE_ALIGNMENT);
                out[o + 16..o + 20].copy_from_slice(&raw_len.to_le_bytes());
                out[o + 20..o + 24].copy_from_slice(&file_offsets[i].to_le_bytes());
                out[o + 36..o + 40].copy_from_slice(&s.characteristics.to_le_bytes());
            }

            for (i, s) in self.sections.iter().enumerate() {
                let start = file_offsets[i] as usize;
                out[start..start + s.data.len()].copy_from_slice(&s.data);
            }

            out
        }
    }

    /// One block of a `VS_VERSIONINFO` tree: `Length`/`ValueLength`/`Type`/`Key`, an
    /// optional fixed value, and pre-aligned child bytes.
    pub struct VersionBlock {
        pub key: &'static str,
        pub value_length: u16,
        pub block_type: u16,
        pub value: Vec<u8>,
        pub children: Vec<u8>,
    }

    impl VersionBlock {
        pub fn encode(&self) -> Vec<u8> {
            let key_bytes = utf16_key(self.key);
            let head_len = 6 + key_bytes.len();
            let pad = (4 - (head_len % 4)) % 4;
            let mut out = Vec::new();
            let total_len = head_len + pad + self.value.len() + self.children.len();
            out.extend_from_slice(&(total_len as u16).to_le_bytes());
            out.extend_from_slice(&self.value_length.to_le_bytes());
            out.extend_from_slice(&self.block_type.to_le_bytes());
            out.extend_from_slice(&key_bytes);
            out.resize(out.len() + pad, 0);
            out.extend_from_slice(&self.value);
            out.extend_from_slice(&self.children);
            out
        }
    }

    pub fn utf16_key(s: &str) -> Vec<u8> {
        let mut v: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        v.extend_from_slice(&0u16.to_le_bytes());
        v
    }

    /// Append `bytes` then pad the buffer to the next 4-byte boundary, matching the
    /// gap the decoder skips via its own `align_rel` advance between siblings.
    pub fn append_aligned(buf: &mut Vec<u8>, bytes: &[u8]) {
        buf.extend_from_slice(bytes);
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
    }

    pub fn fixed_file_info_bytes(file_version: (u16, u16, u16, u16)) -> Vec<u8> {
        let (a, b, c, d) = file_version;
        let ms = ((a as u32) << 16) | b as u32;
        let ls = ((c as u32) << 16) | d as u32;
        let mut out = vec![0u8; 52];
        out[0..4].copy_from_slice(&0xFEEF_04BDu32.to_le_bytes());
        out[4..8].copy_from_slice(&1u32.to_le_bytes());
        out[8..12].copy_from_slice(&ms.to_le_bytes());
        out[12..16].copy_from_slice(&ls.to_le_bytes());
        out[16..20].copy_from_slice(&ms.to_le_bytes());
        out[20..24].copy_from_slice(&ls.to_le_bytes());
        out
    }
}

use builder::{append_aligned, fixed_file_info_bytes, utf16_key, PeBuilder, SectionSpec, VersionBlock};

const RT_VERSION: u32 = 16;
const DATA_IS_DIRECTORY: u32 = 0x8000_0000;
const ORDINAL_FLAG32: u32 = 0x8000_0000;

fn put_ascii(buf: &mut [u8], at: usize, s: &str) {
    buf[at..at + s.len()].copy_from_slice(s.as_bytes());
    buf[at + s.len()] = 0;
}

/// Makes the crate's `log::warn!`/`log::trace!` output visible under `--nocapture`;
/// harmless if a previous test in this binary already installed the logger.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn minimal_valid_pe32_dll() {
    init_logging();
    let bytes = PeBuilder::new(false).build();
    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    assert_eq!(image.headers.optional_header.value.magic, 0x10b);
    assert!(image.sections.is_empty());
    assert!(image.directories.imports.is_none());
    assert!(image.warnings().is_empty());
}

#[test]
fn import_by_name_and_ordinal() {
    init_logging();
    const IMPORT_RVA: u32 = 0x2000;
    let mut data = vec![0u8; 200];

    let ilt_rva = IMPORT_RVA + 40;
    let iat_rva = IMPORT_RVA + 60;
    let name_rva = IMPORT_RVA + 100;
    let hint_name_rva = IMPORT_RVA + 120;

    // IMAGE_IMPORT_DESCRIPTOR
    data[0..4].copy_from_slice(&ilt_rva.to_le_bytes());
    data[12..16].copy_from_slice(&name_rva.to_le_bytes());
    data[16..20].copy_from_slice(&iat_rva.to_le_bytes());
    // bytes 20..40 stay zero: terminating descriptor

    // ILT: named thunk, ordinal thunk, zero terminator
    data[40..44].copy_from_slice(&hint_name_rva.to_le_bytes());
    data[44..48].copy_from_slice(&(ORDINAL_FLAG32 | 5).to_le_bytes());

    // IAT mirrors ILT exactly (no binding in this scenario)
    data[60..64].copy_from_slice(&hint_name_rva.to_le_bytes());
    data[64..68].copy_from_slice(&(ORDINAL_FLAG32 | 5).to_le_bytes());

    put_ascii(&mut data, 100, "KERNEL32.DLL");
    // Hint (u16) = 0, then name
    put_ascii(&mut data, 122, "FunctionA");

    let bytes = PeBuilder::new(false)
        .section(SectionSpec {
            name: ".idata",
            virtual_address: IMPORT_RVA,
            virtual_size: data.len() as u32,
            characteristics: 0x4000_0040,
            data,
        })
        .directory(1, IMPORT_RVA, 40)
        .build();

    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    let imports = image.directories.imports.expect("imports present");
    assert_eq!(imports.len(), 1);
    let desc = &imports[0];
    assert_eq!(desc.dll_lossy(), "KERNEL32.DLL");
    assert_eq!(desc.entries.len(), 2);

    let named = &desc.entries[0];
    assert_eq!(named.name_lossy(), Some("FunctionA".to_string()));
    assert_eq!(named.hint, Some(0));
    assert!(named.ordinal.is_none());
    assert!(named.bound.is_none());

    let ordinal = &desc.entries[1];
    assert_eq!(ordinal.ordinal, Some(5));
    assert!(ordinal.name.is_none());
}

#[test]
fn bound_imports_with_divergent_iat() {
    init_logging();
    const IMPORT_RVA: u32 = 0x2000;
    let mut data = vec![0u8; 400];

    let ilt_rva = IMPORT_RVA + 200;
    let iat_rva = IMPORT_RVA + 220;
    let name_rva = IMPORT_RVA + 300;
    let hint_name_rva = IMPORT_RVA + 320;
    let bound_address: u64 = 0x0000_0001_4000_5000;

    data[0..4].copy_from_slice(&ilt_rva.to_le_bytes());
    data[12..16].copy_from_slice(&name_rva.to_le_bytes());
    data[16..20].copy_from_slice(&iat_rva.to_le_bytes());

    data[200..208].copy_from_slice(&(hint_name_rva as u64).to_le_bytes());
    // 208..216 stays zero: ILT terminator

    data[220..228].copy_from_slice(&bound_address.to_le_bytes());
    // 228..236 stays zero: IAT terminator

    put_ascii(&mut data, 300, "USER32.dll");
    put_ascii(&mut data, 322, "MessageBoxA");

    let bytes = PeBuilder::new(true)
        .section(SectionSpec {
            name: ".idata",
            virtual_address: IMPORT_RVA,
            virtual_size: data.len() as u32,
            characteristics: 0x4000_0040,
            data,
        })
        .directory(1, IMPORT_RVA, 20)
        .build();

    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    let imports = image.directories.imports.expect("imports present");
    assert_eq!(imports.len(), 1);
    let entry = &imports[0].entries[0];
    assert_eq!(entry.name_lossy(), Some("MessageBoxA".to_string()));
    assert_eq!(entry.bound, Some(bound_address));
}

#[test]
fn rt_version_resource_with_string_table_entry() {
    init_logging();
    const RSRC_RVA: u32 = 0x4000;

    let string_entry = VersionBlock {
        key: "ProductName",
        value_length: "Acme".encode_utf16().count() as u16 + 1,
        block_type: 1,
        value: utf16_key("Acme"),
        children: vec![],
    }
    .encode();
    let mut string_table_children = Vec::new();
    append_aligned(&mut string_table_children, &string_entry);

    let string_table = VersionBlock {
        key: "040904B0",
        value_length: 0,
        block_type: 1,
        value: vec![],
        children: string_table_children,
    }
    .encode();
    let mut string_file_info_children = Vec::new();
    append_aligned(&mut string_file_info_children, &string_table);

    let string_file_info = VersionBlock {
        key: "StringFileInfo",
        value_length: 0,
        block_type: 1,
        value: vec![],
        children: string_file_info_children,
    }
    .encode();
    let mut root_children = Vec::new();
    append_aligned(&mut root_children, &string_file_info);

    let fixed = fixed_file_info_bytes((1, 0, 0, 1));
    let root = VersionBlock {
        key: "VS_VERSION_INFO",
        value_length: fixed.len() as u16,
        block_type: 0,
        value: fixed,
        children: root_children,
    }
    .encode();

    let blob_offset: u32 = 96;
    let mut data = vec![0u8; blob_offset as usize + root.len()];

    // Top-level directory: one id entry (RT_VERSION) -> id-level directory.
    data[12..14].copy_from_slice(&0u16.to_le_bytes()); // number_of_named_entries
    data[14..16].copy_from_slice(&1u16.to_le_bytes()); // number_of_id_entries
    data[16..20].copy_from_slice(&RT_VERSION.to_le_bytes());
    data[20..24].copy_from_slice(&(24u32 | DATA_IS_DIRECTORY).to_le_bytes());

    // Id-level directory at +24: one id entry (language-neutral id 1) -> lang-level directory.
    data[24 + 14..24 + 16].copy_from_slice(&1u16.to_le_bytes());
    data[24 + 16..24 + 20].copy_from_slice(&1u32.to_le_bytes());
    data[24 + 20..24 + 24].copy_from_slice(&(48u32 | DATA_IS_DIRECTORY).to_le_bytes());

    // Lang-level directory at +48: one id entry (lang 0x0409) -> leaf data entry.
    data[48 + 14..48 + 16].copy_from_slice(&1u16.to_le_bytes());
    data[48 + 16..48 + 20].copy_from_slice(&0x0409u32.to_le_bytes());
    data[48 + 20..48 + 24].copy_from_slice(&72u32.to_le_bytes());

    // Leaf IMAGE_RESOURCE_DATA_ENTRY at +72: OffsetToData is an absolute RVA.
    let blob_rva = RSRC_RVA + blob_offset;
    data[72..76].copy_from_slice(&blob_rva.to_le_bytes());
    data[76..80].copy_from_slice(&(root.len() as u32).to_le_bytes());

    data[blob_offset as usize..blob_offset as usize + root.len()].copy_from_slice(&root);

    let bytes = PeBuilder::new(false)
        .section(SectionSpec {
            name: ".rsrc",
            virtual_address: RSRC_RVA,
            virtual_size: data.len() as u32,
            characteristics: 0x4000_0040,
            data,
        })
        .directory(2, RSRC_RVA, 1000)
        .build();

    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    let version = image.directories.version_info.expect("version info resolved");
    assert_eq!(version.key, "VS_VERSION_INFO");
    assert!(version.fixed.is_some());

    let table = version
        .file_info
        .string_tables
        .iter()
        .find(|t| t.lang_id == "040904B0")
        .expect("string table present");
    assert_eq!(table.get("ProductName"), Some("Acme"));
}

#[test]
fn self_referential_resource_directory_stops_cleanly() {
    init_logging();
    const RSRC_RVA: u32 = 0x5000;
    let mut data = vec![0u8; 24];
    data[14..16].copy_from_slice(&1u16.to_le_bytes());
    data[16..20].copy_from_slice(&1u32.to_le_bytes());
    // Points back at this same directory's own rva (base_rva + 0 == rva).
    data[20..24].copy_from_slice(&DATA_IS_DIRECTORY.to_le_bytes());

    let bytes = PeBuilder::new(false)
        .section(SectionSpec {
            name: ".rsrc",
            virtual_address: RSRC_RVA,
            virtual_size: data.len() as u32,
            characteristics: 0x4000_0040,
            data,
        })
        .directory(2, RSRC_RVA, 24)
        .build();

    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    let root = image.directories.resource.expect("resource tree present");
    assert!(root.entries.is_empty());
}

#[test]
fn number_of_rva_and_sizes_beyond_sixteen_is_clamped_with_warning() {
    init_logging();
    let bytes = PeBuilder::new(false).number_of_rva_and_sizes(0x200).build();
    let image = Image::parse(&bytes, ParseOptions { fast_load: false }).expect("parse");
    assert_eq!(image.headers.data_directories.len(), 16);
    assert!(image.warnings().iter().any(|w| w.contains("clamping")));
}
