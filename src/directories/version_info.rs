use crate::bytes::ByteView;
use crate::warnings::WarningLog;

const VS_VERSION_INFO_KEY: &str = "VS_VERSION_INFO";

/// `VS_FIXEDFILEINFO`, decoded in full even though most callers only ever read a
/// handful of its fields.
#[derive(Debug, Clone)]
pub struct FixedFileInfo {
    pub signature: u32,
    pub struct_version: u32,
    pub file_version_ms: u32,
    pub file_version_ls: u32,
    pub product_version_ms: u32,
    pub product_version_ls: u32,
    pub file_flags_mask: u32,
    pub file_flags: u32,
    pub file_os: u32,
    pub file_type: u32,
    pub file_subtype: u32,
    pub file_date_ms: u32,
    pub file_date_ls: u32,
}

impl FixedFileInfo {
    const SIZE: u64 = 52;

    fn decode(view: &ByteView, offset: u64) -> Option<Self> {
        let b = view.fetch(offset, Self::SIZE as usize).ok()?;
        let u32_at =
            |o: usize| u32::from_le_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]]);
        Some(Self {
            signature: u32_at(0),
            struct_version: u32_at(4),
            file_version_ms: u32_at(8),
            file_version_ls: u32_at(12),
            product_version_ms: u32_at(16),
            product_version_ls: u32_at(20),
            file_flags_mask: u32_at(24),
            file_flags: u32_at(28),
            file_os: u32_at(32),
            file_type: u32_at(36),
            file_subtype: u32_at(40),
            file_date_ms: u32_at(44),
            file_date_ls: u32_at(48),
        })
    }
}

/// One `String` entry inside a `StringTable` (`Key`/`Value`, both decoded text).
#[derive(Debug, Clone)]
pub struct StringEntry {
    pub key: String,
    pub value: String,
}

/// One `StringTable` block, keyed by an 8-hex-digit `lang,codepage` identifier.
#[derive(Debug, Clone)]
pub struct StringTable {
    pub lang_id: String,
    pub entries: Vec<StringEntry>,
}

impl StringTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

/// One `Var` entry inside a `VarFileInfo` block: a key plus a list of (lang, codepage)
/// pairs, which is all `Translation` ever actually carries in practice.
#[derive(Debug, Clone)]
pub struct VarEntry {
    pub key: String,
    pub values: Vec<(u16, u16)>,
}

/// The decoded `StringFileInfo`/`VarFileInfo` forest beneath one `VS_VERSIONINFO`.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub string_tables: Vec<StringTable>,
    pub vars: Vec<VarEntry>,
}

/// Everything decoded from one `RT_VERSION` leaf.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub key: String,
    pub fixed: Option<FixedFileInfo>,
    pub file_info: FileInfo,
}

/// Header common to every block in the `VS_VERSIONINFO` tree: `Length`, `ValueLength`,
/// `Type`, followed by a NUL-terminated UTF-16 `Key`.
struct BlockHeader {
    length: u16,
    value_length: u16,
    block_type: u16,
    key: String,
    /// Absolute file offset of the first byte after `Key` and its DWORD padding —
    /// where this block's `Value` (if any) or first child block begins.
    body_offset: u64,
}

fn align_rel(base: u64, pos: u64) -> u64 {
    let rel = pos - base;
    base + ((rel + 3) & !3)
}

fn read_block_header(view: &ByteView, offset: u64, base: u64) -> Option<BlockHeader> {
    let length = view.u16(offset).ok()?;
    let value_length = view.u16(offset + 2).ok()?;
    let block_type = view.u16(offset + 4).ok()?;
    let key = view.utf16_cstr(offset + 6, 256).ok()?;
    let key_bytes = (key.encode_utf16().count() as u64 + 1) * 2;
    let body_offset = align_rel(base, offset + 6 + key_bytes);
    Some(BlockHeader {
        length,
        value_length,
        block_type,
        key,
        body_offset,
    })
}

/// Decode the `VS_VERSIONINFO` tree rooted at file offset `base`, spanning `size` bytes.
pub fn parse_version_info(view: &ByteView, base: u64, size: u32, warnings: &mut WarningLog) -> Option<VersionInfo> {
    let root = read_block_header(view, base, base)?;
    if root.key != VS_VERSION_INFO_KEY {
        warnings.push(format!(
            "VS_VERSIONINFO key mismatch: expected VS_VERSION_INFO, found {:?}",
            root.key
        ));
        return None;
    }

    let fixed = if root.value_length > 0 {
        FixedFileInfo::decode(view, root.body_offset)
    } else {
        None
    };

    let mut cursor = align_rel(
        base,
        root.body_offset + if root.value_length > 0 { FixedFileInfo::SIZE } else { 0 },
    );
    let end = base + root.length.max(size) as u64;

    let mut file_info = FileInfo::default();

    while cursor < end {
        let child = match read_block_header(view, cursor, base) {
            Some(c) if c.length > 0 => c,
            _ => break,
        };

        if child.block_type != 1 {
            warnings.push(format!(
                "VS_VERSIONINFO child block {:?} has unexpected Type {}",
                child.key, child.block_type
            ));
        }
        match child.key.as_str() {
            "StringFileInfo" => parse_string_file_info(view, &child, cursor, base, &mut file_info, warnings),
            "VarFileInfo" => parse_var_file_info(view, &child, cursor, base, &mut file_info),
            other => {
                warnings.push(format!("unrecognized VS_VERSIONINFO child block {other:?}"));
            }
        }

        cursor = align_rel(base, cursor + child.length as u64);
    }

    Some(VersionInfo {
        key: root.key,
        fixed,
        file_info,
    })
}

fn parse_string_file_info(
    view: &ByteView,
    block: &BlockHeader,
    block_offset: u64,
    base: u64,
    out: &mut FileInfo,
    warnings: &mut WarningLog,
) {
    let end = block_offset + block.length as u64;
    let mut cursor = block.body_offset;
    while cursor < end {
        let table_header = match read_block_header(view, cursor, base) {
            Some(h) if h.length > 0 => h,
            _ => break,
        };
        let table_end = cursor + table_header.length as u64;

        let mut entries = Vec::new();
        let mut entry_cursor = table_header.body_offset;
        while entry_cursor < table_end {
            let entry_header = match read_block_header(view, entry_cursor, base) {
                Some(h) if h.length > 0 => h,
                _ => break,
            };
            let value = view
                .utf16_cstr(entry_header.body_offset, entry_header.value_length as usize)
                .unwrap_or_default();
            entries.push(StringEntry {
                key: entry_header.key.clone(),
                value,
            });
            entry_cursor = align_rel(base, entry_cursor + entry_header.length as u64);
        }

        out.string_tables.push(StringTable {
            lang_id: table_header.key.clone(),
            entries,
        });
        cursor = align_rel(base, table_end);
    }
    let _ = warnings;
}

fn parse_var_file_info(
    view: &ByteView,
    block: &BlockHeader,
    block_offset: u64,
    base: u64,
    out: &mut FileInfo,
) {
    let end = block_offset + block.length as u64;
    let mut cursor = block.body_offset;
    while cursor < end {
        let var_header = match read_block_header(view, cursor, base) {
            Some(h) if h.length > 0 => h,
            _ => break,
        };
        let pair_count = var_header.value_length as usize / 4;
        let mut values = Vec::with_capacity(pair_count);
        for i in 0..pair_count {
            let off = var_header.body_offset + i as u64 * 4;
            if let (Ok(lang), Ok(codepage)) = (view.u16(off), view.u16(off + 2)) {
                values.push((lang, codepage));
            }
        }
        out.vars.push(VarEntry {
            key: var_header.key.clone(),
            values,
        });
        cursor = align_rel(base, cursor + var_header.length as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_rel_rounds_up_to_the_next_multiple_of_four_relative_to_base() {
        assert_eq!(align_rel(100, 100), 100);
        assert_eq!(align_rel(100, 101), 104);
        assert_eq!(align_rel(100, 103), 104);
        assert_eq!(align_rel(100, 104), 104);
    }

    fn utf16_key_bytes(s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for u in s.encode_utf16() {
            out.extend_from_slice(&u.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    fn pad4(buf: &mut Vec<u8>) {
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
    }

    /// Hand-assembles a minimal VS_VERSIONINFO tree with no FixedFileInfo, a single
    /// VarFileInfo/Translation pair, and no StringFileInfo block.
    fn root_with_translation(lang: u16, codepage: u16) -> Vec<u8> {
        let mut translation_value = Vec::new();
        translation_value.extend_from_slice(&lang.to_le_bytes());
        translation_value.extend_from_slice(&codepage.to_le_bytes());

        let mut var_block = Vec::new();
        var_block.extend_from_slice(&0u16.to_le_bytes()); // Length placeholder
        var_block.extend_from_slice(&(translation_value.len() as u16).to_le_bytes());
        var_block.extend_from_slice(&0u16.to_le_bytes()); // Type: binary
        var_block.extend_from_slice(&utf16_key_bytes("Translation"));
        pad4(&mut var_block);
        var_block.extend_from_slice(&translation_value);
        let var_len = var_block.len() as u16;
        var_block[0..2].copy_from_slice(&var_len.to_le_bytes());

        let mut var_file_info = Vec::new();
        var_file_info.extend_from_slice(&0u16.to_le_bytes());
        var_file_info.extend_from_slice(&0u16.to_le_bytes());
        var_file_info.extend_from_slice(&1u16.to_le_bytes()); // Type: text
        var_file_info.extend_from_slice(&utf16_key_bytes("VarFileInfo"));
        pad4(&mut var_file_info);
        var_file_info.extend_from_slice(&var_block);
        let var_file_info_len = var_file_info.len() as u16;
        var_file_info[0..2].copy_from_slice(&var_file_info_len.to_le_bytes());

        let mut root = Vec::new();
        root.extend_from_slice(&0u16.to_le_bytes());
        root.extend_from_slice(&0u16.to_le_bytes()); // ValueLength: no FixedFileInfo
        root.extend_from_slice(&1u16.to_le_bytes());
        root.extend_from_slice(&utf16_key_bytes(VS_VERSION_INFO_KEY));
        pad4(&mut root);
        root.extend_from_slice(&var_file_info);
        let root_len = root.len() as u16;
        root[0..2].copy_from_slice(&root_len.to_le_bytes());
        root
    }

    #[test]
    fn var_file_info_translation_pair_is_decoded() {
        let buf = root_with_translation(0x0409, 0x04B0);
        let view = ByteView::new(&buf);
        let mut warnings = WarningLog::new();
        let info = parse_version_info(&view, 0, buf.len() as u32, &mut warnings).unwrap();
        assert!(info.fixed.is_none());
        assert_eq!(info.file_info.vars.len(), 1);
        assert_eq!(info.file_info.vars[0].key, "Translation");
        assert_eq!(info.file_info.vars[0].values, vec![(0x0409, 0x04B0)]);
    }
}
