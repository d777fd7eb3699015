use crate::struct_codec::RebuildEntry;

/// Reassembles a file image by overlaying each tracked record's re-encoded bytes onto
/// a copy of the original buffer at that record's original file offset. Anything not
/// registered here (most directory contents, which carry no mutable public surface)
/// passes through byte-for-byte unchanged.
pub struct Rebuilder<'a> {
    original: &'a [u8],
    entries: Vec<Box<dyn RebuildEntry + 'a>>,
}

impl<'a> Rebuilder<'a> {
    pub fn new(original: &'a [u8]) -> Self {
        Self {
            original,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: impl RebuildEntry + 'a) {
        self.entries.push(Box::new(entry));
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = Box<dyn RebuildEntry + 'a>>) {
        self.entries.extend(entries);
    }

    /// Overlay every registered record and return the rebuilt buffer. A record whose
    /// re-encoded length would run past the end of the buffer is skipped with no
    /// panic — the caller's `write()` never shrinks or grows the image.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.original.to_vec();
        for entry in &self.entries {
            let bytes = entry.encode();
            let offset = entry.offset() as usize;
            let end = match offset.checked_add(bytes.len()) {
                Some(end) if end <= out.len() => end,
                _ => continue,
            };
            out[offset..end].copy_from_slice(&bytes);
        }
        out
    }
}
