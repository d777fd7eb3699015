use crate::error::{Error, Result};

/// A fixed-size binary record that can be decoded from and re-encoded to exactly
/// `SIZE` bytes. Concrete header/directory structs (`DosHeader`, `FileHeader`,
/// `SectionHeader`, ...) implement this instead of a declarative field-list
/// interpreter: each field slot still carries the width + alias semantics the
/// specification describes, but expressed as ordinary named struct fields, which
/// keeps every decoder readable and keeps `rustc` checking field types for us.
pub trait Codec: Sized {
    const SIZE: usize;

    fn decode(bytes: &[u8]) -> Result<Self>;

    fn encode(&self) -> Vec<u8>;

    /// True if `bytes` (already known to be `Self::SIZE` long) is the all-zeroes
    /// sentinel used to terminate import/delay-import descriptor tables.
    fn is_all_zero(bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| b == 0)
    }
}

/// A decoded record plus the file offset it was decoded from and the bytes it was
/// decoded from, so [`crate::rebuild::Rebuilder`] can locate and overwrite it later.
#[derive(Debug, Clone)]
pub struct Record<T> {
    pub offset: u64,
    pub original_bytes: Vec<u8>,
    pub value: T,
}

impl<T: Codec + Clone> Record<T> {
    pub fn decode_at(view: &crate::bytes::ByteView, offset: u64, record_name: &'static str) -> Result<Self> {
        let bytes = view
            .fetch(offset, T::SIZE)
            .map_err(|_| Error::TruncatedHeader {
                record: record_name,
                offset,
            })?;
        let value = T::decode(bytes)?;
        Ok(Self {
            offset,
            original_bytes: bytes.to_vec(),
            value,
        })
    }

    pub fn is_all_zero(&self) -> bool {
        T::is_all_zero(&self.original_bytes)
    }
}

/// Anything the rebuilder can locate in the original byte image and overwrite with
/// freshly re-encoded bytes.
pub trait RebuildEntry {
    fn offset(&self) -> u64;
    fn encode(&self) -> Vec<u8>;
}

impl<T: Codec> RebuildEntry for Record<T> {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode(&self) -> Vec<u8> {
        self.value.encode()
    }
}

/// One storage cell shared by several field names, modeling a C union: decoding
/// binds every alias to the same initial value; each alias can then be edited
/// independently, and on encode the first alias whose value differs from the
/// originally decoded value wins (ties broken by declaration order).
#[derive(Debug, Clone)]
pub struct UnionCell<T: Copy + PartialEq> {
    original: T,
    slots: Vec<(&'static str, T)>,
}

impl<T: Copy + PartialEq> UnionCell<T> {
    pub fn new(names: &[&'static str], value: T) -> Self {
        Self {
            original: value,
            slots: names.iter().map(|&n| (n, value)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> T {
        self.slots
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap_or(self.original)
    }

    pub fn set(&mut self, name: &str, value: T) {
        if let Some(slot) = self.slots.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        }
    }

    /// The value that should be re-encoded: the first alias that diverged from the
    /// decoded original, or the original value if nothing was edited.
    pub fn resolve(&self) -> T {
        self.slots
            .iter()
            .find(|(_, v)| *v != self.original)
            .map(|(_, v)| *v)
            .unwrap_or(self.original)
    }
}
