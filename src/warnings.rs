/// Append-only list of non-fatal diagnostic strings, in traversal order (DOS → NT →
/// sections → directories). Never consulted by later parsing decisions; `Image::warnings()`
/// is the only reader.
#[derive(Debug, Default, Clone)]
pub struct WarningLog {
    entries: Vec<String>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.entries.push(message);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
