use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::address_map::AddressMap;
use crate::bytes::ByteView;
use crate::directories::{self, Directories};
use crate::error::Result;
use crate::header::{self, Headers};
use crate::rebuild::Rebuilder;
use crate::section::{self, Section};
use crate::warnings::WarningLog;

/// Module-level default for [`ParseOptions::fast_load`], read once at construction
/// and overridable per-call. `Relaxed` is sufficient: this is a coarse default, not a
/// synchronization point between threads that also mutate decoded fields.
static DEFAULT_FAST_LOAD: AtomicBool = AtomicBool::new(false);

/// Override the process-wide default for `fast_load` on [`ParseOptions::default`].
pub fn set_default_fast_load(value: bool) {
    DEFAULT_FAST_LOAD.store(value, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// When true, directory parsing is deferred until [`Image::full_load`] is called.
    pub fast_load: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            fast_load: DEFAULT_FAST_LOAD.load(Ordering::Relaxed),
        }
    }
}

/// Read a file fully into memory. A thin wrapper kept separate from [`Image::parse`]
/// so the parsed tree's lifetime is always tied to a buffer the caller already owns —
/// avoids a self-referential `Image` that owns its own bytes.
pub fn read_file(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Root handle over a parsed PE image. Borrows the byte buffer for its entire
/// lifetime; all decoded sections and directory contents are derived from (and some
/// borrow directly from) that same buffer.
pub struct Image<'a> {
    raw: &'a [u8],
    pub headers: Headers,
    pub sections: Vec<Section<'a>>,
    pub directories: Directories,
    warnings: WarningLog,
    is_64: bool,
    image_base: u64,
    fast_load: bool,
    loaded: bool,
}

impl<'a> Image<'a> {
    /// Parse `bytes` per [`ParseOptions`]. Runs header and section parsing
    /// unconditionally; directory parsing runs immediately unless `fast_load` is set,
    /// in which case it is deferred until [`Image::full_load`].
    pub fn parse(bytes: &'a [u8], options: ParseOptions) -> Result<Self> {
        let view = ByteView::new(bytes);
        let mut warnings = WarningLog::new();

        let mut headers = header::parse_headers(&view, &mut warnings)?;
        let sections = section::parse_sections(
            &view,
            headers.sections_offset,
            headers.file_header.value.number_of_sections,
            &mut warnings,
        );
        headers.header_len = header::finalize_header_len(headers.header_len, &sections);

        let is_64 = headers.optional_header.value.format == header::optional_header::PeFormat::Pe32Plus;
        let image_base = headers.optional_header.value.image_base;

        {
            let map = AddressMap::new(view, &sections, headers.header_len);
            map.check_alignment(&mut warnings, headers.optional_header.value.file_alignment);
        }

        let mut image = Self {
            raw: bytes,
            headers,
            sections,
            directories: Directories::default(),
            warnings,
            is_64,
            image_base,
            fast_load: options.fast_load,
            loaded: false,
        };

        if !image.fast_load {
            image.full_load();
        }

        Ok(image)
    }

    /// Run the data-directory dispatcher. Idempotent: a second call is a no-op,
    /// matching the deferred-loading contract in [`ParseOptions::fast_load`].
    pub fn full_load(&mut self) {
        if self.loaded {
            return;
        }
        let view = ByteView::new(self.raw);
        let map = AddressMap::new(view, &self.sections, self.headers.header_len);
        self.directories = directories::parse_data_directories(
            &map,
            &self.headers.data_directories,
            self.is_64,
            self.image_base,
            &mut self.warnings,
        );
        self.loaded = true;
    }

    pub fn warnings(&self) -> &[String] {
        self.warnings.as_slice()
    }

    pub fn header(&self) -> Result<&'a [u8]> {
        self.raw
            .get(..self.headers.header_len as usize)
            .ok_or(crate::error::Error::OutOfRange {
                offset: 0,
                len: self.headers.header_len as usize,
            })
    }

    /// Rebuild the file image from decoded records plus the unchanged remainder.
    pub fn write(&self) -> Vec<u8> {
        let mut rebuilder = Rebuilder::new(self.raw);
        rebuilder.push(self.headers.dos_header.clone());
        rebuilder.push(self.headers.file_header.clone());
        rebuilder.push(self.headers.optional_header.clone());
        for dd in &self.headers.data_directories {
            rebuilder.push(dd.clone());
        }
        for section in &self.sections {
            rebuilder.push(section.record.clone());
        }
        rebuilder.build()
    }

    /// Rebuild and write the result to `path`, returning the same bytes [`Image::write`]
    /// would have produced.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
        let bytes = self.write();
        std::fs::write(path, &bytes)?;
        Ok(bytes)
    }
}
