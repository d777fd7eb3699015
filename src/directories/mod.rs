pub mod bound_import;
pub mod debug;
pub mod export;
pub mod import;
pub mod reloc;
pub mod resource;
pub mod tls;
pub mod version_info;

use crate::address_map::AddressMap;
use crate::header::data_directory::{DataDirectory, DataDirectorySlot};
use crate::struct_codec::Record;
use crate::warnings::WarningLog;

use bound_import::BoundImportDescriptor;
use debug::DebugEntry;
use export::ExportDirectory;
use import::ImportDescData;
use reloc::RelocationBlock;
use resource::ResourceDirectory;
use tls::TlsDirectory;
use version_info::VersionInfo;

/// Everything the dispatcher was able to recover from the populated data-directory
/// slots. A slot with `VirtualAddress == 0`, or whose parser failed outright, is
/// simply absent here — see each field's originating warning for why.
#[derive(Debug, Clone, Default)]
pub struct Directories {
    pub imports: Option<Vec<ImportDescData>>,
    pub delay_imports: Option<Vec<ImportDescData>>,
    pub export: Option<ExportDirectory>,
    pub resource: Option<ResourceDirectory>,
    pub version_info: Option<VersionInfo>,
    pub debug: Option<Vec<DebugEntry>>,
    pub base_relocations: Option<Vec<RelocationBlock>>,
    pub tls: Option<TlsDirectory>,
    pub bound_imports: Option<Vec<BoundImportDescriptor>>,
}

fn slot(entries: &[Record<DataDirectory>], s: DataDirectorySlot) -> Option<(u32, u32)> {
    let dd = entries.get(s as usize)?;
    if dd.value.is_present() {
        Some((dd.value.virtual_address, dd.value.size))
    } else {
        None
    }
}

/// Run every parser whose slot is populated, per the fixed slot-to-parser map (no
/// other slots are dispatched even though the optional header may carry more).
pub fn parse_data_directories(
    map: &AddressMap,
    entries: &[Record<DataDirectory>],
    is_64: bool,
    image_base: u64,
    warnings: &mut WarningLog,
) -> Directories {
    let mut out = Directories::default();

    if let Some((rva, _size)) = slot(entries, DataDirectorySlot::Import) {
        out.imports = Some(import::parse_import_directory(
            map, rva, is_64, image_base, warnings,
        ));
    }

    if let Some((rva, _size)) = slot(entries, DataDirectorySlot::DelayImport) {
        out.delay_imports = Some(import::parse_delay_import_directory(
            map, rva, is_64, image_base, warnings,
        ));
    }

    if let Some((rva, size)) = slot(entries, DataDirectorySlot::Export) {
        out.export = export::parse_export_directory(map, rva, size, warnings);
    }

    if let Some((rva, _size)) = slot(entries, DataDirectorySlot::Resource) {
        let root = resource::parse_resource_directory(map, rva, rva, warnings);
        out.version_info = resource::resolve_version_info(map, &root, warnings);
        out.resource = Some(root);
    }

    if let Some((rva, size)) = slot(entries, DataDirectorySlot::Debug) {
        out.debug = Some(debug::parse_debug_directory(map, rva, size, warnings));
    }

    if let Some((rva, size)) = slot(entries, DataDirectorySlot::BaseReloc) {
        out.base_relocations = Some(reloc::parse_base_relocations(map, rva, size, warnings));
    }

    if let Some((rva, _size)) = slot(entries, DataDirectorySlot::Tls) {
        out.tls = tls::parse_tls_directory(map, rva, is_64, image_base, warnings);
    }

    if let Some((rva, _size)) = slot(entries, DataDirectorySlot::BoundImport) {
        out.bound_imports = Some(bound_import::parse_bound_import_directory(map, rva, warnings));
    }

    out
}
