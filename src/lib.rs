pub mod address_map;
pub mod bytes;
pub mod directories;
pub mod error;
pub mod header;
pub mod image;
pub mod rebuild;
pub mod section;
pub mod struct_codec;
pub mod warnings;

pub use address_map::AddressMap;
pub use error::{Error, Result};
pub use image::{read_file, set_default_fast_load, Image, ParseOptions};
pub use warnings::WarningLog;
