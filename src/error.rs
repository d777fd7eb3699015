use thiserror::Error;

/// Fatal parse failures. Anything reaching here aborts the whole parse; everything
/// else (subtree-fatal, advisory) is folded into [`crate::warnings::WarningLog`]
/// instead of propagating.
#[derive(Debug, Error)]
pub enum Error {
    #[error("DOS header missing MZ signature")]
    InvalidDosSignature,

    #[error("e_lfanew {0:#x} is beyond the end of the buffer")]
    InvalidLfanew(u64),

    #[error("NT headers missing PE\\0\\0 signature")]
    InvalidNtSignature,

    #[error("file header could not be read")]
    MissingFileHeader,

    #[error("optional header magic {0:#06x} is neither PE32 nor PE32+")]
    InvalidOptionalMagic(u16),

    #[error("optional header is missing")]
    MissingOptionalHeader,

    #[error("{record} truncated at offset {offset:#x}")]
    TruncatedHeader { record: &'static str, offset: u64 },

    #[error("read of {len} bytes at offset {offset:#x} is out of range")]
    OutOfRange { offset: u64, len: usize },

    #[error("rva {0:#x} does not map to any section or the header")]
    UnmappedRva(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
