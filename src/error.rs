use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while resolving addresses or touching images.
#[derive(Error, Debug)]
pub enum CalibError {
    #[error("couldn't open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is too small for an ELF header ({size} bytes)")]
    TruncatedHeader { size: usize },

    #[error("not an ELF file (bad magic)")]
    NotElf,

    #[error("unsupported ELF class {0}: only 32-bit files are supported")]
    UnsupportedClass(u8),

    #[error("program or section header table extends past the end of the file")]
    InvalidHeaderOffsets,

    #[error("section name string table is outside the file")]
    InvalidStringTable,

    #[error("address 0x{0:x} isn't in any section")]
    AddressNotMapped(u32),

    #[error("offset 0x{offset:x} is past the end of the file")]
    ReadBounds { offset: u64, len: usize },

    #[error("wanted {wanted} bytes at offset 0x{offset:x} but only {available} are available")]
    ShortRead {
        offset: u64,
        wanted: usize,
        available: usize,
    },

    #[error("no data object named `{0}` in the symbol table")]
    UnknownSymbol(String),

    #[error("invalid image index: {0}")]
    InvalidImageIndex(usize),

    #[error("invalid symbol index: {0}")]
    InvalidSymbolIndex(usize),

    #[error("image has no data at address 0x{0:x}")]
    UnmappedImageAddress(u32),

    #[error("bad Intel HEX on line {line}: {reason}")]
    ImageFormat { line: usize, reason: String },

    #[error("expected {expected} bytes but got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("can't use `{text}` as {expected}")]
    InvalidValue { text: String, expected: String },

    #[error("type {0} can't be read or written as a single value")]
    NotValueAddressable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CalibError>;
