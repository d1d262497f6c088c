//! Errors reported while loading an image and decoding its debug sections.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A read past the end of the bytes backing a [`crate::elf::Stream`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("read of {size} bytes at offset {offset:#x} is out of bounds")]
    OutOfBounds { offset: usize, size: usize },
}

/// Failures that prevent an ELF image from being loaded at all.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The path couldn't be opened or mapped.
    #[error("couldn't open {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file ended before a header or table did.
    #[error("couldn't read ELF data: {0}")]
    ReadFailed(String),

    /// The file isn't an ELF32 image we can interpret.
    #[error("invalid ELF header: {0}")]
    InvalidHeader(String),
}

impl From<StreamError> for ImageError {
    fn from(err: StreamError) -> Self {
        ImageError::ReadFailed(err.to_string())
    }
}

/// Failures while decoding the `.debug` and `.line` sections.
#[derive(Debug, Error)]
pub enum DebugError {
    /// Not fatal: the image simply has no debug information.
    #[error("no {0} section")]
    SectionNotFound(&'static str),

    #[error("debug data is truncated: {0}")]
    Truncated(#[from] StreamError),

    #[error("record at offset {offset:#x} claims {length} bytes but the section ends at {end:#x}")]
    RecordOverrun { offset: usize, length: u32, end: usize },

    #[error("attribute {name:#x} at offset {offset:#x} has unknown form {form}")]
    UnknownForm { name: u16, offset: usize, form: u16 },

    #[error("line table at offset {offset:#x} has bad length {length}")]
    BadLineTable { offset: usize, length: u32 },
}

/// Failures while interpreting a compound attribute payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("unknown attribute form {0}")]
    UnknownForm(u16),

    #[error("unknown subscript format {0:#x}")]
    UnknownSubscriptFormat(u8),

    #[error("expected {expected} but found a {found} payload")]
    WrongForm {
        expected: &'static str,
        found: &'static str,
    },
}

/// Failures reported by a [`crate::disasm::Disassembler`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DisassemblyError {
    #[error("no disassembler for machine {0}")]
    Unsupported(u16),

    #[error("address range {start:#x}..{end:#x} isn't mapped")]
    Unmapped { start: u32, end: u32 },
}
