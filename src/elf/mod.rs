//! ELF32 container support. This handles the generic parts of the file: the header,
//! the section and segment tables, and the symbol table. Interpreting the debug
//! sections is done by the debug module.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The data encoding (endianness) used by every other multi-byte field.
//! * The architecture, e.g. PowerPC.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Program headers identify segments. Segments are used by the loader to map the
//! image into memory, so they're what we use to go from a virtual address to bytes
//! in the file.
//!
//! Section headers identify sections. Sections have names (stored in a string table
//! section) and that is how the debug sections are found.
pub mod elf_file;
pub mod header;
pub mod io;
pub mod primitives;
pub mod sections;
pub mod segments;
pub mod symbols;

pub use elf_file::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
pub use segments::*;
pub use symbols::*;
