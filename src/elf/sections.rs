//! Used by the linker and debugger. Also see segments.
use super::{Reader, Stream};
use crate::elf::{Bytes, Offset, VirtualAddr};
use crate::error::ImageError;

const WRITE_FLAG: u32 = 1 << 0; // Writable
const ALLOC_FLAG: u32 = 1 << 1; // Occupies memory during execution
const EXECINSTR_FLAG: u32 = 1 << 2; // Executable
const MERGE_FLAG: u32 = 1 << 4; // Might be merged
const STRINGS_FLAG: u32 = 1 << 5; // Contains nul-terminated strings
const INFO_LINK_FLAG: u32 = 1 << 6; // `sh_info' contains SHT index
const LINK_ORDER_FLAG: u32 = 1 << 7; // Preserve order after combining
const GROUP_FLAG: u32 = 1 << 9; // Section is member of a group
const TLS_FLAG: u32 = 1 << 10; // Section hold thread-local data
const MASKPROC_FLAG: u32 = 0xf0000000; // Processor-specific

/// Describes a section (Elf32_Shdr).
#[derive(Clone, Debug)]
pub struct SectionHeader {
    /// Resolved using the section name string table, empty if there is no name.
    pub name: String,

    /// Type of the section.
    pub stype: SectionType,

    /// Write, alloc, and/or exec.
    pub flags: u32,

    /// Addressing for the bytes in the section using offsets from the start of the ELF file.
    pub obytes: Bytes<Offset>,

    /// Addressing for the bytes in the section once loaded. Zero for sections that
    /// aren't loaded, e.g. the debug sections.
    pub vbytes: Bytes<VirtualAddr>,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    /// Section alignment.
    pub align: u32,

    /// Set if the section holds a table of entries.
    pub entry_size: u32,

    pub(super) name_index: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    /// Dynamic linking information.
    Dynamic,

    // Dynamic linker symbol table.
    DynamicSymbolTable,

    /// Symbol hash table.
    Hash,

    /// Uninitialized data.
    NoBits,

    /// Arbitrary metadata.
    Note,

    /// Not to be used.
    Null,

    /// CPU instructions, constant data, and debug sections.
    ProgBits,

    /// Relocation entries with addends.
    RelocationsWith,

    /// Relocation entries without addends.
    RelocationsWithout,

    /// Strings for use by the linker and debugger.
    StringTable,

    /// The static symbol table.
    SymbolTable,

    /// Processor, OS or user specific types.
    Other(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0 => SectionType::Null,
            0x1 => SectionType::ProgBits,
            0x2 => SectionType::SymbolTable,
            0x3 => SectionType::StringTable,
            0x4 => SectionType::RelocationsWith,
            0x5 => SectionType::Hash,
            0x6 => SectionType::Dynamic,
            0x7 => SectionType::Note,
            0x8 => SectionType::NoBits,
            0x9 => SectionType::RelocationsWithout,
            0xb => SectionType::DynamicSymbolTable,
            _ => SectionType::Other(value),
        }
    }
}

impl SectionHeader {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self, ImageError> {
        let mut s = Stream::new(reader, offset);
        let name_index = s.read_word()?;
        let stype = SectionType::from_u32(s.read_word()?);
        let flags = s.read_word()?;
        let vaddr = s.read_word()?;
        let offset = s.read_word()?;
        let size = s.read_word()?;
        let link = s.read_word()?;
        let info = s.read_word()?;
        let align = s.read_word()?;
        let entry_size = s.read_word()?;

        // NOBITS sections occupy no space in the file.
        let file_size = if stype == SectionType::NoBits { 0 } else { size };
        Ok(SectionHeader {
            name: String::new(),
            stype,
            flags,
            obytes: Bytes::<Offset>::from_raw(offset, file_size),
            vbytes: Bytes::<VirtualAddr>::from_raw(vaddr, size),
            link,
            info,
            align,
            entry_size,
            name_index,
        })
    }

    /// True if the section's bytes are present in the file.
    pub fn has_data(&self) -> bool {
        self.stype != SectionType::NoBits && self.obytes.start.0 != 0
    }

    pub fn flags(flags: u32) -> String {
        let names = [
            (WRITE_FLAG, "WRITE"),
            (ALLOC_FLAG, "ALLOC"),
            (EXECINSTR_FLAG, "EXEC"),
            (MERGE_FLAG, "MERGE"),
            (STRINGS_FLAG, "STRINGS"),
            (INFO_LINK_FLAG, "INFO"),
            (LINK_ORDER_FLAG, "LINK"),
            (GROUP_FLAG, "GROUP"),
            (TLS_FLAG, "TLS"),
            (MASKPROC_FLAG, "MASKPROC"),
        ];
        let result: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| flags & flag != 0)
            .map(|(_, name)| *name)
            .collect();
        if result.is_empty() {
            "none".to_string()
        } else {
            result.join(" ")
        }
    }
}
