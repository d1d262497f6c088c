//! The static symbol table. Not needed to interpret the debug info but handy when
//! poking around an image.
use super::{Reader, SectionIndex, Stream};
use crate::error::ImageError;

/// Size of an Elf32_Sym.
pub const SYMBOL_ENTRY_SIZE: u32 = 16;

pub struct SymbolTable {
    pub section: SectionIndex,
    pub entries: Vec<Symbol>,
}

pub struct Symbol {
    // see https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
    /// Resolved from the table's linked string section.
    pub name: String,

    /// Can be an address, absolute value, etc.
    pub value: u32,

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub size: u32,

    pub stype: SymbolType,

    pub binding: SymbolBinding,

    pub index: SymbolIndex,

    pub(super) name_index: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolIndex {
    /// Symbol has an absolute value that will not change with relocation.
    Abs,

    /// A common block that has not yet been allocated. Value has alignment.
    Common,

    /// Symbol value refers to another section at this index.
    Index(SectionIndex),

    /// Value is undefined. Linker will fix these up.
    Undef,
}

/// Linkage visibility and behavior
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolBinding {
    /// Symbol is not visible outside the object file containing its definition.
    Local,

    /// Visible to all object files.
    Global,

    /// Similar to Global but has lower precedence.
    Weak,

    /// For use by OS or CPU.
    Reserved,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    None,

    /// A data object, variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Another section. Used for relocation.
    Section,

    /// Source file associated with the symbol table.
    File,

    /// For use by OS or CPU.
    Reserved,
}

impl Symbol {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self, ImageError> {
        let mut s = Stream::new(reader, offset);
        let name = s.read_word()?;
        let value = s.read_word()?;
        let size = s.read_word()?;
        let info = s.read_byte()?;
        let _other = s.read_byte()?;
        let index = s.read_half()?;
        Ok(Symbol {
            name: String::new(),
            value,
            size,
            stype: SymbolType::from_u8(info),
            binding: SymbolBinding::from_u8(info),
            index: SymbolIndex::from_u16(index),
            name_index: name,
        })
    }
}

impl SymbolIndex {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SymbolIndex::Undef,
            0xfff1 => SymbolIndex::Abs,
            0xfff2 => SymbolIndex::Common,
            _ => SymbolIndex::Index(SectionIndex(value as u32)),
        }
    }
}

impl SymbolBinding {
    pub fn from_u8(value: u8) -> Self {
        match value >> 4 {
            0 => SymbolBinding::Local,
            1 => SymbolBinding::Global,
            2 => SymbolBinding::Weak,
            _ => SymbolBinding::Reserved,
        }
    }
}

impl SymbolType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            _ => SymbolType::Reserved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_bits() {
        assert_eq!(SymbolType::from_u8(0x12), SymbolType::Func);
        assert_eq!(SymbolBinding::from_u8(0x12), SymbolBinding::Global);
        assert_eq!(SymbolBinding::from_u8(0x01), SymbolBinding::Local);
        assert_eq!(SymbolIndex::from_u16(3), SymbolIndex::Index(SectionIndex(3)));
        assert_eq!(SymbolIndex::from_u16(0xfff1), SymbolIndex::Abs);
    }
}
