use super::{Reader, Stream};
use crate::error::ImageError;

pub const EM_PPC: u16 = 20;

/// Elf32_Ehdr. Multi-byte fields have already been converted to host order.
#[derive(Clone, Debug)]
pub struct ElfHeader {
    pub osabi: u8,
    pub abiversion: u8,
    pub etype: u16,
    pub machine: u16,
    pub version: u32,

    /// Virtual address of the entry point.
    pub entry: u32,

    /// Offset in the ELF file to the program header table.
    pub ph_offset: u32,

    /// Offset in the ELF file to the section header table.
    pub section_offset: u32,
    pub flags: u32,
    pub header_size: u16,
    pub ph_entry_size: u16,
    pub num_ph_entries: u16,
    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Section containing the names of the sections.
    pub string_table_index: u16,
}

impl ElfHeader {
    pub fn new(reader: &Reader) -> Result<Self, ImageError> {
        let mut s = Stream::new(reader, 0x07);
        let osabi = s.read_byte()?;
        let abiversion = s.read_byte()?;

        s.offset = 0x10;
        Ok(ElfHeader {
            osabi,
            abiversion,
            etype: s.read_half()?,
            machine: s.read_half()?,
            version: s.read_word()?,
            entry: s.read_word()?,
            ph_offset: s.read_word()?,
            section_offset: s.read_word()?,
            flags: s.read_word()?,
            header_size: s.read_half()?,
            ph_entry_size: s.read_half()?,
            num_ph_entries: s.read_half()?,
            section_entry_size: s.read_half()?,
            num_section_entries: s.read_half()?,
            string_table_index: s.read_half()?,
        })
    }

    pub fn stype(&self) -> &'static str {
        match self.etype {
            0 => "none",
            1 => "relocatable",
            2 => "executable",
            3 => "shared object",
            4 => "core",
            _ => "unknown",
        }
    }

    pub fn machine(&self) -> String {
        match self.machine {
            0 => "none".to_string(),
            3 => "x86".to_string(),
            8 => "MIPS".to_string(),
            EM_PPC => "PowerPC".to_string(),
            21 => "PowerPC 64".to_string(),
            40 => "ARM".to_string(),
            42 => "SuperH".to_string(),
            62 => "x86-64".to_string(),
            _ => format!("machine {}", self.machine),
        }
    }
}
