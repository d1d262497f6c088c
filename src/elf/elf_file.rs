//! An ELF32 image along with its section and segment tables.
use super::{
    Backing, ElfHeader, ProgramHeader, Reader, SYMBOL_ENTRY_SIZE, SectionHeader, SectionIndex,
    SectionType, SegmentType, Stream, Symbol, SymbolTable, VirtualAddr,
};
use crate::error::ImageError;
use crate::utils::{self, warn};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

const SECTION_HEADER_SIZE: u16 = 40;
const PROGRAM_HEADER_SIZE: u16 = 32;

pub struct ElfFile {
    pub header: ElfHeader,

    /// None when the image was loaded from memory.
    pub path: Option<PathBuf>,
    pub reader: Reader,
    pub segments: Vec<ProgramHeader>,
    pub sections: Vec<SectionHeader>,
    pub symbols: Option<SymbolTable>,
}

impl ElfFile {
    pub fn open(path: &Path) -> Result<Self, ImageError> {
        let open_failed = |source| ImageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_failed)?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }.map_err(open_failed)?;
        ElfFile::with_backing(Backing::Mapped(bytes), Some(path.to_path_buf()))
    }

    pub fn load(bytes: Vec<u8>) -> Result<Self, ImageError> {
        ElfFile::with_backing(Backing::Owned(bytes), None)
    }

    /// Index of the first section with the given name.
    pub fn section_index(&self, name: &str) -> Option<SectionIndex> {
        self.sections
            .iter()
            .position(|s| s.name == name)
            .map(|i| SectionIndex(i as u32))
    }

    pub fn section(&self, index: SectionIndex) -> Option<&SectionHeader> {
        self.sections.get(index.0 as usize)
    }

    /// Returns None if there's no such section or it has no bytes in the file.
    pub fn section_data(&self, index: SectionIndex) -> Option<&[u8]> {
        let section = self.section(index)?;
        if section.has_data() {
            // load_sections has already checked that the bytes are present
            self.reader
                .slice(section.obytes.start.0 as usize, section.obytes.size as usize)
                .ok()
        } else {
            None
        }
    }

    pub fn section_data_by_name(&self, name: &str) -> Option<&[u8]> {
        self.section_index(name)
            .and_then(|index| self.section_data(index))
    }

    pub fn find_load_segment(&self, vaddr: VirtualAddr) -> Option<&ProgramHeader> {
        self.segments
            .iter()
            .find(|s| s.stype == SegmentType::Load && s.vbytes.contains(vaddr))
    }

    /// Returns the file bytes from vaddr to the end of the segment's file image.
    pub fn address_to_data(&self, vaddr: VirtualAddr) -> Option<&[u8]> {
        let segment = self.find_load_segment(vaddr)?;
        let offset = segment.to_offset(vaddr)?;
        let size = segment.obytes.end().0 - offset.0;
        self.reader.slice(offset.0 as usize, size as usize).ok()
    }

    /// Returns a string from a string table section. Note that index can point into
    /// the middle of a string.
    pub fn find_string(&self, section: SectionIndex, index: u32) -> Option<String> {
        let bytes = self.section_data(section)?;
        let mut s = Stream::over(bytes, self.reader.little_endian);
        s.offset = index as usize;
        match s.read_string() {
            Ok(name) => Some(name),
            Err(err) => {
                warn(&format!("failed to read string {index} in section {}: {err}", section.0));
                None
            }
        }
    }
}

impl ElfFile {
    fn with_backing(bytes: Backing, path: Option<PathBuf>) -> Result<Self, ImageError> {
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        let segments = ElfFile::load_segments(&reader, &header)?;
        let sections = ElfFile::load_sections(&reader, &header)?;
        let mut file = ElfFile {
            header,
            path,
            reader,
            segments,
            sections,
            symbols: None,
        };
        file.name_sections();
        file.symbols = file.load_symbols();
        Ok(file)
    }

    fn load_segments(reader: &Reader, header: &ElfHeader) -> Result<Vec<ProgramHeader>, ImageError> {
        if header.num_ph_entries == 0 {
            return Ok(Vec::new());
        }
        utils::require(
            header.ph_entry_size >= PROGRAM_HEADER_SIZE,
            ImageError::InvalidHeader(format!("bad program header size {}", header.ph_entry_size)),
        )?;

        let mut segments = Vec::with_capacity(header.num_ph_entries as usize);
        let mut offset = header.ph_offset as usize;
        for _ in 0..header.num_ph_entries {
            let ph = ProgramHeader::new(reader, offset)?;
            if ph.stype == SegmentType::Load {
                reader.slice(ph.obytes.start.0 as usize, ph.obytes.size as usize)?;
            }
            segments.push(ph);
            offset += header.ph_entry_size as usize;
        }
        Ok(segments)
    }

    fn load_sections(reader: &Reader, header: &ElfHeader) -> Result<Vec<SectionHeader>, ImageError> {
        if header.num_section_entries == 0 {
            return Ok(Vec::new());
        }
        utils::require(
            header.section_entry_size >= SECTION_HEADER_SIZE,
            ImageError::InvalidHeader(format!(
                "bad section header size {}",
                header.section_entry_size
            )),
        )?;

        let mut sections = Vec::with_capacity(header.num_section_entries as usize);
        let mut offset = header.section_offset as usize;
        for _ in 0..header.num_section_entries {
            let h = SectionHeader::new(reader, offset)?;
            if h.has_data() {
                reader.slice(h.obytes.start.0 as usize, h.obytes.size as usize)?;
            }
            sections.push(h);
            offset += header.section_entry_size as usize;
        }
        Ok(sections)
    }

    fn name_sections(&mut self) {
        let strings = SectionIndex(self.header.string_table_index as u32);
        if strings.0 == 0 {
            return; // SHN_UNDEF: the sections have no names
        }
        if self.section(strings).is_none() {
            warn(&format!("bad section name table index: {}", strings.0));
            return;
        }

        let names: Vec<String> = self
            .sections
            .iter()
            .map(|s| self.find_string(strings, s.name_index).unwrap_or_default())
            .collect();
        for (section, name) in self.sections.iter_mut().zip(names) {
            section.name = name;
        }
    }

    fn load_symbols(&self) -> Option<SymbolTable> {
        let index = self
            .sections
            .iter()
            .position(|s| s.stype == SectionType::SymbolTable)?;
        let section = &self.sections[index];
        let entry_size = if section.entry_size == 0 {
            SYMBOL_ENTRY_SIZE
        } else {
            section.entry_size
        };

        let mut entries = Vec::new();
        let mut offset = section.obytes.start.0;
        while offset + entry_size <= section.obytes.end().0 {
            match Symbol::new(&self.reader, offset as usize) {
                Ok(s) => entries.push(s),
                Err(err) => {
                    warn(&format!("failed to read symbol at offset {offset:#x}: {err}"));
                    return None;
                }
            }
            offset += entry_size;
        }

        let strings = SectionIndex(section.link);
        for symbol in entries.iter_mut() {
            if symbol.name_index != 0 {
                symbol.name = self.find_string(strings, symbol.name_index).unwrap_or_default();
            }
        }
        Some(SymbolTable {
            section: SectionIndex(index as u32),
            entries,
        })
    }
}
