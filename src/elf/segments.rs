//! Used by the run-time loader. Also see sections.
use super::{Reader, Stream};
use crate::elf::{Bytes, Offset, VirtualAddr};
use crate::error::ImageError;

const EXECUTE_FLAG: u32 = 0x1;
const WRITE_FLAG: u32 = 0x2;
const READ_FLAG: u32 = 0x4;

/// Describes a segment (Elf32_Phdr).
#[derive(Clone, Debug)]
pub struct ProgramHeader {
    pub stype: SegmentType,

    /// Where the segment's bytes are in the file. Size is p_filesz.
    pub obytes: Bytes<Offset>,

    /// Where the segment is loaded. Size is p_memsz which may be larger than the file
    /// size (the remainder is zero filled).
    pub vbytes: Bytes<VirtualAddr>,

    /// Physical address of the first byte in the segment.
    pub paddr: u32,

    /// Read/Write/Execute flags.
    pub flags: u32,

    pub align: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentType {
    /// Not to be used.
    Null,

    /// A loadable segment, described by p_filesz and p_memsz.
    Load,

    /// Specifies dynamic linking information.
    Dynamic,

    /// Location and size of a null-terminated path name to invoke as an interpreter.
    Interpreter,

    /// The location and size of auxiliary information.
    Note,

    /// Reserved but has unspecified semantics.
    Shlib,

    /// The location and size of the program header table itself.
    Phdr,

    // The Thread-Local Storage template.
    Tls,

    /// OS or processor specific.
    Other(u32),
}

impl SegmentType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SegmentType::Null,
            1 => SegmentType::Load,
            2 => SegmentType::Dynamic,
            3 => SegmentType::Interpreter,
            4 => SegmentType::Note,
            5 => SegmentType::Shlib,
            6 => SegmentType::Phdr,
            7 => SegmentType::Tls,
            _ => SegmentType::Other(value),
        }
    }
}

impl ProgramHeader {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self, ImageError> {
        let mut s = Stream::new(reader, offset);
        let p_type = SegmentType::from_u32(s.read_word()?);
        let p_offset = s.read_word()?;
        let p_vaddr = s.read_word()?;
        let p_paddr = s.read_word()?;
        let p_filesz = s.read_word()?;
        let p_memsz = s.read_word()?;
        let p_flags = s.read_word()?;
        let p_align = s.read_word()?;
        Ok(ProgramHeader {
            stype: p_type,
            obytes: Bytes::<Offset>::from_raw(p_offset, p_filesz),
            vbytes: Bytes::<VirtualAddr>::from_raw(p_vaddr, p_memsz),
            paddr: p_paddr,
            flags: p_flags,
            align: p_align,
        })
    }

    /// Maps an address within the segment to a file offset. Addresses in the zero
    /// filled tail have no file offset.
    pub fn to_offset(&self, vaddr: VirtualAddr) -> Option<Offset> {
        if self.vbytes.contains(vaddr) {
            let delta = vaddr.0 - self.vbytes.start.0;
            if delta < self.obytes.size {
                return Some(self.obytes.start + delta);
            }
        }
        None
    }

    pub fn executable(&self) -> bool {
        self.flags & EXECUTE_FLAG != 0
    }

    pub fn writeable(&self) -> bool {
        self.flags & WRITE_FLAG != 0
    }

    pub fn readable(&self) -> bool {
        self.flags & READ_FLAG != 0
    }

    pub fn flags(flags: u32) -> String {
        let mut result = String::new();
        result.push(if flags & EXECUTE_FLAG != 0 { 'x' } else { '-' });
        result.push(if flags & WRITE_FLAG != 0 { 'w' } else { '-' });
        result.push(if flags & READ_FLAG != 0 { 'r' } else { '-' });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        let ph = ProgramHeader {
            stype: SegmentType::Load,
            obytes: Bytes::<Offset>::from_raw(0x100, 0x10),
            vbytes: Bytes::<VirtualAddr>::from_raw(0x8000_0000, 0x20),
            paddr: 0,
            flags: READ_FLAG | EXECUTE_FLAG,
            align: 4,
        };
        assert_eq!(ph.to_offset(VirtualAddr(0x8000_0004)), Some(Offset(0x104)));
        assert_eq!(ph.to_offset(VirtualAddr(0x8000_0018)), None); // bss tail
        assert_eq!(ph.to_offset(VirtualAddr(0x8000_0020)), None);
        assert_eq!(ProgramHeader::flags(ph.flags), "x-r");
    }
}
