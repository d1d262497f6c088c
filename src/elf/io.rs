use crate::error::{ImageError, StreamError};
use crate::utils;
use memmap2::Mmap;
use std::ops::Deref;

/// Minimum size of an Elf32_Ehdr.
pub const ELF32_HEADER_SIZE: usize = 52;

const ELFCLASS32: u8 = 1;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

/// Where the bytes of an image live.
pub enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(map) => map,
            Backing::Owned(bytes) => bytes,
        }
    }
}

pub struct Reader {
    pub little_endian: bool,
    bytes: Backing,
}

impl Reader {
    /// Validates the ELF identification bytes. Everything past e_ident is read using
    /// the endianness declared by EI_DATA.
    pub fn new(bytes: Backing) -> Result<Self, ImageError> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        utils::require(
            bytes.len() >= 4,
            ImageError::ReadFailed(format!("file is only {} bytes", bytes.len())),
        )?;
        utils::require(
            bytes[0..4] == [0x7f, b'E', b'L', b'F'],
            ImageError::InvalidHeader("not an ELF file (bad magic)".to_string()),
        )?;
        utils::require(
            bytes.len() >= ELF32_HEADER_SIZE,
            ImageError::ReadFailed("file is too small to hold an ELF header".to_string()),
        )?;

        let ei_class = bytes[0x04];
        let ei_data = bytes[0x05];
        let ei_version = bytes[0x06];
        utils::require(
            ei_class == ELFCLASS32,
            ImageError::InvalidHeader(format!("only 32-bit ELF files are supported (class {ei_class})")),
        )?;
        utils::require(
            ei_data == ELFDATA2LSB || ei_data == ELFDATA2MSB,
            ImageError::InvalidHeader(format!("bad data encoding: {ei_data}")),
        )?;
        utils::require(
            ei_version == 1,
            ImageError::InvalidHeader(format!("bad elf version: {ei_version}")),
        )?;

        Ok(Reader {
            bytes,
            little_endian: ei_data == ELFDATA2LSB,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8], StreamError> {
        checked_slice(&self.bytes, offset, size)
    }
}

fn checked_slice(bytes: &[u8], offset: usize, size: usize) -> Result<&[u8], StreamError> {
    offset
        .checked_add(size)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(StreamError::OutOfBounds { offset, size })
}

/// Sequential reads over a byte slice. Offsets are relative to the start of the slice.
pub struct Stream<'a> {
    bytes: &'a [u8],
    little_endian: bool,
    pub offset: usize,
}

impl<'a> Stream<'a> {
    /// Stream over an entire ELF file.
    pub fn new(reader: &'a Reader, offset: usize) -> Self {
        Stream {
            bytes: reader.bytes(),
            little_endian: reader.little_endian,
            offset,
        }
    }

    /// Stream over something like a section's contents.
    pub fn over(bytes: &'a [u8], little_endian: bool) -> Self {
        Stream {
            bytes,
            little_endian,
            offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn read_byte(&mut self) -> Result<u8, StreamError> {
        let byte = self
            .bytes
            .get(self.offset)
            .copied()
            .ok_or(StreamError::OutOfBounds {
                offset: self.offset,
                size: 1,
            })?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16, StreamError> {
        let raw = self.read_array::<2>()?;
        if self.little_endian {
            Ok(u16::from_le_bytes(raw))
        } else {
            Ok(u16::from_be_bytes(raw))
        }
    }

    pub fn read_word(&mut self) -> Result<u32, StreamError> {
        let raw = self.read_array::<4>()?;
        if self.little_endian {
            Ok(u32::from_le_bytes(raw))
        } else {
            Ok(u32::from_be_bytes(raw))
        }
    }

    pub fn read_xword(&mut self) -> Result<u64, StreamError> {
        let raw = self.read_array::<8>()?;
        if self.little_endian {
            Ok(u64::from_le_bytes(raw))
        } else {
            Ok(u64::from_be_bytes(raw))
        }
    }

    pub fn read_int(&mut self) -> Result<i32, StreamError> {
        Ok(self.read_word()? as i32)
    }

    /// Returns the next size bytes.
    pub fn read_block(&mut self, size: usize) -> Result<&'a [u8], StreamError> {
        let block = checked_slice(self.bytes, self.offset, size)?;
        self.offset += size;
        Ok(block)
    }

    /// Read a null-terminated string. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let start = self.offset;
        let rest = self.bytes.get(start..).unwrap_or_default();
        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                self.offset += len + 1;
                Ok(String::from_utf8_lossy(&rest[..len]).into_owned())
            }
            None => Err(StreamError::OutOfBounds {
                offset: start,
                size: rest.len() + 1,
            }),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        let slice = checked_slice(self.bytes, self.offset, N)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(slice);
        self.offset += N;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endianness() {
        let bytes = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(Stream::over(&bytes, false).read_word(), Ok(0x12345678));
        assert_eq!(Stream::over(&bytes, true).read_word(), Ok(0x78563412));
        assert_eq!(Stream::over(&bytes, false).read_half(), Ok(0x1234));
        assert_eq!(Stream::over(&bytes, true).read_half(), Ok(0x3412));
    }

    #[test]
    fn strings() {
        let bytes = b"abc\0de\0f";
        let mut s = Stream::over(bytes, true);
        assert_eq!(s.read_string().unwrap(), "abc");
        assert_eq!(s.read_string().unwrap(), "de");
        assert_eq!(s.offset, 7);
        assert!(s.read_string().is_err());
    }

    #[test]
    fn out_of_bounds() {
        let bytes = [1, 2, 3];
        let mut s = Stream::over(&bytes, true);
        assert_eq!(
            s.read_word(),
            Err(StreamError::OutOfBounds { offset: 0, size: 4 })
        );
        assert_eq!(s.read_half(), Ok(0x0201));
        assert_eq!(s.read_block(2), Err(StreamError::OutOfBounds { offset: 2, size: 2 }));
        assert_eq!(s.read_block(1), Ok(&[3u8][..]));
        assert!(s.at_end());
    }

    #[test]
    fn bad_magic() {
        let mut bytes = vec![0u8; 64];
        bytes[0..4].copy_from_slice(b"\x7fELG");
        let err = Reader::new(Backing::Owned(bytes)).err().unwrap();
        assert!(matches!(err, ImageError::InvalidHeader(_)));
    }

    #[test]
    fn short_file() {
        let err = Reader::new(Backing::Owned(vec![0x7f, b'E'])).err().unwrap();
        assert!(matches!(err, ImageError::ReadFailed(_)));

        let mut bytes = vec![0u8; 20];
        bytes[0..4].copy_from_slice(b"\x7fELF");
        let err = Reader::new(Backing::Owned(bytes)).err().unwrap();
        assert!(matches!(err, ImageError::ReadFailed(_)));
    }

    #[test]
    fn rejects_64_bit() {
        let mut bytes = vec![0u8; 64];
        bytes[0..4].copy_from_slice(b"\x7fELF");
        bytes[4] = 2;
        bytes[5] = 1;
        bytes[6] = 1;
        let err = Reader::new(Backing::Owned(bytes)).err().unwrap();
        assert!(matches!(err, ImageError::InvalidHeader(_)));
    }
}
