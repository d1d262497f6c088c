//! The .line section: one table per compile unit mapping source lines to addresses.
use crate::elf::Stream;
use crate::error::DebugError;
use std::collections::BTreeMap;

/// Position value used when an entry applies to the whole line.
const WHOLE_LINE: u16 = 0xffff;

/// Size of the length and start address fields.
const TABLE_HEADER_SIZE: u32 = 8;

/// line, position, address delta
const LINE_ENTRY_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEntry {
    pub line: u32,

    /// Character position within the line, None for the whole line.
    pub position: Option<u16>,

    /// Absolute address.
    pub address: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineTable {
    /// Offset of the table within the .line section, referenced by a compile unit's
    /// stmt_list attribute.
    pub offset: u32,
    pub start: u32,
    pub entries: Vec<LineEntry>,
}

pub fn decode_line_tables(bytes: &[u8], little_endian: bool) -> Result<BTreeMap<u32, LineTable>, DebugError> {
    let mut tables = BTreeMap::new();
    let mut s = Stream::over(bytes, little_endian);
    while s.remaining() >= 4 {
        let offset = s.offset;
        let length = s.read_word()?;
        let end = offset.saturating_add(length as usize);
        if length < TABLE_HEADER_SIZE || end > bytes.len() {
            return Err(DebugError::BadLineTable { offset, length });
        }

        let start = s.read_word()?;
        let mut entries = Vec::with_capacity((end - s.offset) / LINE_ENTRY_SIZE);
        while end - s.offset >= LINE_ENTRY_SIZE {
            let line = s.read_word()?;
            let position = s.read_half()?;
            let delta = s.read_word()?;
            entries.push(LineEntry {
                line,
                position: if position == WHOLE_LINE { None } else { Some(position) },
                address: delta,
            });
        }

        // Addresses are relative until the whole table has been read.
        for entry in entries.iter_mut() {
            entry.address = start.wrapping_add(entry.address);
        }
        tables.insert(
            offset as u32,
            LineTable {
                offset: offset as u32,
                start,
                entries,
            },
        );
        s.offset = end;
    }
    Ok(tables)
}
