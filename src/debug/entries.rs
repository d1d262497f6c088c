//! Decodes the .debug section into a flat arena of records and attributes and then
//! reconstructs the implicit tree. Records are addressed by their index in the arena;
//! their section offsets are only used as stable identities.
use super::{AttributeName, DEBUG_SECTION, Form, LINE_SECTION, LineTable, Tag, decode_line_tables};
use crate::elf::{ElfFile, Stream};
use crate::error::{DebugError, StreamError};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Size of the length and tag fields that start every record.
const RECORD_HEADER_SIZE: u32 = 6;

/// Records shorter than this have no attributes.
const MIN_RECORD_SIZE: u32 = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    Address(u32),

    /// Offset of another record.
    Ref(u32),
    Block(Vec<u8>),
    Data2(u16),
    Data4(u32),
    Data8(u64),
    String(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Offset of the attribute's name within the debug section.
    pub offset: u32,

    /// Raw name, the low nibble is the form.
    pub raw_name: u16,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn name(&self) -> AttributeName {
        AttributeName::from_u16(self.raw_name)
    }

    pub fn form(&self) -> Option<Form> {
        Form::from_name(self.raw_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Offset of the record within the debug section. Unique within a decode.
    pub offset: u32,
    pub length: u32,
    pub tag: Tag,
    attributes: Range<usize>,

    /// Index of the next record at the same level.
    pub sibling: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,

    /// Number of records reachable by following sibling links.
    pub sibling_count: usize,

    /// Number of records reachable from first_child by following sibling links.
    pub child_count: usize,
}

impl Record {
    pub fn is_null(&self) -> bool {
        self.length < MIN_RECORD_SIZE
    }

    /// Null records and records with the padding tag carry no information.
    pub fn is_padding(&self) -> bool {
        self.is_null() || self.tag == Tag::DW_TAG_padding
    }
}

pub struct DebugInfo {
    pub little_endian: bool,
    records: Vec<Record>,
    attributes: Vec<Attribute>,
    by_offset: HashMap<u32, usize>,
    line_tables: BTreeMap<u32, LineTable>,
}

impl DebugInfo {
    /// Decodes the debug sections of an image. A missing .debug section is reported as
    /// SectionNotFound which callers should treat as "no debug info" rather than as a
    /// corrupt image.
    pub fn load(file: &ElfFile) -> Result<Self, DebugError> {
        let debug = file
            .section_data_by_name(DEBUG_SECTION)
            .ok_or(DebugError::SectionNotFound(DEBUG_SECTION))?;
        let line = file.section_data_by_name(LINE_SECTION);
        DebugInfo::decode(debug, line, file.reader.little_endian)
    }

    pub fn decode(debug: &[u8], line: Option<&[u8]>, little_endian: bool) -> Result<Self, DebugError> {
        // Count first so that the arena is allocated once.
        let (num_records, num_attributes) = count_records(debug, little_endian)?;
        let mut records = Vec::with_capacity(num_records);
        let mut attributes = Vec::with_capacity(num_attributes);
        read_records(debug, little_endian, &mut records, &mut attributes)?;

        let by_offset: HashMap<u32, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.offset, i))
            .collect();
        link_records(&mut records, &attributes, &by_offset);

        let line_tables = match line {
            Some(bytes) => decode_line_tables(bytes, little_endian)?,
            None => BTreeMap::new(),
        };
        Ok(DebugInfo {
            little_endian,
            records,
            attributes,
            by_offset,
            line_tables,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &Record {
        &self.records[index]
    }

    #[cfg(test)]
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Index of the record at a section offset.
    pub fn find(&self, offset: u32) -> Option<usize> {
        self.by_offset.get(&offset).copied()
    }

    pub fn attributes(&self, index: usize) -> &[Attribute] {
        &self.attributes[self.records[index].attributes.clone()]
    }

    pub fn attribute(&self, index: usize, name: AttributeName) -> Option<&Attribute> {
        self.attributes(index).iter().find(|a| a.name() == name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        match self.attribute(index, AttributeName::DW_AT_name) {
            Some(Attribute {
                value: AttributeValue::String(name),
                ..
            }) => Some(name),
            _ => None,
        }
    }

    /// "TAG (name)", used by diagnostics.
    pub fn describe(&self, index: usize) -> String {
        format!(
            "{} ({})",
            self.records[index].tag,
            self.name(index).unwrap_or_default()
        )
    }

    /// The top level records.
    pub fn roots(&self) -> Siblings<'_> {
        Siblings {
            records: &self.records,
            next: if self.records.is_empty() { None } else { Some(0) },
        }
    }

    pub fn children(&self, index: usize) -> Siblings<'_> {
        Siblings {
            records: &self.records,
            next: self.records[index].first_child,
        }
    }

    /// The records following index at the same level.
    #[cfg(test)]
    pub fn siblings(&self, index: usize) -> Siblings<'_> {
        Siblings {
            records: &self.records,
            next: self.records[index].sibling,
        }
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.records[index].parent
    }

    pub fn line_table(&self, offset: u32) -> Option<&LineTable> {
        self.line_tables.get(&offset)
    }

    pub fn line_tables(&self) -> impl Iterator<Item = &LineTable> {
        self.line_tables.values()
    }
}

/// Iterates over record indexes by following sibling links.
pub struct Siblings<'a> {
    records: &'a [Record],
    next: Option<usize>,
}

impl Iterator for Siblings<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.records[current].sibling;
        Some(current)
    }
}

/// Where a record lives and whether it has attributes.
struct Framing {
    start: usize,
    length: u32,
    tag: u16,
    end: usize,
}

impl Framing {
    fn has_attributes(&self) -> bool {
        self.length >= MIN_RECORD_SIZE && self.tag != 0
    }
}

/// Returns None once fewer than four bytes remain.
fn next_record(bytes: &[u8], little_endian: bool, start: usize) -> Result<Option<Framing>, DebugError> {
    if bytes.len() - start < 4 {
        return Ok(None);
    }
    let mut s = Stream::over(bytes, little_endian);
    s.offset = start;
    let length = s.read_word()?;

    // Null entries may be shorter than the record header.
    let size = length.max(4) as usize;
    let end = start.checked_add(size).filter(|&end| end <= bytes.len());
    let end = end.ok_or(DebugError::RecordOverrun {
        offset: start,
        length,
        end: bytes.len(),
    })?;
    let tag = if length >= RECORD_HEADER_SIZE {
        s.read_half()?
    } else {
        0
    };
    Ok(Some(Framing {
        start,
        length,
        tag,
        end,
    }))
}

fn count_records(bytes: &[u8], little_endian: bool) -> Result<(usize, usize), DebugError> {
    let mut num_records = 0;
    let mut num_attributes = 0;
    let mut offset = 0;
    while let Some(record) = next_record(bytes, little_endian, offset)? {
        if record.has_attributes() {
            let mut s = Stream::over(&bytes[..record.end], little_endian);
            s.offset = record.start + RECORD_HEADER_SIZE as usize;
            while !s.at_end() {
                skip_attribute(&mut s)?;
                num_attributes += 1;
            }
        }
        num_records += 1;
        offset = record.end;
    }
    Ok((num_records, num_attributes))
}

fn read_records(
    bytes: &[u8],
    little_endian: bool,
    records: &mut Vec<Record>,
    attributes: &mut Vec<Attribute>,
) -> Result<(), DebugError> {
    let mut offset = 0;
    while let Some(record) = next_record(bytes, little_endian, offset)? {
        let first = attributes.len();
        if record.has_attributes() {
            // The stream ends with the record so an attribute can't run into the next one.
            let mut s = Stream::over(&bytes[..record.end], little_endian);
            s.offset = record.start + RECORD_HEADER_SIZE as usize;
            while !s.at_end() {
                attributes.push(read_attribute(&mut s)?);
            }
        }
        records.push(Record {
            offset: record.start as u32,
            length: record.length,
            tag: Tag::from_u16(record.tag),
            attributes: first..attributes.len(),
            sibling: None,
            first_child: None,
            parent: None,
            sibling_count: 0,
            child_count: 0,
        });
        offset = record.end;
    }
    Ok(())
}

fn unknown_form(s: &Stream, name: u16) -> DebugError {
    DebugError::UnknownForm {
        name,
        offset: s.offset - 2,
        form: name & 0xf,
    }
}

fn skip_attribute(s: &mut Stream) -> Result<(), DebugError> {
    let name = s.read_half()?;
    let form = Form::from_name(name).ok_or_else(|| unknown_form(s, name))?;
    match form {
        Form::Addr | Form::Ref | Form::Data4 => s.offset += 4,
        Form::Data2 => s.offset += 2,
        Form::Data8 => s.offset += 8,
        Form::Block2 => {
            let len = s.read_half()? as usize;
            s.read_block(len)?;
        }
        Form::Block4 => {
            let len = s.read_word()? as usize;
            s.read_block(len)?;
        }
        Form::String => {
            s.read_string()?;
        }
    }
    if s.offset > s.len() {
        return Err(DebugError::Truncated(StreamError::OutOfBounds {
            offset: s.len(),
            size: s.offset - s.len(),
        }));
    }
    Ok(())
}

fn read_attribute(s: &mut Stream) -> Result<Attribute, DebugError> {
    let offset = s.offset as u32;
    let raw_name = s.read_half()?;
    let form = Form::from_name(raw_name).ok_or_else(|| unknown_form(s, raw_name))?;
    let value = read_value(s, form)?;
    Ok(Attribute {
        offset,
        raw_name,
        value,
    })
}

/// Reads an attribute payload. Also used for the element type embedded in subscript
/// data.
pub(super) fn read_value(s: &mut Stream, form: Form) -> Result<AttributeValue, StreamError> {
    let value = match form {
        Form::Addr => AttributeValue::Address(s.read_word()?),
        Form::Ref => AttributeValue::Ref(s.read_word()?),
        Form::Block2 => {
            let len = s.read_half()? as usize;
            AttributeValue::Block(s.read_block(len)?.to_vec())
        }
        Form::Block4 => {
            let len = s.read_word()? as usize;
            AttributeValue::Block(s.read_block(len)?.to_vec())
        }
        Form::Data2 => AttributeValue::Data2(s.read_half()?),
        Form::Data4 => AttributeValue::Data4(s.read_word()?),
        Form::Data8 => AttributeValue::Data8(s.read_xword()?),
        Form::String => AttributeValue::String(s.read_string()?),
    };
    Ok(value)
}

fn sibling_ref(attributes: &[Attribute], record: &Record) -> Option<u32> {
    attributes[record.attributes.clone()]
        .iter()
        .find_map(|a| match (a.name(), &a.value) {
            (AttributeName::DW_AT_sibling, AttributeValue::Ref(target)) => Some(*target),
            _ => None,
        })
}

/// Reconstructs sibling and child links. A record whose sibling attribute points at
/// the record immediately after it has no children. Otherwise the following record is
/// its first child and the sibling is wherever the attribute points.
fn link_records(records: &mut [Record], attributes: &[Attribute], by_offset: &HashMap<u32, usize>) {
    let n = records.len();
    if n == 0 {
        return;
    }

    for i in 0..n - 1 {
        if records[i].is_padding() {
            continue;
        }
        let Some(target) = sibling_ref(attributes, &records[i]) else {
            continue;
        };
        if target == records[i + 1].offset {
            records[i].sibling = Some(i + 1);
        } else {
            records[i].first_child = Some(i + 1);
            records[i].sibling = by_offset.get(&target).copied().filter(|&j| j > i + 1);
        }
    }

    // Padding between children has no sibling attribute which would otherwise end the
    // child list early.
    for i in 0..n - 1 {
        let mut child = records[i].first_child;
        while let Some(c) = child {
            if records[c].sibling.is_none()
                && records[c].is_padding()
                && c + 1 < n
                && Some(c + 1) != records[i].sibling
            {
                records[c].sibling = Some(c + 1);
            }
            child = records[c].sibling;
        }
    }

    // Links always point forward so the counts can be filled in back to front.
    for i in (0..n).rev() {
        let sibling_count = records[i]
            .sibling
            .map(|s| 1 + records[s].sibling_count)
            .unwrap_or(0);
        let child_count = records[i]
            .first_child
            .map(|c| 1 + records[c].sibling_count)
            .unwrap_or(0);
        records[i].sibling_count = sibling_count;
        records[i].child_count = child_count;
    }

    for i in 0..n {
        let mut child = records[i].first_child;
        while let Some(c) = child {
            records[c].parent = Some(i);
            child = records[c].sibling;
        }
    }
}
