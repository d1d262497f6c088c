//! Builders used by the unit tests to synthesize ELF images and DWARF v1 records in
//! memory. Nothing here is used outside of tests.
use crate::debug::{DEBUG_SECTION, LINE_SECTION};
use crate::elf::{EM_PPC, ElfFile};
use std::collections::HashMap;

pub const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;

struct Writer {
    bytes: Vec<u8>,
    little_endian: bool,
}

impl Writer {
    fn new(little_endian: bool) -> Self {
        Writer {
            bytes: Vec::new(),
            little_endian,
        }
    }

    fn byte(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn half(&mut self, value: u16) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn word(&mut self, value: u32) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn xword(&mut self, value: u64) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn string(&mut self, value: &str) {
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
    }

    fn patch_word(&mut self, at: usize, value: u32) {
        let raw = if self.little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.bytes[at..at + 4].copy_from_slice(&raw);
    }

    fn patch_half(&mut self, at: usize, value: u16) {
        let raw = if self.little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.bytes[at..at + 2].copy_from_slice(&raw);
    }

    fn align(&mut self, alignment: usize) {
        while self.bytes.len() % alignment != 0 {
            self.bytes.push(0);
        }
    }
}

// ---- ELF -----------------------------------------------------------------------

struct SectionSpec {
    name: String,
    stype: u32,
    data: Vec<u8>,
    size: u32,
    vaddr: u32,
}

struct SegmentSpec {
    vaddr: u32,
    section: String,
    memsz: u32,
}

/// Lays out header, program headers, section data, string tables and finally the
/// section header table.
pub struct ElfBuilder {
    little_endian: bool,
    sections: Vec<SectionSpec>,
    segments: Vec<SegmentSpec>,
    symbols: Vec<(String, u32, u32)>,
}

impl ElfBuilder {
    pub fn new(little_endian: bool) -> Self {
        ElfBuilder {
            little_endian,
            sections: Vec::new(),
            segments: Vec::new(),
            symbols: Vec::new(),
        }
    }

    pub fn section(&mut self, name: &str, stype: u32, data: Vec<u8>) -> &mut Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            stype,
            size: data.len() as u32,
            data,
            vaddr: 0,
        });
        self
    }

    pub fn bss(&mut self, name: &str, size: u32) -> &mut Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            stype: SHT_NOBITS,
            data: Vec::new(),
            size,
            vaddr: 0,
        });
        self
    }

    /// Adds a loadable segment backed by the bytes of an already added section.
    pub fn segment(&mut self, vaddr: u32, section: &str, memsz: u32) -> &mut Self {
        if let Some(s) = self.sections.iter_mut().find(|s| s.name == section) {
            s.vaddr = vaddr;
        }
        self.segments.push(SegmentSpec {
            vaddr,
            section: section.to_string(),
            memsz,
        });
        self
    }

    pub fn symbol(&mut self, name: &str, value: u32, size: u32) -> &mut Self {
        self.symbols.push((name.to_string(), value, size));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::new(self.little_endian);

        // string and symbol tables become ordinary sections
        let mut sections: Vec<(String, u32, Vec<u8>, u32, u32, u32, u32)> = self
            .sections
            .iter()
            .map(|s| (s.name.clone(), s.stype, s.data.clone(), s.size, s.vaddr, 0, 0))
            .collect();
        let mut names = vec![0u8];
        let mut name_indexes = Vec::new();
        let shstrtab_index = sections.len() + 1;
        sections.push((".shstrtab".to_string(), SHT_STRTAB, Vec::new(), 0, 0, 0, 0));
        if !self.symbols.is_empty() {
            let strtab_index = sections.len() + 2;
            let mut strings = vec![0u8];
            let mut symtab = Writer::new(self.little_endian);
            symtab.bytes.extend_from_slice(&[0; 16]);
            for (name, value, size) in &self.symbols {
                symtab.word(strings.len() as u32);
                strings.extend_from_slice(name.as_bytes());
                strings.push(0);
                symtab.word(*value);
                symtab.word(*size);
                symtab.byte(0x12); // global function
                symtab.byte(0);
                symtab.half(0xfff1);
            }
            let len = symtab.bytes.len() as u32;
            sections.push((
                ".symtab".to_string(),
                SHT_SYMTAB,
                symtab.bytes,
                len,
                0,
                strtab_index as u32,
                16,
            ));
            let len = strings.len() as u32;
            sections.push((".strtab".to_string(), SHT_STRTAB, strings, len, 0, 0, 0));
        }
        for section in &sections {
            name_indexes.push(names.len() as u32);
            names.extend_from_slice(section.0.as_bytes());
            names.push(0);
        }
        let shstrtab = &mut sections[shstrtab_index - 1];
        shstrtab.3 = names.len() as u32;
        shstrtab.2 = names;

        // section data offsets
        let mut offset = 52 + 32 * self.segments.len();
        let mut offsets = Vec::new();
        for section in &sections {
            offsets.push(offset as u32);
            offset += section.2.len();
            offset += (4 - offset % 4) % 4;
        }
        let section_offset = offset;

        w.bytes.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1]);
        w.byte(if self.little_endian { 1 } else { 2 });
        w.byte(1);
        w.bytes.extend_from_slice(&[0; 9]);
        w.half(2); // executable
        w.half(EM_PPC);
        w.word(1);
        w.word(0); // entry
        w.word(if self.segments.is_empty() { 0 } else { 52 });
        w.word(section_offset as u32);
        w.word(0);
        w.half(52);
        w.half(32);
        w.half(self.segments.len() as u16);
        w.half(40);
        w.half(sections.len() as u16 + 1);
        w.half(shstrtab_index as u16);

        for segment in &self.segments {
            let index = sections
                .iter()
                .position(|s| s.0 == segment.section)
                .unwrap_or_else(|| panic!("no section named {}", segment.section));
            w.word(1); // PT_LOAD
            w.word(offsets[index]);
            w.word(segment.vaddr);
            w.word(segment.vaddr);
            w.word(sections[index].2.len() as u32);
            w.word(segment.memsz);
            w.word(0x5); // r-x
            w.word(4);
        }

        for section in &sections {
            w.bytes.extend_from_slice(&section.2);
            w.align(4);
        }
        assert_eq!(w.bytes.len(), section_offset);

        w.bytes.extend_from_slice(&[0; 40]);
        for (i, section) in sections.iter().enumerate() {
            w.word(name_indexes[i]);
            w.word(section.1);
            w.word(0);
            w.word(section.4);
            w.word(offsets[i]);
            w.word(section.3);
            w.word(section.5);
            w.word(0);
            w.word(4);
            w.word(section.6);
        }
        w.bytes
    }
}

// ---- DWARF ---------------------------------------------------------------------

/// Parts of a block payload. Refs are patched with the offset of the labeled node.
#[derive(Clone)]
pub enum Piece {
    Byte(u8),
    Half(u16),
    Word(u32),
    Ref(String),
    Str(String),
}

#[derive(Clone)]
pub enum Value {
    Addr(u32),
    Ref(String),
    Block2(Vec<Piece>),
    Block4(Vec<Piece>),
    Data2(u16),
    Data4(u32),
    Data8(u64),
    Str(String),
}

/// A debug record along with its children.
#[derive(Clone)]
pub struct Node {
    tag: u16,
    label: Option<String>,
    attributes: Vec<(u16, Value)>,
    children: Vec<Node>,
    padding: bool,
    sibling: bool,
}

impl Node {
    pub fn new(tag: u16) -> Self {
        Node {
            tag,
            label: None,
            attributes: Vec::new(),
            children: Vec::new(),
            padding: false,
            sibling: true,
        }
    }

    /// An eight byte record with the padding tag and no attributes.
    pub fn padding() -> Self {
        Node {
            padding: true,
            ..Node::new(0)
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn attr(mut self, name: u16, value: Value) -> Self {
        self.attributes.push((name, value));
        self
    }

    pub fn name(self, name: &str) -> Self {
        self.attr(0x0038, Value::Str(name.to_string()))
    }

    pub fn fund_type(self, ft: u16) -> Self {
        self.attr(0x0055, Value::Data2(ft))
    }

    pub fn user_type(self, label: &str) -> Self {
        self.attr(0x0072, Value::Ref(label.to_string()))
    }

    pub fn mod_fund_type(self, modifiers: &[u8], ft: u16) -> Self {
        let mut pieces: Vec<Piece> = modifiers.iter().map(|&m| Piece::Byte(m)).collect();
        pieces.push(Piece::Half(ft));
        self.attr(0x0063, Value::Block2(pieces))
    }

    pub fn mod_user_type(self, modifiers: &[u8], label: &str) -> Self {
        let mut pieces: Vec<Piece> = modifiers.iter().map(|&m| Piece::Byte(m)).collect();
        pieces.push(Piece::Ref(label.to_string()));
        self.attr(0x0083, Value::Block2(pieces))
    }

    pub fn byte_size(self, size: u32) -> Self {
        self.attr(0x00b6, Value::Data4(size))
    }

    pub fn low_pc(self, addr: u32) -> Self {
        self.attr(0x0111, Value::Addr(addr))
    }

    pub fn high_pc(self, addr: u32) -> Self {
        self.attr(0x0121, Value::Addr(addr))
    }

    /// Location block with the given operations.
    pub fn location(self, ops: Vec<Piece>) -> Self {
        self.attr(0x0023, Value::Block2(ops))
    }

    /// Omits the sibling attribute.
    pub fn no_sibling(mut self) -> Self {
        self.sibling = false;
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self
    }
}

struct Encoder {
    w: Writer,
    labels: HashMap<String, u32>,
    fixups: Vec<(usize, String)>,
}

impl Encoder {
    fn node(&mut self, node: &Node) {
        let start = self.w.bytes.len();
        if let Some(label) = &node.label {
            self.labels.insert(label.clone(), start as u32);
        }
        if node.padding {
            self.w.word(8);
            self.w.half(0);
            self.w.half(0);
            return;
        }

        self.w.word(0);
        self.w.half(node.tag);
        let sibling = if node.sibling {
            self.w.half(0x0012);
            self.w.word(0);
            Some(self.w.bytes.len() - 4)
        } else {
            None
        };
        for (name, value) in &node.attributes {
            self.w.half(*name);
            self.value(value);
        }
        let length = (self.w.bytes.len() - start) as u32;
        self.w.patch_word(start, length);

        if !node.children.is_empty() {
            for child in &node.children {
                self.node(child);
            }
            self.w.word(4); // null entry ends the children
        }
        if let Some(at) = sibling {
            let next = self.w.bytes.len() as u32;
            self.w.patch_word(at, next);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Addr(v) => self.w.word(*v),
            Value::Ref(label) => {
                self.fixups.push((self.w.bytes.len(), label.clone()));
                self.w.word(0);
            }
            Value::Block2(pieces) => {
                let at = self.w.bytes.len();
                self.w.half(0);
                self.pieces(pieces);
                let len = (self.w.bytes.len() - at - 2) as u16;
                self.w.patch_half(at, len);
            }
            Value::Block4(pieces) => {
                let at = self.w.bytes.len();
                self.w.word(0);
                self.pieces(pieces);
                let len = (self.w.bytes.len() - at - 4) as u32;
                self.w.patch_word(at, len);
            }
            Value::Data2(v) => self.w.half(*v),
            Value::Data4(v) => self.w.word(*v),
            Value::Data8(v) => self.w.xword(*v),
            Value::Str(s) => self.w.string(s),
        }
    }

    fn pieces(&mut self, pieces: &[Piece]) {
        for piece in pieces {
            match piece {
                Piece::Byte(v) => self.w.byte(*v),
                Piece::Half(v) => self.w.half(*v),
                Piece::Word(v) => self.w.word(*v),
                Piece::Ref(label) => {
                    self.fixups.push((self.w.bytes.len(), label.clone()));
                    self.w.word(0);
                }
                Piece::Str(s) => self.w.string(s),
            }
        }
    }
}

/// Encodes the nodes (and their descendants) as the contents of a .debug section.
/// Every record other than padding gets a sibling attribute pointing past its
/// children, and each non-empty child list ends with a null entry.
pub fn encode_debug(roots: &[Node], little_endian: bool) -> Vec<u8> {
    let mut encoder = Encoder {
        w: Writer::new(little_endian),
        labels: HashMap::new(),
        fixups: Vec::new(),
    };
    for root in roots {
        encoder.node(root);
    }
    for (at, label) in std::mem::take(&mut encoder.fixups) {
        let offset = *encoder
            .labels
            .get(&label)
            .unwrap_or_else(|| panic!("no node labeled {label}"));
        encoder.w.patch_word(at, offset);
    }
    encoder.w.bytes
}

/// A source line table: start address then (line, position, address delta) entries.
pub struct LineTable {
    pub start: u32,
    pub entries: Vec<(u32, u16, u32)>,
}

/// Returns the .line section contents and the offset of each table.
pub fn encode_lines(tables: &[LineTable], little_endian: bool) -> (Vec<u8>, Vec<u32>) {
    let mut w = Writer::new(little_endian);
    let mut offsets = Vec::new();
    for table in tables {
        offsets.push(w.bytes.len() as u32);
        w.word(8 + 10 * table.entries.len() as u32);
        w.word(table.start);
        for (line, position, delta) in &table.entries {
            w.word(*line);
            w.half(*position);
            w.word(*delta);
        }
    }
    (w.bytes, offsets)
}

/// An image with a .debug section, an optional .line section and optional code
/// mapped at a virtual address.
pub fn debug_image(
    little_endian: bool,
    roots: &[Node],
    lines: Option<Vec<u8>>,
    text: Option<(u32, Vec<u8>)>,
) -> ElfFile {
    let mut b = ElfBuilder::new(little_endian);
    if let Some((vaddr, code)) = text {
        let size = code.len() as u32;
        b.section(".text", SHT_PROGBITS, code);
        b.segment(vaddr, ".text", size);
    }
    b.section(DEBUG_SECTION, SHT_PROGBITS, encode_debug(roots, little_endian));
    if let Some(lines) = lines {
        b.section(LINE_SECTION, SHT_PROGBITS, lines);
    }
    ElfFile::load(b.build()).unwrap()
}

/// Location ops for common cases.
pub fn addr_location(addr: u32) -> Vec<Piece> {
    vec![Piece::Byte(0x03), Piece::Word(addr)]
}

pub fn frame_location(reg: u32, offset: i32) -> Vec<Piece> {
    vec![
        Piece::Byte(0x02),
        Piece::Word(reg),
        Piece::Byte(0x04),
        Piece::Word(offset as u32),
        Piece::Byte(0x07),
    ]
}
