use super::tables::{ColKind, add_field, add_item};
use crate::cli::{ExplainArgs, TableArgs};
use crate::commands::tables::{ListBuilder, TableBuilder};
use crate::elf::{ElfFile, ProgramHeader, SectionHeader, SymbolIndex};
use crate::utils::uwriteln;
use std::io::Write;

pub fn header(file: &ElfFile, args: &ExplainArgs, out: impl Write) {
    let mut b = ListBuilder::new();
    add_item!(b, "type", file.header.stype(), "type of ELF file");
    if file.reader.little_endian {
        add_item!(
            b,
            "little endian",
            file.reader.little_endian,
            "words are being laid out in memory with the most significant byte last"
        );
    } else {
        add_item!(
            b,
            "little endian",
            file.reader.little_endian,
            "words are being laid out in memory with the most significant byte first"
        );
    }
    add_item!(b, "machine", file.header.machine(), "CPU architecture");
    add_item!(b, "osabi", file.header.osabi, "the OS the binary was compiled for");
    add_item!(b, "entry", "{:#x}", file.header.entry, "address the program starts executing at");
    add_item!(b, "flags", "{:#x}", file.header.flags, "processor specific flags");
    add_item!(
        b,
        "ph_offset",
        file.header.ph_offset,
        "offset in the ELF file to the Program Header table"
    );
    add_item!(
        b,
        "num_ph_entries",
        file.header.num_ph_entries,
        "number of entries in the Program Header table"
    );
    add_item!(
        b,
        "section_offset",
        file.header.section_offset,
        "offset in the ELF file to the section header table"
    );
    add_item!(
        b,
        "num_section_entries",
        file.header.num_section_entries,
        "number of entries in the section header table"
    );
    add_item!(
        b,
        "string_table_index",
        file.header.string_table_index,
        "section index containing the section names"
    );
    b.writeln(out, args.explain);
}

pub fn sections(file: &ElfFile, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("index", ColKind::Number, "index into sections.");
    builder.add_col("name", ColKind::Text, "section name, e.g. .debug or .line.");
    builder.add_col("type", ColKind::Text, "type of the section.");
    builder.add_col("vaddr", ColKind::Hex, "virtual address at execution.");
    builder.add_col("offset", ColKind::Hex, "offset into the ELF file for the start of the section.");
    builder.add_col("size", ColKind::Number, "section size in bytes.");
    builder.add_col("entry_size", ColKind::Number, "set if the section holds a table of entries.");
    builder.add_col("align", ColKind::Number, "section alignment.");
    builder.add_col(
        "link",
        ColKind::Number,
        "link to another section with related information, usually a string or symbol table.",
    );
    builder.add_col("info", ColKind::Number, "additional section info");
    builder.add_col("flags", ColKind::Text, "write, alloc, and/or exec.");

    for (i, section) in file.sections.iter().enumerate() {
        add_field!(builder, "index", i); // sections are often referenced by index so this is handy
        add_field!(builder, "name", section.name);
        add_field!(builder, "type", "{:?}", section.stype);
        builder.add_hex_field("vaddr", section.vbytes.start.0);
        builder.add_hex_field("offset", section.obytes.start.0);
        add_field!(builder, "size", section.vbytes.size);
        add_field!(builder, "entry_size", section.entry_size);
        add_field!(builder, "align", section.align);
        add_field!(builder, "link", section.link);
        add_field!(builder, "info", section.info);
        add_field!(builder, "flags", SectionHeader::flags(section.flags));
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn segments(file: &ElfFile, args: &TableArgs, mut out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("type", ColKind::Text, "the segment type");
    builder.add_col("offset", ColKind::Hex, "the offset into the ELF file at which the segment appears");
    builder.add_col("vaddr", ColKind::Hex, "the virtual address the segment starts at");
    builder.add_col("file size", ColKind::Hex, "the size of the segment on disk");
    builder.add_col("memory size", ColKind::Hex, "the size of the segment in memory");
    builder.add_col("flags", ColKind::Text, "executable, writeable, and/or readable");

    for segment in file.segments.iter() {
        add_field!(builder, "type", "{:?}", segment.stype);
        builder.add_hex_field("offset", segment.obytes.start.0);
        builder.add_hex_field("vaddr", segment.vbytes.start.0);
        builder.add_hex_field("file size", segment.obytes.size);
        builder.add_hex_field("memory size", segment.vbytes.size);
        add_field!(builder, "flags", "{}", ProgramHeader::flags(segment.flags));
    }

    builder.writeln(&mut out, args.titles, args.explain);
    if args.explain {
        uwriteln!(out);
        uwriteln!(out, "Numeric fields are all in hex. Only Load segments are used to map");
        uwriteln!(out, "addresses to bytes, e.g. for `hexdump` and disassembly.");
    }
}

pub fn symbols(file: &ElfFile, args: &TableArgs, mut out: impl Write) {
    let Some(table) = &file.symbols else {
        uwriteln!(out, "No symbol table found.");
        return;
    };

    let mut builder = TableBuilder::new();
    builder.add_col("index", ColKind::Number, "symbol index");
    builder.add_col("name", ColKind::Text, "the symbol name");
    builder.add_col("type", ColKind::Text, "the symbol type");
    builder.add_col("value", ColKind::Hex, "address, absolute value, etc");
    builder.add_col("size", ColKind::Number, "size of the value, 0 for unknown or undefined");
    builder.add_col("binding", ColKind::Text, "linkage visibility and behavior");
    builder.add_col(
        "related",
        ColKind::Text,
        "indicates a related section or marks the entry as an absolute value",
    );

    for (i, e) in table.entries.iter().enumerate() {
        add_field!(builder, "index", i);
        add_field!(builder, "name", e.name);
        add_field!(builder, "type", "{:?}", e.stype);
        builder.add_hex_field("value", e.value);
        add_field!(builder, "size", e.size);
        add_field!(builder, "binding", "{:?}", e.binding);
        add_field!(builder, "related", index_to_str(file, e.index));
    }

    builder.writeln(out, args.titles, args.explain);
}

fn index_to_str(file: &ElfFile, index: SymbolIndex) -> String {
    match index {
        SymbolIndex::Abs => "Value".to_string(),
        SymbolIndex::Common => "Common".to_string(),
        SymbolIndex::Index(i) => file
            .section(i)
            .map(|s| s.name.clone())
            .unwrap_or("bad section index".to_string()),
        SymbolIndex::Undef => "".to_string(),
    }
}
