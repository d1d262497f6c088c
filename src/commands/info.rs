use super::tables::{ColKind, add_field};
use crate::cli::TableArgs;
use crate::commands::tables::TableBuilder;
use crate::debug::language_name;
use crate::model::{Model, UserType};
use crate::render::demangle;
use std::io::Write;

pub fn units(model: &Model, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("offset", ColKind::Hex, "offset of the compile unit record");
    builder.add_col("name", ColKind::Text, "path of the primary source file");
    builder.add_col("producer", ColKind::Text, "the compiler that generated the unit");
    builder.add_col("language", ColKind::Text, "the source language");
    builder.add_col("lines", ColKind::Number, "number of entries in the unit's line table");
    builder.add_col("types", ColKind::Number, "number of user defined types");
    builder.add_col("functions", ColKind::Number, "number of functions");
    builder.add_col("variables", ColKind::Number, "number of global and file static variables");

    for file in &model.files {
        let lines = file
            .line_table
            .and_then(|offset| model.debug.line_table(offset))
            .map_or(0, |table| table.entries.len());
        builder.add_hex_field("offset", file.offset);
        add_field!(builder, "name", file.name);
        add_field!(builder, "producer", file.producer.clone().unwrap_or_default());
        add_field!(builder, "language", file.language.map(language_name).unwrap_or_default());
        add_field!(builder, "lines", lines);
        add_field!(builder, "types", file.types.len());
        add_field!(builder, "functions", file.functions.len());
        add_field!(builder, "variables", file.variables.len());
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn functions(model: &Model, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("offset", ColKind::Hex, "offset of the subroutine record");
    builder.add_col("name", ColKind::Text, "the function name, qualified for member functions");
    builder.add_col("low", ColKind::Hex, "address of the first instruction");
    builder.add_col("high", ColKind::Hex, "address after the last instruction");
    builder.add_col("size", ColKind::Number, "size of the code in bytes");
    builder.add_col("lines", ColKind::Number, "number of line table entries within the function");
    builder.add_col("file", ColKind::Text, "the compile unit the function was declared in");

    for file in &model.files {
        for f in model.file_functions(file) {
            let class = f.member_of.map(move |offset| model.type_name(offset));
            let name = match class {
                Some(class) => format!("{class}::{}", demangle(f.name(), Some(class))),
                None => demangle(f.name(), None),
            };
            builder.add_hex_field("offset", f.offset());
            add_field!(builder, "name", name);
            builder.add_hex_field("low", f.low_pc);
            builder.add_hex_field("high", f.high_pc);
            add_field!(builder, "size", f.size());
            add_field!(builder, "lines", f.lines.len());
            add_field!(builder, "file", file.name);
        }
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn variables(model: &Model, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("offset", ColKind::Hex, "offset of the variable record");
    builder.add_col("name", ColKind::Text, "the variable name");
    builder.add_col("scope", ColKind::Text, "global or static to its file");
    builder.add_col("address", ColKind::Hex, "where the variable lives if it has a fixed address");
    builder.add_col("file", ColKind::Text, "the compile unit the variable was declared in");

    for file in &model.files {
        for v in model.file_variables(file) {
            builder.add_hex_field("offset", v.offset);
            add_field!(builder, "name", v.name);
            add_field!(builder, "scope", if v.is_global { "global" } else { "static" });
            add_field!(builder, "address", optional_hex(v.address));
            add_field!(builder, "file", file.name);
        }
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn types(model: &Model, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col("offset", ColKind::Hex, "offset of the type record");
    builder.add_col("kind", ColKind::Text, "class, struct, union, enum, array, function or pointer to member");
    builder.add_col("name", ColKind::Text, "the type name, empty for anonymous types");
    builder.add_col("size", ColKind::Number, "size in bytes if known");
    builder.add_col("file", ColKind::Text, "the compile unit the type was declared in");

    for file in &model.files {
        for t in model.file_types(file) {
            let (kind, size) = match t {
                UserType::Class(c) => (c.kind.keyword(), Some(c.byte_size)),
                UserType::Enum(e) => ("enum", e.byte_size),
                UserType::Array(_) => ("array", None),
                UserType::Function(_) => ("function", None),
                UserType::PointerToMember(_) => ("pointer to member", None),
            };
            builder.add_hex_field("offset", t.offset());
            add_field!(builder, "kind", kind);
            add_field!(builder, "name", t.name());
            add_field!(builder, "size", size.map(|n| n.to_string()).unwrap_or_default());
            add_field!(builder, "file", file.name);
        }
    }

    builder.writeln(out, args.titles, args.explain);
}

fn optional_hex(value: Option<u32>) -> String {
    value.map(|n| format!("{n:x}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{DebugInfo, FT_INTEGER};
    use crate::testing::{Node, Value, addr_location, encode_debug};
    use crate::utils::{DiagnosticSettings, Diagnostics, strip_escapes};

    const TAG_ENUM: u16 = 0x04;
    const TAG_GLOBAL_FUNC: u16 = 0x06;
    const TAG_GLOBAL_VAR: u16 = 0x07;
    const TAG_LOCAL: u16 = 0x0c;
    const TAG_CU: u16 = 0x11;
    const TAG_STRUCT: u16 = 0x13;
    const AT_PRODUCER: u16 = 0x0258;
    const AT_MEMBER: u16 = 0x0142;

    fn debug() -> DebugInfo {
        let roots = vec![
            Node::new(TAG_CU)
                .name("main.cpp")
                .attr(AT_PRODUCER, Value::Str("MW EABI PPC C-Compiler".to_string()))
                .children(vec![
                    Node::new(TAG_STRUCT).label("Point").name("Point").byte_size(8),
                    Node::new(TAG_ENUM).name("Color"),
                    Node::new(TAG_GLOBAL_VAR)
                        .name("origin")
                        .user_type("Point")
                        .location(addr_location(0x8000_2000)),
                    Node::new(TAG_LOCAL).name("hidden").fund_type(FT_INTEGER),
                    Node::new(TAG_GLOBAL_FUNC)
                        .name("__ct")
                        .attr(AT_MEMBER, Value::Ref("Point".to_string()))
                        .low_pc(0x8000_0100)
                        .high_pc(0x8000_0120),
                ]),
        ];
        DebugInfo::decode(&encode_debug(&roots, false), None, false).unwrap()
    }

    fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        strip_escapes(&String::from_utf8(out).unwrap())
    }

    fn args() -> TableArgs {
        TableArgs {
            explain: false,
            titles: true,
        }
    }

    #[test]
    fn listings() {
        let debug = debug();
        let mut d = Diagnostics::new(DiagnosticSettings::default());
        let model = Model::build(&debug, &mut d);

        let text = output(|out| units(&model, &args(), out));
        assert!(text.contains("main.cpp"), "{text}");
        assert!(text.contains("MW EABI PPC C-Compiler"), "{text}");

        let text = output(|out| functions(&model, &args(), out));
        assert!(text.contains("Point::Point"), "{text}");
        assert!(text.contains("80000100"), "{text}");
        assert!(text.contains("32"), "{text}");

        let text = output(|out| variables(&model, &args(), out));
        assert!(text.contains("origin"), "{text}");
        assert!(text.contains("80002000"), "{text}");
        assert!(text.contains("hidden"), "{text}");
        assert!(text.contains("static"), "{text}");

        let text = output(|out| types(&model, &args(), out));
        assert!(text.contains("struct"), "{text}");
        assert!(text.contains("Color"), "{text}");
        assert!(text.contains("enum"), "{text}");
    }
}
