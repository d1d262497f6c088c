use crate::cli::{LinesArgs, TreeArgs};
use crate::debug::{Attribute, AttributeName, AttributeValue, DebugInfo, Location};
use crate::render::FundamentalNames;
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::io::Write;

/// Dumps records with their attributes, children are indented under their parent.
/// Padding records are skipped.
pub fn tree(debug: &DebugInfo, args: &TreeArgs, mut out: impl Write) {
    let names = FundamentalNames::default();
    let starts: Vec<usize> = match args.offset {
        Some(offset) => match debug.find(offset) {
            Some(index) => vec![index],
            None => {
                uwriteln!(out, "No record at offset {offset:#x}.");
                return;
            }
        },
        None => debug.roots().collect(),
    };
    for index in starts {
        dump_record(debug, &names, index, 0, args.depth, &mut out);
    }
}

fn dump_record(
    debug: &DebugInfo,
    names: &FundamentalNames,
    index: usize,
    level: usize,
    max_depth: Option<usize>,
    out: &mut impl Write,
) {
    let record = debug.record(index);
    if record.is_padding() {
        return;
    }
    let indent = "    ".repeat(level);
    uwriteln!(out, "{indent}{:#x}: {}", record.offset, record.tag.to_string().tree_tag());
    for attr in debug.attributes(index) {
        if attr.name() != AttributeName::DW_AT_sibling {
            let name = attr.name().to_string();
            let value = attribute_text(attr, names, debug.little_endian);
            uwriteln!(out, "{indent}    {}: {value}", name.tree_attr());
        }
    }
    if max_depth.is_none_or(|max| level < max) {
        for child in debug.children(index) {
            dump_record(debug, names, child, level + 1, max_depth, out);
        }
    }
}

/// The raw value plus a decoded form for the payloads that are hard to read.
fn attribute_text(attr: &Attribute, names: &FundamentalNames, little_endian: bool) -> String {
    match (attr.name(), &attr.value) {
        (AttributeName::DW_AT_fund_type, AttributeValue::Data2(ft)) => {
            format!("{ft:#x} ({})", names.name(*ft))
        }
        (AttributeName::DW_AT_location, AttributeValue::Block(block)) => {
            match Location::decode(block, little_endian) {
                Ok(location) => location.to_string(),
                Err(err) => format!("{} ({err})", attr.value),
            }
        }
        _ => attr.value.to_string(),
    }
}

pub fn lines(debug: &DebugInfo, args: &LinesArgs, mut out: impl Write) {
    let mut found = false;
    for table in debug.line_tables() {
        if args.offset.is_some_and(|offset| offset != table.offset) {
            continue;
        }
        if found {
            uwriteln!(out);
        }
        found = true;

        uwriteln!(
            out,
            "{}: start {:#x}, {} entries",
            format!("{:#x}", table.offset).tree_tag(),
            table.start,
            table.entries.len()
        );
        for entry in &table.entries {
            let line = match entry.position {
                Some(position) => format!("{}:{position}", entry.line),
                None => entry.line.to_string(),
            };
            uwriteln!(out, "    line {line} at {:#x}", entry.address);
        }
    }
    if !found {
        uwriteln!(out, "No line tables found.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::FT_INTEGER;
    use crate::testing::{LineTable, Node, addr_location, encode_debug, encode_lines};
    use crate::utils::strip_escapes;

    const TAG_GLOBAL_VAR: u16 = 0x07;
    const TAG_CU: u16 = 0x11;

    fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        strip_escapes(&String::from_utf8(out).unwrap())
    }

    fn debug() -> DebugInfo {
        let roots = vec![
            Node::new(TAG_CU).name("a.cpp").child(
                Node::new(TAG_GLOBAL_VAR)
                    .name("g")
                    .fund_type(FT_INTEGER)
                    .location(addr_location(0x8000_1000)),
            ),
        ];
        let (lines, _) = encode_lines(
            &[LineTable {
                start: 0x1000,
                entries: vec![(10, 0xffff, 0), (11, 4, 4)],
            }],
            false,
        );
        DebugInfo::decode(&encode_debug(&roots, false), Some(&lines), false).unwrap()
    }

    #[test]
    fn records() {
        let debug = debug();
        let args = TreeArgs {
            offset: None,
            depth: None,
        };
        insta::assert_snapshot!(output(|out| tree(&debug, &args, out)), @r"
        0x0: DW_TAG_compile_unit
            DW_AT_name: a.cpp
            0x14: DW_TAG_global_variable
                DW_AT_name: g
                DW_AT_fund_type: 0x7 (int)
                DW_AT_location: 0x80001000
        ");

        let args = TreeArgs {
            offset: None,
            depth: Some(0),
        };
        insta::assert_snapshot!(output(|out| tree(&debug, &args, out)), @r"
        0x0: DW_TAG_compile_unit
            DW_AT_name: a.cpp
        ");

        let args = TreeArgs {
            offset: Some(0x3),
            depth: None,
        };
        assert_eq!(output(|out| tree(&debug, &args, out)), "No record at offset 0x3.\n");
    }

    #[test]
    fn line_tables() {
        let debug = debug();
        let args = LinesArgs { offset: None };
        insta::assert_snapshot!(output(|out| lines(&debug, &args, out)), @r"
        0x0: start 0x1000, 2 entries
            line 10 at 0x1000
            line 11:4 at 0x1004
        ");

        let args = LinesArgs { offset: Some(0x40) };
        assert_eq!(output(|out| lines(&debug, &args, out)), "No line tables found.\n");
    }
}
