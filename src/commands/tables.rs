//! Column tables (e.g. `sections`) and name/value lists (e.g. `header`) built with
//! tabled. Either can be followed by a description of each column or row.
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::fmt::LowerHex;
use std::io::Write;
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Padding, Style, object::Columns},
};

/// How a column's cells are aligned and described.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColKind {
    /// Names, paths, flags: left aligned.
    Text,

    /// Counts and sizes: right aligned.
    Number,

    /// Offsets and addresses: right aligned, lower case hex without a prefix.
    Hex,
}

impl ColKind {
    fn alignment(self) -> Alignment {
        match self {
            ColKind::Text => Alignment::left(),
            ColKind::Number | ColKind::Hex => Alignment::right(),
        }
    }
}

struct Column {
    header: &'static str,
    kind: ColKind,
    help: String,
    cells: Vec<String>,
}

/// A table with one row per item, e.g. for `functions --titles`:
/// offset  name          low       high  size
/// ------  ----          ---       ----  ----
///     b2  main     80003100   80003164   100
///    1f0  Point::Point 80003164 80003190  44
pub struct TableBuilder {
    cols: Vec<Column>,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder { cols: Vec::new() }
    }

    pub fn add_col(&mut self, header: &'static str, kind: ColKind, help: &str) {
        debug_assert!(self.cols.iter().all(|c| c.header != header), "duplicate {header} column");
        let help = match kind {
            ColKind::Hex => format!("{help} (hex)"),
            _ => help.to_string(),
        };
        self.cols.push(Column {
            header,
            kind,
            help,
            cells: Vec::new(),
        });
    }

    /// Typically add_field! is used instead.
    pub fn add_str_field(&mut self, header: &str, value: String) {
        // tabled misaligns rows that contain empty cells
        let value = if value.is_empty() { " ".to_string() } else { value };
        self.column(header).cells.push(value.table_field().to_string());
    }

    pub fn add_hex_field(&mut self, header: &str, value: impl LowerHex) {
        debug_assert_eq!(self.column(header).kind, ColKind::Hex, "{header} isn't a hex column");
        self.add_str_field(header, format!("{value:x}"));
    }

    pub fn writeln(&self, mut out: impl Write, titles: bool, explain: bool) {
        uwriteln!(out, "{}", self.table_str(titles));
        if explain {
            let rows = self.cols.iter().map(|c| (c.header, c.help.as_str()));
            uwriteln!(out);
            uwriteln!(out, "{}", explanations(rows));
        }
    }

    /// Panics if the column wasn't added: the header names are all literals.
    fn column(&mut self, header: &str) -> &mut Column {
        self.cols
            .iter_mut()
            .find(|c| c.header == header)
            .unwrap_or_else(|| panic!("no {header} column"))
    }

    fn table_str(&self, titles: bool) -> String {
        let height = self.cols.first().map_or(0, |c| c.cells.len());
        debug_assert!(self.cols.iter().all(|c| c.cells.len() == height), "ragged table");

        let mut builder = Builder::with_capacity(height + 2, self.cols.len());
        if titles {
            let headers: Vec<String> = self.cols.iter().map(|c| c.header.table_header().to_string()).collect();
            let dashes: Vec<String> = self
                .cols
                .iter()
                .map(|c| "-".repeat(c.header.len()).table_sep().to_string())
                .collect();
            builder.push_record(headers);
            builder.push_record(dashes);
        }
        for i in 0..height {
            let row: Vec<String> = self.cols.iter().map(|c| c.cells[i].clone()).collect();
            builder.push_record(row);
        }

        let mut table = builder.build();
        for (i, col) in self.cols.iter().enumerate() {
            table.modify(Columns::one(i), col.kind.alignment());
        }
        finish(table)
    }
}

/// Adds a cell to the named column, styled as a table field.
macro_rules! add_field {
    ($builder:ident, $header:literal, $value:expr) => {
        $builder.add_str_field($header, format!("{}", $value));
    };
    ($builder:ident, $header:literal, $format:literal, $value:expr) => {
        $builder.add_str_field($header, format!($format, $value));
    };
}
pub(crate) use add_field;

/// Name/value pairs without titles, e.g. for `header`:
/// type           executable
/// little endian  false
/// machine        PowerPC
pub struct ListBuilder {
    rows: Vec<(&'static str, String, &'static str)>,
}

impl ListBuilder {
    pub fn new() -> ListBuilder {
        ListBuilder { rows: Vec::new() }
    }

    /// Typically add_item! is used instead.
    pub fn add_str_item(&mut self, name: &'static str, value: String, help: &'static str) {
        self.rows.push((name, value.table_field().to_string(), help));
    }

    pub fn writeln(&self, mut out: impl Write, explain: bool) {
        let mut builder = Builder::with_capacity(self.rows.len(), 2);
        for (name, value, _) in &self.rows {
            builder.push_record([name.to_string(), value.clone()]);
        }
        let mut table = builder.build();
        table.modify(Columns::one(0), Alignment::left());
        table.modify(Columns::one(1), Alignment::left());
        uwriteln!(out, "{}", finish(table));

        if explain {
            let rows = self.rows.iter().map(|(name, _, help)| (*name, *help));
            uwriteln!(out);
            uwriteln!(out, "{}", explanations(rows));
        }
    }
}

macro_rules! add_item {
    ($builder:ident, $name:literal, $value:expr, $help:expr) => {
        $builder.add_str_item($name, format!("{}", $value), $help);
    };
    ($builder:ident, $name:literal, $format:literal, $value:expr, $help:expr) => {
        $builder.add_str_item($name, format!($format, $value), $help);
    };
}
pub(crate) use add_item;

fn finish(mut table: Table) -> String {
    table.modify(Columns::first(), Padding::new(0, 1, 0, 0));
    table.with(Style::empty());
    table.to_string()
}

fn explanations<'a>(rows: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let lines: Vec<String> = rows
        .map(|(name, help)| format!("{}: {}", name.explain_title(), help.explain_text()))
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::strip_escapes;

    fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        strip_escapes(&String::from_utf8(out).unwrap())
    }

    #[test]
    fn columns() {
        let mut builder = TableBuilder::new();
        builder.add_col("offset", ColKind::Hex, "record offset");
        builder.add_col("name", ColKind::Text, "the name");
        builder.add_col("size", ColKind::Number, "size in bytes");
        for (offset, name, size) in [(0xb2u32, "main", 100), (0x1f0, "", 4)] {
            builder.add_hex_field("offset", offset);
            add_field!(builder, "name", name);
            add_field!(builder, "size", size);
        }

        let text = output(|out| builder.writeln(out, true, true));
        let lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
        let words: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(words, vec!["offset", "name", "size"]);
        assert!(lines[1].starts_with("------"), "{text}");
        assert!(lines[2].trim_start().starts_with("b2"), "{text}");
        assert!(lines[2].ends_with(" 100"), "{text}");
        assert!(lines[3].trim_start().starts_with("1f0"), "{text}");
        assert!(lines[3].ends_with(" 4"), "{text}");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "offset: record offset (hex)");
        assert_eq!(lines[6], "name: the name");
        assert_eq!(lines[7], "size: size in bytes");

        let text = output(|out| builder.writeln(out, false, false));
        assert_eq!(text.lines().count(), 2, "{text}");
    }

    #[test]
    fn items() {
        let mut builder = ListBuilder::new();
        add_item!(builder, "machine", "PowerPC", "CPU architecture");
        add_item!(builder, "entry", "{:#x}", 0x8000_3100u32, "start address");

        let text = output(|out| builder.writeln(out, false));
        let lines: Vec<Vec<&str>> = text.lines().map(|line| line.split_whitespace().collect()).collect();
        assert_eq!(lines, vec![vec!["machine", "PowerPC"], vec!["entry", "0x80003100"]]);

        let text = output(|out| builder.writeln(out, true));
        assert!(text.ends_with("machine: CPU architecture\nentry: start address\n"), "{text}");
    }
}
