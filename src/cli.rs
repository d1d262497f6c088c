//! Command line definitions. Each subcommand maps onto a function in the commands
//! module.
use crate::render::RenderSettings;
use crate::utils::{DiagnosticSettings, parse_u32};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Inspect DWARF v1 debug info and render it as C++", long_about = None)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Cli {
    /// Path to an ELF32 image
    pub image: PathBuf,

    #[command(flatten)]
    pub diagnostics: DiagnosticArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the ELF header
    Header(ExplainArgs),

    /// Show section headers
    Sections(TableArgs),

    /// Show program headers
    Segments(TableArgs),

    /// Show the static symbol table
    Symbols(TableArgs),

    /// Show compile units
    Units(TableArgs),

    /// Show functions along with their address ranges
    Functions(TableArgs),

    /// Show global and file static variables
    Variables(TableArgs),

    /// Show user defined types
    Types(TableArgs),

    /// Dump the raw debug records
    Tree(TreeArgs),

    /// Dump the raw line tables
    Lines(LinesArgs),

    /// Write C++ for all files, one file, or one entity
    Render(RenderArgs),

    /// Print memory range as hex and ascii
    Hexdump(HexdumpArgs),
}

#[derive(Args)]
pub struct DiagnosticArgs {
    /// Don't warn about records that aren't expected inside their parent
    #[arg(long, global = true)]
    pub no_unknown_entries: bool,

    /// Don't warn about unexpected attributes
    #[arg(long, global = true)]
    pub no_unknown_attributes: bool,

    /// Don't warn about location expressions that can't be simplified
    #[arg(long, global = true)]
    pub no_unrecognized_locations: bool,

    /// Don't warn about line entries outside every function
    #[arg(long, global = true)]
    pub no_unrecognized_lines: bool,

    /// Max number of warnings to print, 0 for unlimited
    #[arg(long, global = true, default_value_t = 100)]
    pub max_warnings: usize,
}

impl DiagnosticArgs {
    pub fn settings(&self) -> DiagnosticSettings {
        DiagnosticSettings {
            unknown_entries: !self.no_unknown_entries,
            unknown_attributes: !self.no_unknown_attributes,
            unrecognized_locations: !self.no_unrecognized_locations,
            unrecognized_lines: !self.no_unrecognized_lines,
            max_warnings: if self.max_warnings == 0 {
                None
            } else {
                Some(self.max_warnings)
            },
        }
    }
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,
}

#[derive(Args)]
pub struct TableArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only dump the record at this offset (and its children)
    #[arg(short, long, value_parser = parse_u32)]
    pub offset: Option<u32>,

    /// Max nesting depth to dump, 0 for just the starting records
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct LinesArgs {
    /// Only dump the table at this .line offset
    #[arg(short, long, value_parser = parse_u32)]
    pub offset: Option<u32>,
}

#[derive(Args)]
pub struct HexdumpArgs {
    /// Number of bytes to dump
    #[arg(short, long)]
    #[arg(default_value_t = 16)]
    pub count: usize,

    /// How to display the start of each row
    #[arg(short, long, name = "TYPE")]
    #[arg(default_value_t = HexdumpLabels::Addr)]
    pub labels: HexdumpLabels,

    /// A virtual address within a load segment
    #[arg(value_parser = parse_u32)]
    pub addr: u32,
}

#[derive(Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum HexdumpLabels {
    /// Show nothing at the start of lines
    None,

    /// Show the address for the first byte on each line
    Addr,

    /// Show the offset from the first byte on each line
    Zero,
}

impl fmt::Display for HexdumpLabels {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HexdumpLabels::None => fmt.write_str("none")?,
            HexdumpLabels::Addr => fmt.write_str("addr")?,
            HexdumpLabels::Zero => fmt.write_str("zero")?,
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Colored using the styles file
    Styled,

    /// No markup at all
    Plain,

    /// Tokens wrapped in spans
    Html,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputFormat::Styled => fmt.write_str("styled")?,
            OutputFormat::Plain => fmt.write_str("plain")?,
            OutputFormat::Html => fmt.write_str("html")?,
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Render every compile unit with this path
    #[arg(short, long, group = "target")]
    pub file: Option<String>,

    /// Render the compile unit, type, variable or function at this record offset
    #[arg(short, long, group = "target", value_parser = parse_u32)]
    pub offset: Option<u32>,

    /// How to mark up the output
    #[arg(long, default_value_t = OutputFormat::Styled)]
    pub format: OutputFormat,

    /// Drop every trailing comment (addresses, offsets, sizes, etc.)
    #[arg(long)]
    pub no_comments: bool,

    /// Omit classes, structs and unions
    #[arg(long)]
    pub no_classes: bool,

    /// Omit enums
    #[arg(long)]
    pub no_enums: bool,

    /// Omit array typedefs
    #[arg(long)]
    pub no_arrays: bool,

    /// Omit function typedefs
    #[arg(long)]
    pub no_function_types: bool,

    /// Omit pointer to member typedefs
    #[arg(long)]
    pub no_pointer_to_member_types: bool,

    /// Omit variables
    #[arg(long)]
    pub no_variables: bool,

    /// Omit function declarations
    #[arg(long)]
    pub no_declarations: bool,

    /// Omit function definitions
    #[arg(long)]
    pub no_definitions: bool,

    /// Omit the DWARF offset comments
    #[arg(long)]
    pub no_entry_offsets: bool,

    /// Omit parameter and local variable locations
    #[arg(long)]
    pub no_locations: bool,

    /// Sort types by name
    #[arg(long)]
    pub sort_types: bool,

    /// Sort functions by address
    #[arg(long)]
    pub sort_functions: bool,

    /// Write types named "@..." where they're used instead of by name
    #[arg(long)]
    pub no_inline_anonymous: bool,

    /// Write enumerator values in hex
    #[arg(long)]
    pub hex_enums: bool,

    /// Write every enumerator value
    #[arg(long)]
    pub explicit_enums: bool,

    /// Add disassembly to function definitions
    #[arg(short, long)]
    pub disassemble: bool,
}

impl RenderArgs {
    pub fn settings(&self, diagnostics: DiagnosticSettings) -> RenderSettings {
        let mut settings = RenderSettings::default();
        if self.no_comments {
            settings = settings.without_comments();
        }
        settings.classes = !self.no_classes;
        settings.enums = !self.no_enums;
        settings.arrays = !self.no_arrays;
        settings.function_types = !self.no_function_types;
        settings.pointer_to_member_types = !self.no_pointer_to_member_types;
        settings.variables = !self.no_variables;
        settings.function_declarations = !self.no_declarations;
        settings.function_definitions = !self.no_definitions;
        if self.no_entry_offsets {
            settings.entry_offsets = false;
        }
        if self.no_locations {
            settings.variable_locations = false;
        }
        settings.sort_types_alphabetically = self.sort_types;
        settings.sort_functions_by_address = self.sort_functions;
        settings.inline_anonymous_types = !self.no_inline_anonymous;
        settings.hexadecimal_enum_values = self.hex_enums;
        settings.force_explicit_enum_values = self.explicit_enums;
        settings.disassembly = self.disassemble;
        settings.diagnostics = diagnostics;
        settings
    }
}
