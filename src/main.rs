mod cli;
mod commands;
mod debug;
mod disasm;
mod elf;
mod error;
mod model;
mod render;
#[cfg(test)]
mod testing;
mod utils;

use clap::Parser;
use cli::{Cli, Command};
use debug::DebugInfo;
use elf::ElfFile;
use error::DebugError;
use model::Model;
use std::io;
use std::path::Path;
use std::process;
use utils::{Diagnostics, warn};

fn load_image(path: &Path) -> ElfFile {
    match ElfFile::open(path) {
        Ok(image) => image,
        Err(e) => {
            warn(&format!("Couldn't load {}: {e}", path.display()));
            process::exit(1);
        }
    }
}

fn load_debug(image: &ElfFile) -> DebugInfo {
    match DebugInfo::load(image) {
        Ok(debug) => debug,
        Err(DebugError::SectionNotFound(name)) => {
            println!("No debug info ({name} section is missing).");
            process::exit(0);
        }
        Err(e) => {
            warn(&format!("Couldn't decode debug info: {e}"));
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    utils::generate_style_file();

    let image = load_image(&cli.image);
    let out = io::stdout().lock();

    // commands that only need the ELF structures
    match &cli.command {
        Command::Header(args) => return commands::header(&image, args, out),
        Command::Sections(args) => return commands::sections(&image, args, out),
        Command::Segments(args) => return commands::segments(&image, args, out),
        Command::Symbols(args) => return commands::symbols(&image, args, out),
        Command::Hexdump(args) => return commands::hexdump(&image, args, out),
        _ => (),
    }

    let debug = load_debug(&image);
    match &cli.command {
        Command::Tree(args) => return commands::tree(&debug, args, out),
        Command::Lines(args) => return commands::lines(&debug, args, out),
        _ => (),
    }

    let mut diagnostics = Diagnostics::new(cli.diagnostics.settings());
    let model = Model::build(&debug, &mut diagnostics);
    match &cli.command {
        Command::Units(args) => commands::units(&model, args, out),
        Command::Functions(args) => commands::functions(&model, args, out),
        Command::Variables(args) => commands::variables(&model, args, out),
        Command::Types(args) => commands::types(&model, args, out),
        Command::Render(args) => {
            let settings = args.settings(cli.diagnostics.settings());
            commands::render(&image, &model, args, &settings, out);
        }
        _ => unreachable!("handled above"),
    }
    diagnostics.flush();
}
