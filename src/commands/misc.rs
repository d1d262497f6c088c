use crate::cli::{HexdumpArgs, HexdumpLabels, OutputFormat, RenderArgs};
use crate::disasm;
use crate::elf::{ElfFile, VirtualAddr};
use crate::model::Model;
use crate::render::{RenderSettings, Renderer};
use crate::utils::uwriteln;
use crate::utils::{Styling, warn};
use std::io::Write;

const BYTES_PER_ROW: usize = 16;

/// Prints the bytes backing a virtual address, 16 to a row with an ascii column.
pub fn hexdump(file: &ElfFile, args: &HexdumpArgs, mut out: impl Write) {
    let Some(bytes) = file.address_to_data(VirtualAddr(args.addr)) else {
        warn(&format!("couldn't find a load segment with file bytes for {:#x}", args.addr));
        return;
    };
    if bytes.len() < args.count {
        warn(&format!(
            "only {} bytes are available at {:#x}",
            bytes.len(),
            args.addr
        ));
    }
    let bytes = &bytes[..args.count.min(bytes.len())];

    for (row, chunk) in bytes.chunks(BYTES_PER_ROW).enumerate() {
        let delta = (row * BYTES_PER_ROW) as u32;
        let label = match args.labels {
            HexdumpLabels::None => String::new(),
            HexdumpLabels::Addr => format!("{:08x}  ", args.addr.wrapping_add(delta)),
            HexdumpLabels::Zero => format!("{delta:08x}  "),
        };
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let hex = format!("{:<width$}", hex.join(" "), width = BYTES_PER_ROW * 3 - 1);
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        uwriteln!(out, "{}{}  {}", label.hex_offset(), hex.hex_hex(), ascii.hex_ascii());
    }
}

/// Renders everything, a compile unit, or a single entity. Disassembly is skipped
/// with a warning when the image's machine isn't supported.
pub fn render(image: &ElfFile, model: &Model, args: &RenderArgs, settings: &RenderSettings, mut out: impl Write) {
    let disassembler = if settings.disassembly {
        match disasm::for_machine(image.header.machine) {
            Ok(disassembler) => Some(disassembler),
            Err(err) => {
                warn(&format!("can't disassemble: {err}"));
                None
            }
        }
    } else {
        None
    };

    let mut renderer = Renderer::new(model, settings);
    if let Some(disassembler) = &disassembler {
        renderer = renderer.with_disassembly(image, disassembler.as_ref());
    }
    let code = if let Some(path) = &args.file {
        let code = renderer.render_path(path);
        if code.is_empty() {
            warn(&format!("no compile unit named {path}"));
        }
        code
    } else if let Some(offset) = args.offset {
        let code = renderer.render_entry(offset);
        if code.is_empty() {
            warn(&format!("nothing to render at offset {offset:#x}"));
        }
        code
    } else {
        renderer.render_all()
    };

    let text = match args.format {
        OutputFormat::Styled => code.to_styled(),
        OutputFormat::Plain => code.to_plain_text(),
        OutputFormat::Html => code.to_html(),
    };
    if !text.is_empty() {
        uwriteln!(out, "{}", text.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::debug::{DebugInfo, FT_INTEGER};
    use crate::testing::{Node, debug_image};
    use crate::utils::{DiagnosticSettings, Diagnostics, strip_escapes};
    use clap::Parser;

    const TAG_GLOBAL_FUNC: u16 = 0x06;
    const TAG_GLOBAL_VAR: u16 = 0x07;
    const TAG_CU: u16 = 0x11;

    fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        strip_escapes(&String::from_utf8(out).unwrap())
    }

    fn image() -> ElfFile {
        let roots = vec![
            Node::new(TAG_CU).name("a.cpp").children(vec![
                Node::new(TAG_GLOBAL_VAR).name("g").fund_type(FT_INTEGER),
                Node::new(TAG_GLOBAL_FUNC)
                    .name("one")
                    .fund_type(FT_INTEGER)
                    .low_pc(0x8000_0000)
                    .high_pc(0x8000_0008),
            ]),
        ];
        let code = vec![0x38, 0x60, 0x00, 0x01, 0x4e, 0x80, 0x00, 0x20];
        debug_image(false, &roots, None, Some((0x8000_0000, code)))
    }

    fn render_args(extra: &[&str]) -> RenderArgs {
        let mut argv = vec!["dwarfview", "a.elf", "render", "--format", "plain", "--no-comments"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Render(args) => args,
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn hex_rows() {
        let file = image();
        let args = HexdumpArgs {
            count: 8,
            labels: HexdumpLabels::Addr,
            addr: 0x8000_0000,
        };
        let text = output(|out| hexdump(&file, &args, out));
        assert_eq!(
            text,
            format!("80000000  38 60 00 01 4e 80 00 20{}  8`..N.. \n", " ".repeat(24))
        );

        let args = HexdumpArgs {
            count: 4,
            labels: HexdumpLabels::None,
            addr: 0x8000_0004,
        };
        let text = output(|out| hexdump(&file, &args, out));
        assert!(text.starts_with("4e 80 00 20 "), "{text}");

        let args = HexdumpArgs {
            count: 4,
            labels: HexdumpLabels::Zero,
            addr: 0x100,
        };
        assert_eq!(output(|out| hexdump(&file, &args, out)), "");
    }

    #[test]
    fn render_targets() {
        let file = image();
        let debug = DebugInfo::load(&file).unwrap();
        let mut d = Diagnostics::new(DiagnosticSettings::default());
        let model = Model::build(&debug, &mut d);

        let args = render_args(&["--no-declarations"]);
        let settings = args.settings(DiagnosticSettings::default());
        insta::assert_snapshot!(output(|out| render(&file, &model, &args, &settings, out)), @r"
        int g;

        int one()
        {
        }
        ");

        let args = render_args(&["--offset", "0x14"]);
        let settings = args.settings(DiagnosticSettings::default());
        assert_eq!(output(|out| render(&file, &model, &args, &settings, out)), "int g;\n");

        let args = render_args(&["--file", "b.cpp"]);
        let settings = args.settings(DiagnosticSettings::default());
        assert_eq!(output(|out| render(&file, &model, &args, &settings, out)), "");

        let args = render_args(&["--no-declarations", "--no-variables", "--disassemble"]);
        let settings = args.settings(DiagnosticSettings::default());
        insta::assert_snapshot!(output(|out| render(&file, &model, &args, &settings, out)), @r"
        int one()
        {
            // 80000000  li       r3, 1
            // 80000004  blr
        }
        ");
    }
}
