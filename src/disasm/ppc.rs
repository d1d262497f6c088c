//! A small 32-bit PowerPC decoder. It covers the integer, load/store and branch
//! forms compilers commonly emit, everything else is shown as a raw word.
use super::{Disassembler, Instruction, code_bytes};
use crate::elf::{ElfFile, Stream};
use crate::error::{DisassemblyError, StreamError};

pub struct PowerPc;

impl Disassembler for PowerPc {
    fn disassemble(&self, image: &ElfFile, start: u32, end: u32) -> Result<Vec<Instruction>, DisassemblyError> {
        let bytes = code_bytes(image, start, end)?;
        let mut s = Stream::over(bytes, image.reader.little_endian);
        let mut instructions = Vec::with_capacity(bytes.len() / 4);
        while s.remaining() >= 4 {
            let address = start.wrapping_add(s.offset as u32);
            let word = s
                .read_word()
                .map_err(|_: StreamError| DisassemblyError::Unmapped { start, end })?;
            instructions.push(decode(word, address));
        }
        Ok(instructions)
    }
}

// Instruction fields, numbered from the most significant bit as the manuals do.
fn opcode(w: u32) -> u32 {
    w >> 26
}

fn rd(w: u32) -> u32 {
    (w >> 21) & 0x1f
}

fn ra(w: u32) -> u32 {
    (w >> 16) & 0x1f
}

fn rb(w: u32) -> u32 {
    (w >> 11) & 0x1f
}

fn simm(w: u32) -> i32 {
    (w & 0xffff) as u16 as i16 as i32
}

fn uimm(w: u32) -> u32 {
    w & 0xffff
}

fn xo(w: u32) -> u32 {
    (w >> 1) & 0x3ff
}

fn rc(w: u32) -> bool {
    w & 1 != 0
}

fn link(w: u32) -> bool {
    w & 1 != 0
}

fn absolute(w: u32) -> bool {
    w & 2 != 0
}

pub fn decode(w: u32, address: u32) -> Instruction {
    let inst = |mnemonic: &str, operands: String| Instruction::new(address, mnemonic, operands);
    match opcode(w) {
        7 => inst("mulli", format!("r{}, r{}, {}", rd(w), ra(w), simm(w))),
        8 => inst("subfic", format!("r{}, r{}, {}", rd(w), ra(w), simm(w))),
        10 => compare(w, address, "cmplwi", format!("{}", uimm(w))),
        11 => compare(w, address, "cmpwi", format!("{}", simm(w))),
        12 => inst("addic", format!("r{}, r{}, {}", rd(w), ra(w), simm(w))),
        13 => inst("addic.", format!("r{}, r{}, {}", rd(w), ra(w), simm(w))),
        14 if ra(w) == 0 => inst("li", format!("r{}, {}", rd(w), simm(w))),
        14 => inst("addi", format!("r{}, r{}, {}", rd(w), ra(w), simm(w))),
        15 if ra(w) == 0 => inst("lis", format!("r{}, 0x{:X}", rd(w), uimm(w))),
        15 => inst("addis", format!("r{}, r{}, 0x{:X}", rd(w), ra(w), uimm(w))),
        16 => conditional_branch(w, address),
        18 => {
            let offset = (((w & 0x03ff_fffc) << 6) as i32) >> 6;
            let target = if absolute(w) {
                offset as u32
            } else {
                address.wrapping_add(offset as u32)
            };
            let mnemonic = match (link(w), absolute(w)) {
                (false, false) => "b",
                (true, false) => "bl",
                (false, true) => "ba",
                (true, true) => "bla",
            };
            inst(mnemonic, format!("0x{target:X}"))
        }
        19 => match (xo(w), rd(w), link(w)) {
            (16, 20, false) => inst("blr", String::new()),
            (16, 20, true) => inst("blrl", String::new()),
            (528, 20, false) => inst("bctr", String::new()),
            (528, 20, true) => inst("bctrl", String::new()),
            (150, _, _) => inst("isync", String::new()),
            _ => raw(w, address),
        },
        21 => inst(
            if rc(w) { "rlwinm." } else { "rlwinm" },
            format!(
                "r{}, r{}, {}, {}, {}",
                ra(w),
                rd(w),
                rb(w),
                (w >> 6) & 0x1f,
                (w >> 1) & 0x1f
            ),
        ),
        24 if w == 0x6000_0000 => inst("nop", String::new()),
        24 => logical(w, address, "ori"),
        25 => logical(w, address, "oris"),
        26 => logical(w, address, "xori"),
        27 => logical(w, address, "xoris"),
        28 => logical(w, address, "andi."),
        29 => logical(w, address, "andis."),
        31 => extended(w, address),
        32 => load_store(w, address, "lwz", 'r'),
        33 => load_store(w, address, "lwzu", 'r'),
        34 => load_store(w, address, "lbz", 'r'),
        35 => load_store(w, address, "lbzu", 'r'),
        36 => load_store(w, address, "stw", 'r'),
        37 => load_store(w, address, "stwu", 'r'),
        38 => load_store(w, address, "stb", 'r'),
        39 => load_store(w, address, "stbu", 'r'),
        40 => load_store(w, address, "lhz", 'r'),
        41 => load_store(w, address, "lhzu", 'r'),
        42 => load_store(w, address, "lha", 'r'),
        43 => load_store(w, address, "lhau", 'r'),
        44 => load_store(w, address, "sth", 'r'),
        45 => load_store(w, address, "sthu", 'r'),
        46 => load_store(w, address, "lmw", 'r'),
        47 => load_store(w, address, "stmw", 'r'),
        48 => load_store(w, address, "lfs", 'f'),
        49 => load_store(w, address, "lfsu", 'f'),
        50 => load_store(w, address, "lfd", 'f'),
        51 => load_store(w, address, "lfdu", 'f'),
        52 => load_store(w, address, "stfs", 'f'),
        53 => load_store(w, address, "stfsu", 'f'),
        54 => load_store(w, address, "stfd", 'f'),
        55 => load_store(w, address, "stfdu", 'f'),
        _ => raw(w, address),
    }
}

fn raw(w: u32, address: u32) -> Instruction {
    Instruction::new(address, ".long", format!("0x{w:08X}"))
}

fn compare(w: u32, address: u32, mnemonic: &str, immediate: String) -> Instruction {
    let field = rd(w) >> 2;
    let operands = if field == 0 {
        format!("r{}, {immediate}", ra(w))
    } else {
        format!("cr{field}, r{}, {immediate}", ra(w))
    };
    Instruction::new(address, mnemonic, operands)
}

/// D-form logical ops have the source register first.
fn logical(w: u32, address: u32, mnemonic: &str) -> Instruction {
    Instruction::new(address, mnemonic, format!("r{}, r{}, 0x{:X}", ra(w), rd(w), uimm(w)))
}

fn load_store(w: u32, address: u32, mnemonic: &str, prefix: char) -> Instruction {
    Instruction::new(address, mnemonic, format!("{prefix}{}, {}(r{})", rd(w), simm(w), ra(w)))
}

fn conditional_branch(w: u32, address: u32) -> Instruction {
    let bo = rd(w);
    let bi = ra(w);
    let offset = ((w & 0xfffc) as u16 as i16) as i32;
    let target = if absolute(w) {
        offset as u32
    } else {
        address.wrapping_add(offset as u32)
    };
    let condition = ["lt", "gt", "eq", "so"][(bi & 3) as usize];
    let negated = ["ge", "le", "ne", "ns"][(bi & 3) as usize];
    let base = match bo {
        12 => format!("b{condition}"),
        4 => format!("b{negated}"),
        16 => "bdnz".to_string(),
        18 => "bdz".to_string(),
        20 => "b".to_string(),
        _ => {
            let mnemonic = if link(w) { "bcl" } else { "bc" };
            return Instruction::new(address, mnemonic, format!("{bo}, {bi}, 0x{target:X}"));
        }
    };
    let mnemonic = if link(w) { format!("{base}l") } else { base };
    let operands = if bi >= 4 && (bo == 12 || bo == 4) {
        format!("cr{}, 0x{target:X}", bi >> 2)
    } else {
        format!("0x{target:X}")
    };
    Instruction::new(address, &mnemonic, operands)
}

fn spr_name(w: u32) -> Option<&'static str> {
    // the two halves of the spr field are swapped
    let spr = ((w >> 16) & 0x1f) | (((w >> 11) & 0x1f) << 5);
    match spr {
        1 => Some("xer"),
        8 => Some("lr"),
        9 => Some("ctr"),
        _ => None,
    }
}

fn extended(w: u32, address: u32) -> Instruction {
    let dot = |mnemonic: &str| {
        if rc(w) {
            format!("{mnemonic}.")
        } else {
            mnemonic.to_string()
        }
    };
    let arith = |mnemonic: &str| Instruction::new(address, &dot(mnemonic), format!("r{}, r{}, r{}", rd(w), ra(w), rb(w)));
    // source register comes first for logical and shift ops
    let logic = |mnemonic: &str| Instruction::new(address, &dot(mnemonic), format!("r{}, r{}, r{}", ra(w), rd(w), rb(w)));
    let unary = |mnemonic: &str| Instruction::new(address, &dot(mnemonic), format!("r{}, r{}", ra(w), rd(w)));
    let indexed = |mnemonic: &str| Instruction::new(address, mnemonic, format!("r{}, r{}, r{}", rd(w), ra(w), rb(w)));
    match xo(w) {
        0 | 32 => {
            let mnemonic = if xo(w) == 0 { "cmpw" } else { "cmplw" };
            let field = rd(w) >> 2;
            let operands = if field == 0 {
                format!("r{}, r{}", ra(w), rb(w))
            } else {
                format!("cr{field}, r{}, r{}", ra(w), rb(w))
            };
            Instruction::new(address, mnemonic, operands)
        }
        8 => arith("subfc"),
        10 => arith("addc"),
        23 => indexed("lwzx"),
        24 => logic("slw"),
        28 => logic("and"),
        40 => arith("subf"),
        60 => logic("andc"),
        87 => indexed("lbzx"),
        104 => Instruction::new(address, &dot("neg"), format!("r{}, r{}", rd(w), ra(w))),
        124 => logic("nor"),
        136 => arith("subfe"),
        138 => arith("adde"),
        151 => indexed("stwx"),
        215 => indexed("stbx"),
        235 => arith("mullw"),
        266 => arith("add"),
        279 => indexed("lhzx"),
        316 => logic("xor"),
        339 => match spr_name(w) {
            Some(spr) => Instruction::new(address, &format!("mf{spr}"), format!("r{}", rd(w))),
            None => raw(w, address),
        },
        407 => indexed("sthx"),
        444 if rd(w) == rb(w) => unary("mr"),
        444 => logic("or"),
        459 => arith("divwu"),
        467 => match spr_name(w) {
            Some(spr) => Instruction::new(address, &format!("mt{spr}"), format!("r{}", rd(w))),
            None => raw(w, address),
        },
        491 => arith("divw"),
        536 => logic("srw"),
        792 => logic("sraw"),
        824 => Instruction::new(address, &dot("srawi"), format!("r{}, r{}, {}", ra(w), rd(w), rb(w))),
        922 => unary("extsh"),
        954 => unary("extsb"),
        _ => raw(w, address),
    }
}
