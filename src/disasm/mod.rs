//! Turns the code for a function back into assembly so that it can be shown along
//! with the rendered source. Disassemblers are selected by the ELF machine.
use crate::elf::{EM_PPC, ElfFile};
use crate::error::DisassemblyError;

pub mod ppc;

pub use ppc::PowerPc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub address: u32,
    pub mnemonic: String,
    pub operands: String,
}

impl Instruction {
    pub fn new(address: u32, mnemonic: &str, operands: String) -> Self {
        Instruction {
            address,
            mnemonic: mnemonic.to_string(),
            operands,
        }
    }
}

pub trait Disassembler {
    /// Decodes the instructions in [start, end).
    fn disassemble(&self, image: &ElfFile, start: u32, end: u32) -> Result<Vec<Instruction>, DisassemblyError>;
}

pub fn for_machine(machine: u16) -> Result<Box<dyn Disassembler>, DisassemblyError> {
    match machine {
        EM_PPC => Ok(Box::new(PowerPc)),
        _ => Err(DisassemblyError::Unsupported(machine)),
    }
}

/// The bytes for [start, end) which must all be within one load segment.
fn code_bytes(image: &ElfFile, start: u32, end: u32) -> Result<&[u8], DisassemblyError> {
    let unmapped = DisassemblyError::Unmapped { start, end };
    let size = end.checked_sub(start).ok_or(unmapped.clone())? as usize;
    let bytes = image
        .address_to_data(crate::elf::VirtualAddr(start))
        .ok_or(unmapped.clone())?;
    bytes.get(..size).ok_or(unmapped)
}
