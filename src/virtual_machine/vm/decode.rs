//! Instruction fetch and decode.
//!
//! In the code stream the opcode is read at `cb:pc` and its operand at
//! `cb:pc+1`, where the offset wraps within the page. In the pipe stream both
//! bytes are dequeued from the lane's pipe and charged against the stream
//! budget. Decoding never changes registers; the dispatcher advances pc.

use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::memory::{Bank, address};
use crate::virtual_machine::operand::Register;
use crate::virtual_machine::vm::lane::{Lane, Stream};

/// One decoded instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decoded {
    pub instruction: Instruction,
    /// Operand byte, zero when the mode has none.
    pub operand: u8,
    /// Code address of the opcode. For pipe-fetched instructions this is the
    /// code address the lane resumes at.
    pub address: usize,
    pub size: usize,
    pub cycles: u64,
    /// Fetched from the pipe stream.
    pub piped: bool,
}

impl Decoded {
    pub fn syntax(&self) -> &'static str {
        self.instruction.syntax()
    }
}

fn decode_opcode(opcode: u8, address: usize) -> Result<Instruction, Fault> {
    Instruction::try_from(opcode).map_err(|_| Fault::InvalidInstruction { opcode, address })
}

/// Fetches the next instruction of `lane`.
pub fn decode(code: &Bank, lane: &mut Lane) -> Result<Decoded, Fault> {
    let regs = lane.registers;
    let pc = regs.get(Register::Pc);
    let cb = regs.get(Register::Cb);
    let here = address(cb, pc as usize);

    let (instruction, operand, piped) = match lane.stream {
        Stream::Code => {
            let instruction = decode_opcode(code.read_byte(here)?, here)?;
            let operand = if instruction.mode().operand_bytes() == 1 {
                // The operand never comes from the start of the page.
                let next = pc.checked_add(1).ok_or(Fault::UnexpectedEndOfStream {
                    instruction: instruction.syntax(),
                })?;
                code.read_byte(address(cb, next as usize))?
            } else {
                0
            };
            (instruction, operand, false)
        }
        Stream::Pipe { remaining } => {
            let opcode = fetch(lane, remaining, "EXECUTE")?;
            let instruction = decode_opcode(opcode, here)?;
            let operand = if instruction.mode().operand_bytes() == 1 {
                let remaining = match lane.stream {
                    Stream::Pipe { remaining } => remaining,
                    Stream::Code => 0,
                };
                fetch(lane, remaining, instruction.syntax())?
            } else {
                0
            };
            (instruction, operand, true)
        }
    };

    Ok(Decoded {
        instruction,
        operand,
        address: here,
        size: instruction.size(),
        cycles: instruction.cycles().resolve(piped, regs.a()),
        piped,
    })
}

/// Takes one byte of the pipe stream. The lane drops back to the code stream
/// once the budget is spent.
fn fetch(lane: &mut Lane, remaining: usize, instr: &'static str) -> Result<u8, Fault> {
    if remaining == 0 {
        return Err(Fault::UnexpectedEndOfStream { instruction: instr });
    }
    let byte = lane
        .pipe
        .fetch()
        .ok_or(Fault::UnexpectedEndOfStream { instruction: instr })?;
    lane.stream = match remaining - 1 {
        0 => Stream::Code,
        remaining => Stream::Pipe { remaining },
    };
    Ok(byte)
}
