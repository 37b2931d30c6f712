//! ZEN_80 bytecode interpreter.
//!
//! ZEN_80 is an 8-bit machine with ten registers per lane, four paged memory
//! banks shared by every lane, a value stack in the stack bank and a pipe per
//! lane. Lanes are cooperative: the scheduler runs one instruction per lane
//! turn, and LOCK on a held key is the only way a lane waits.
//!
//! # Modules
//!
//! - [`errors`]: Fault, configuration and builder error types
//! - [`host`]: Host interface behind the OPERATE instruction
//! - [`isa`]: Instruction table and opcode mappings
//! - [`memory`]: Paged, bounds-checked memory banks
//! - [`operand`]: Register names and addressing modes
//! - [`program`]: Bytecode builder with labels
//! - [`vm`]: Decoder, dispatcher, ALU and lane scheduler

pub mod errors;
pub mod host;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod memory;
pub mod operand;
pub mod program;
pub mod vm;
