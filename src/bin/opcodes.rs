//! Opcode listing.
//!
//! Prints the ZEN_80 instruction table grouped by section, one line per
//! opcode with its length in bytes and cycle cost.
//! Run with: `cargo run --bin opcodes`

use zen80::virtual_machine::isa::{Group, Instruction, OPCODE_COUNT};

fn main() {
    println!("--{{ ZEN_80 Instruction Set }}--");

    let mut section: Option<Group> = None;
    for &instr in Instruction::ALL {
        let group = instr.operation().group();
        if section != Some(group) {
            println!();
            println!("# {}", group.heading());
            println!();
            section = Some(group);
        }
        println!(
            "{:02X} {:<20}{}, {}",
            instr as u8,
            instr.syntax(),
            instr.size(),
            instr.cycles().describe(),
        );
    }

    println!();
    println!("    Opcodes: {OPCODE_COUNT}/256");
}
