//! Bytecode builder.
//!
//! [`Program`] emits instructions by their canonical table syntax
//! (`"ADD x"`, `"LOAD [<Number> y]"`) and resolves labels to code-page offsets.
//! It does not parse source text.
//!
//! ```
//! use zen80::virtual_machine::program::Program;
//!
//! let mut program = Program::new();
//! program
//!     .op_n("LOAD x <Number>", 3)?
//!     .label("loop")?
//!     .op("DEC x")?
//!     .op_to("ELSE <Number>", "end")?
//!     .op_to("JUMP <Number>", "loop")?
//!     .label("end")?
//!     .op("DONE")?;
//! let code = program.finish()?;
//! assert_eq!(code.len(), 9);
//! # Ok::<(), zen80::virtual_machine::errors::ProgramError>(())
//! ```

use crate::virtual_machine::errors::ProgramError;
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::memory::PAGE_SIZE;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct Program {
    code: Vec<u8>,
    labels: HashMap<String, usize>,
    /// Operand positions waiting for a label address.
    fixups: Vec<(usize, String)>,
}

fn lookup(syntax: &str) -> Result<Instruction, ProgramError> {
    Instruction::from_syntax(syntax).ok_or_else(|| ProgramError::UnknownSyntax(syntax.to_string()))
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the next emitted byte.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    /// Emits an instruction that takes no operand byte.
    pub fn op(&mut self, syntax: &str) -> Result<&mut Self, ProgramError> {
        let instr = lookup(syntax)?;
        self.emit(instr, None)
    }

    /// Emits an instruction with operand `n`.
    pub fn op_n(&mut self, syntax: &str, n: u8) -> Result<&mut Self, ProgramError> {
        let instr = lookup(syntax)?;
        self.emit(instr, Some(n))
    }

    /// Emits an instruction whose operand is the offset of `label`, which may
    /// be defined later.
    pub fn op_to(&mut self, syntax: &str, label: &str) -> Result<&mut Self, ProgramError> {
        let instr = lookup(syntax)?;
        self.emit(instr, Some(0))?;
        self.fixups.push((self.here() - 1, label.to_string()));
        Ok(self)
    }

    pub fn emit(&mut self, instr: Instruction, operand: Option<u8>) -> Result<&mut Self, ProgramError> {
        let takes_operand = instr.mode().operand_bytes() == 1;
        match (takes_operand, operand) {
            (true, None) => return Err(ProgramError::MissingOperand(instr.syntax())),
            (false, Some(_)) => return Err(ProgramError::UnexpectedOperand(instr.syntax())),
            _ => {}
        }
        self.code.push(instr as u8);
        self.code.extend(operand);
        Ok(self)
    }

    /// Appends raw bytes, e.g. data to be packed and executed.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.code.extend_from_slice(bytes);
        self
    }

    /// Defines `name` at the current offset.
    pub fn label(&mut self, name: &str) -> Result<&mut Self, ProgramError> {
        if self.labels.contains_key(name) {
            return Err(ProgramError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), self.here());
        Ok(self)
    }

    pub fn address_of(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Resolves every label reference and returns the code image.
    pub fn finish(mut self) -> Result<Vec<u8>, ProgramError> {
        for (at, label) in std::mem::take(&mut self.fixups) {
            let address = *self
                .labels
                .get(&label)
                .ok_or_else(|| ProgramError::UndefinedLabel(label.clone()))?;
            if address >= PAGE_SIZE {
                return Err(ProgramError::AddressOutOfRange { label, address });
            }
            self.code[at] = address as u8;
        }
        Ok(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_opcode_and_operand() {
        let mut program = Program::new();
        program.op_n("ADD <Number>", 5).unwrap().op("ADD x").unwrap();
        assert_eq!(
            program.finish().unwrap(),
            vec![Instruction::AddN as u8, 5, Instruction::AddX as u8]
        );
    }

    #[test]
    fn operand_arity_is_checked() {
        let mut program = Program::new();
        assert_eq!(
            program.op("LOAD [<Number>]").unwrap_err(),
            ProgramError::MissingOperand("LOAD [<Number>]")
        );
        assert_eq!(
            program.op_n("PUSH", 1).unwrap_err(),
            ProgramError::UnexpectedOperand("PUSH")
        );
        assert_eq!(
            program.op("PUSH w").unwrap_err(),
            ProgramError::UnknownSyntax("PUSH w".to_string())
        );
    }

    #[test]
    fn forward_and_backward_labels() {
        let mut program = Program::new();
        program
            .label("top")
            .unwrap()
            .op_to("JUMP <Number>", "end")
            .unwrap()
            .op_to("JUMP <Number>", "top")
            .unwrap()
            .label("end")
            .unwrap()
            .op("DONE")
            .unwrap();
        assert_eq!(program.address_of("end"), Some(4));
        let jump = Instruction::JumpN as u8;
        assert_eq!(program.finish().unwrap(), vec![jump, 4, jump, 0, 0x00]);
    }

    #[test]
    fn label_errors() {
        let mut program = Program::new();
        program.label("a").unwrap();
        assert_eq!(
            program.label("a").unwrap_err(),
            ProgramError::DuplicateLabel("a".to_string())
        );
        program.op_to("CALL <Number>", "missing").unwrap();
        assert_eq!(
            program.finish().unwrap_err(),
            ProgramError::UndefinedLabel("missing".to_string())
        );

        let mut program = Program::new();
        program.op_to("JUMP <Number>", "far").unwrap();
        program.bytes(&[0; 300]);
        program.label("far").unwrap();
        assert!(matches!(
            program.finish(),
            Err(ProgramError::AddressOutOfRange { address: 302, .. })
        ));
    }
}
