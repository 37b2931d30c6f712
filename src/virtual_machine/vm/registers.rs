use crate::virtual_machine::operand::Register;
use std::fmt::Display;

/// Register file of one lane.
///
/// Ten 8-bit registers indexed by [`Register`]. The file is `Copy` so the
/// dispatcher can snapshot it before each instruction and roll back on a fault.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    regs: [u8; Register::COUNT],
}

impl Registers {
    /// Creates a zeroed register file.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, value: u8) {
        self.regs[reg as usize] = value;
    }

    /// A = `src`.
    #[inline]
    pub fn copy(&mut self, src: Register) {
        self.set(Register::A, self.get(src));
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.get(Register::A)
    }

    #[inline]
    pub fn fx(&self) -> u8 {
        self.get(Register::Fx)
    }

    #[inline]
    pub fn pc(&self) -> u8 {
        self.get(Register::Pc)
    }
}

impl Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, reg) in Register::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={:02x}", reg, self.get(*reg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_reads_into_accumulator() {
        let mut regs = Registers::new();
        regs.set(Register::X, 7);
        regs.copy(Register::X);
        assert_eq!(regs.a(), 7);
        assert_eq!(regs.get(Register::X), 7);
    }

    #[test]
    fn display_lists_every_register() {
        let mut regs = Registers::new();
        regs.set(Register::Pc, 0x1f);
        assert_eq!(
            regs.to_string(),
            "a=00 x=00 y=00 z=00 pc=1f sp=00 fx=00 cb=00 sb=00 db=00"
        );
    }
}
