//! Register names and addressing modes.

use std::fmt::Display;

/// Named registers of a lane.
///
/// `A` is the accumulator, `X`/`Y`/`Z` the general registers. The remaining
/// registers are special purpose: program counter, stack depth, flags and the
/// three page selectors.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    A = 0,
    X = 1,
    Y = 2,
    Z = 3,
    Pc = 4,
    Sp = 5,
    Fx = 6,
    Cb = 7,
    Sb = 8,
    Db = 9,
}

impl Register {
    pub const COUNT: usize = 10;

    pub const ALL: [Register; Register::COUNT] = [
        Register::A,
        Register::X,
        Register::Y,
        Register::Z,
        Register::Pc,
        Register::Sp,
        Register::Fx,
        Register::Cb,
        Register::Sb,
        Register::Db,
    ];

    /// Lowercase name, as written in instruction syntax.
    pub const fn name(&self) -> &'static str {
        match self {
            Register::A => "a",
            Register::X => "x",
            Register::Y => "y",
            Register::Z => "z",
            Register::Pc => "pc",
            Register::Sp => "sp",
            Register::Fx => "fx",
            Register::Cb => "cb",
            Register::Sb => "sb",
            Register::Db => "db",
        }
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How an instruction finds its operand.
///
/// Only `Immediate`, `Absolute`, `Indexed`, `RegisterImmediate` and
/// `RegisterAbsolute` carry an operand byte after the opcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// No operand, or A implied.
    Implicit,
    /// `n`
    Immediate,
    /// `$`, operands come from the value stack.
    Stack,
    /// `[n]`, data byte at `db:n`.
    Absolute,
    /// `r`
    Register(Register),
    /// `[r]`, data byte at `db:r`.
    Indirect(Register),
    /// `[n r]`, data byte at `db:n+r`.
    Indexed(Register),
    /// `r n`
    RegisterImmediate(Register),
    /// `r [n]`
    RegisterAbsolute(Register),
}

impl Mode {
    /// Number of operand bytes following the opcode.
    pub const fn operand_bytes(&self) -> usize {
        match self {
            Mode::Immediate
            | Mode::Absolute
            | Mode::Indexed(_)
            | Mode::RegisterImmediate(_)
            | Mode::RegisterAbsolute(_) => 1,
            Mode::Implicit | Mode::Stack | Mode::Register(_) | Mode::Indirect(_) => 0,
        }
    }

    /// Register named by the mode, if any.
    pub const fn register(&self) -> Option<Register> {
        match self {
            Mode::Register(r)
            | Mode::Indirect(r)
            | Mode::Indexed(r)
            | Mode::RegisterImmediate(r)
            | Mode::RegisterAbsolute(r) => Some(*r),
            Mode::Implicit | Mode::Immediate | Mode::Stack | Mode::Absolute => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Implicit => "implicit",
            Mode::Immediate => "immediate",
            Mode::Stack => "stack",
            Mode::Absolute => "absolute",
            Mode::Register(_) => "register",
            Mode::Indirect(_) => "indirect",
            Mode::Indexed(_) => "indexed",
            Mode::RegisterImmediate(_) => "register+immediate",
            Mode::RegisterAbsolute(_) => "register+absolute",
        }
    }
}
