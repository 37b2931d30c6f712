//! Arithmetic/logic unit.
//!
//! Every operation is a pure function of its inputs and returns the result word
//! together with the new FX value. Binary operations take `(lhs, rhs, fx)`,
//! where `fx` is the carry or borrow input for TALLY and DEBIT and ignored by
//! the rest.

use crate::virtual_machine::errors::Fault;

/// Result word and new flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Output {
    pub value: u8,
    pub fx: u8,
}

impl Output {
    const fn new(value: u8, fx: u8) -> Self {
        Self { value, fx }
    }

    /// FX = BOOL(value).
    const fn flagged(value: u8) -> Self {
        Self::new(value, (value != 0) as u8)
    }

    /// Same result with FX = BOOL(value).
    pub const fn boolean(self) -> Self {
        Self::flagged(self.value)
    }
}

pub type BinaryFn = fn(&'static str, u8, u8, u8) -> Result<Output, Fault>;
pub type UnaryFn = fn(u8) -> Output;
pub type CompareFn = fn(u8, u8) -> bool;

pub fn add(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let (value, carry) = lhs.overflowing_add(rhs);
    Ok(Output::new(value, carry as u8))
}

pub fn sub(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let (value, borrow) = lhs.overflowing_sub(rhs);
    Ok(Output::new(value, borrow as u8))
}

pub fn tally(_instr: &'static str, lhs: u8, rhs: u8, fx: u8) -> Result<Output, Fault> {
    let sum = lhs as u16 + rhs as u16 + (fx != 0) as u16;
    Ok(Output::new(sum as u8, (sum > 0xFF) as u8))
}

pub fn debit(_instr: &'static str, lhs: u8, rhs: u8, fx: u8) -> Result<Output, Fault> {
    let diff = lhs as i16 - rhs as i16 - (fx != 0) as i16;
    Ok(Output::new(diff as u8, (diff < 0) as u8))
}

pub fn mul(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let [low, high] = (lhs as u16 * rhs as u16).to_le_bytes();
    Ok(Output::new(low, high))
}

pub fn div(instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    if rhs == 0 {
        return Err(Fault::DivisionByZero { instruction: instr });
    }
    Ok(Output::new(lhs / rhs, lhs % rhs))
}

/// Remainder in the result, quotient in FX. The reverse of [`div`].
pub fn modulo(instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    if rhs == 0 {
        return Err(Fault::DivisionByZero { instruction: instr });
    }
    Ok(Output::new(lhs % rhs, lhs / rhs))
}

/// AND, OR and XOR put the result itself in FX. The `$` forms use
/// [`Output::boolean`] instead.
pub fn and(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let value = lhs & rhs;
    Ok(Output::new(value, value))
}

pub fn or(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let value = lhs | rhs;
    Ok(Output::new(value, value))
}

pub fn xor(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    let value = lhs ^ rhs;
    Ok(Output::new(value, value))
}

/// Logical right shift. Counts of 8 or more clear the word.
pub fn zsh(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    Ok(Output::flagged(lhs.checked_shr(rhs as u32).unwrap_or(0)))
}

/// Arithmetic right shift. Counts of 8 or more fill with the sign bit.
pub fn ssh(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    Ok(Output::flagged(((lhs as i8) >> rhs.min(7)) as u8))
}

pub fn lsh(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    Ok(Output::flagged(lhs.checked_shl(rhs as u32).unwrap_or(0)))
}

/// Rotate right by `rhs % 8`.
pub fn rot(_instr: &'static str, lhs: u8, rhs: u8, _fx: u8) -> Result<Output, Fault> {
    Ok(Output::flagged(lhs.rotate_right(rhs as u32 % 8)))
}

pub fn inc(value: u8) -> Output {
    Output::flagged(value.wrapping_add(1))
}

pub fn dec(value: u8) -> Output {
    Output::flagged(value.wrapping_sub(1))
}

pub fn clz(value: u8) -> Output {
    Output::flagged(value.leading_zeros() as u8)
}

pub fn ctz(value: u8) -> Output {
    Output::flagged(value.trailing_zeros() as u8)
}

/// Population count.
pub fn nsa(value: u8) -> Output {
    Output::flagged(value.count_ones() as u8)
}

pub fn not(value: u8) -> Output {
    Output::flagged(!value)
}

pub fn eq(lhs: u8, rhs: u8) -> bool {
    lhs == rhs
}

pub fn gt(lhs: u8, rhs: u8) -> bool {
    lhs > rhs
}

pub fn lt(lhs: u8, rhs: u8) -> bool {
    lhs < rhs
}

pub fn neq(lhs: u8, rhs: u8) -> bool {
    lhs != rhs
}

pub fn ngt(lhs: u8, rhs: u8) -> bool {
    lhs <= rhs
}

pub fn nlt(lhs: u8, rhs: u8) -> bool {
    lhs >= rhs
}
