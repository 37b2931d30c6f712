use crate::virtual_machine::memory::BankKind;
use thiserror::Error;

/// Faults raised while a lane executes an instruction.
///
/// Every fault is lane-local: the scheduler retires the faulting lane, records
/// the fault in its exit log and keeps running the remaining lanes.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Fault {
    /// Bank access past the end of the bank.
    #[error("{bank} bank access out of bounds: {len} byte(s) at {address:#06x} (capacity {capacity})")]
    OutOfBounds {
        bank: BankKind,
        address: usize,
        len: usize,
        capacity: usize,
    },
    /// Pop from an empty value stack.
    #[error("stack underflow in `{instruction}`")]
    StackUnderflow { instruction: &'static str },
    /// Push at the configured stack depth.
    #[error("stack overflow: depth limit {depth} reached")]
    StackOverflow { depth: usize },
    /// Dequeue from an empty pipe.
    #[error("pipe underflow in `{instruction}`")]
    QueueUnderflow { instruction: &'static str },
    /// Enqueue into a full pipe.
    #[error("pipe overflow: capacity {capacity} reached")]
    QueueOverflow { capacity: usize },
    /// Opcode byte outside the instruction table.
    #[error("invalid instruction {opcode:#04x} at {address:#06x}")]
    InvalidInstruction { opcode: u8, address: usize },
    /// The pipe stream ran out in the middle of an instruction.
    #[error("instruction stream ended while decoding `{instruction}`")]
    UnexpectedEndOfStream { instruction: &'static str },
    /// DIV or MOD with a zero divisor.
    #[error("division by zero in `{instruction}`")]
    DivisionByZero { instruction: &'static str },
    /// RETURN with an empty call stack.
    #[error("return without call")]
    ReturnWithoutCall,
    /// CALL at the configured call depth.
    #[error("call stack overflow: depth limit {depth} reached")]
    CallStackOverflow { depth: usize },
    /// FREE by a lane that does not hold the lock.
    #[error("lock {lock} is not held by this lane")]
    LockNotHeld { lock: u8 },
    /// FORK or RACE with every lane slot in use.
    #[error("lane limit {max} reached")]
    LaneLimit { max: usize },
    /// FORK or RACE with every stack page claimed by a live lane.
    #[error("no free stack page: all {pages} in use")]
    StackPagesExhausted { pages: usize },
    /// OPERATE rejected by the host.
    #[error("host operation {operation} failed: {reason}")]
    HostOperation { operation: u8, reason: String },
    /// Every live lane is waiting on a lock.
    #[error("deadlock suspected: {blocked} lane(s) waiting on locks")]
    DeadlockSuspected { blocked: usize },
}

/// Errors raised while building a machine.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("{bank} bank must have between 1 and 256 pages, got {pages}")]
    BankPages { bank: BankKind, pages: usize },
    #[error("stack depth must be between 1 and 255, got {depth}")]
    StackDepth { depth: usize },
    #[error("pipe capacity must be between 1 and 255, got {capacity}")]
    PipeCapacity { capacity: usize },
    #[error("call depth must be at least 1")]
    CallDepth,
    #[error("lane limit must be at least 1")]
    LaneLimit,
    #[error("image of {len} byte(s) at {address:#06x} does not fit the {bank} bank ({capacity} bytes)")]
    ImageTooLarge {
        bank: BankKind,
        address: usize,
        len: usize,
        capacity: usize,
    },
}

/// Errors raised by the bytecode builder.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ProgramError {
    #[error("no instruction with syntax `{0}`")]
    UnknownSyntax(String),
    #[error("`{0}` takes an operand byte")]
    MissingOperand(&'static str),
    #[error("`{0}` takes no operand byte")]
    UnexpectedOperand(&'static str),
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),
    #[error("undefined label: {0}")]
    UndefinedLabel(String),
    #[error("label `{label}` resolves to {address:#06x}, beyond one code page")]
    AddressOutOfRange { label: String, address: usize },
}
