use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::operand::Register;
use crate::virtual_machine::vm::registers::Registers;
use crate::virtual_machine::vm::stack::Pipe;
use std::fmt::Display;

/// Handle to a lane slot.
///
/// The generation changes every time a slot is freed, so a handle to a retired
/// lane never refers to a later lane that reuses the slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LaneId {
    index: u32,
    generation: u32,
}

impl LaneId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(&self) -> usize {
        self.index as usize
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for LaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lane {}.{}", self.index, self.generation)
    }
}

/// Where the next instruction is fetched from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stream {
    /// Code bank at `cb:pc`.
    Code,
    /// The lane's own pipe, for `remaining` more bytes.
    Pipe { remaining: usize },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LaneStatus {
    Ready,
    /// Waiting for `lock` to be handed over.
    Blocked { lock: u8 },
}

/// Return address pushed by CALL.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Frame {
    pub cb: u8,
    pub pc: u8,
}

/// Why a lane was retired.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitReason {
    Done,
    Halted,
    Nuked,
    LostRace,
    Faulted(Fault),
}

impl Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Done => f.write_str("done"),
            ExitReason::Halted => f.write_str("halted"),
            ExitReason::Nuked => f.write_str("nuked"),
            ExitReason::LostRace => f.write_str("lost race"),
            ExitReason::Faulted(fault) => write!(f, "faulted: {fault}"),
        }
    }
}

/// Record of a retired lane.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaneExit {
    pub lane: LaneId,
    pub reason: ExitReason,
    pub registers: Registers,
    pub cycles: u64,
}

/// One execution context.
#[derive(Clone, Debug)]
pub struct Lane {
    id: LaneId,
    pub(super) registers: Registers,
    origin: Registers,
    pub(super) frames: Vec<Frame>,
    pub(super) pipe: Pipe,
    pub(super) stream: Stream,
    pub(super) status: LaneStatus,
    pub(super) race: Option<u32>,
    pub(super) cursor: usize,
    pub(super) cycles: u64,
}

impl Lane {
    pub(super) fn new(id: LaneId, registers: Registers, pipe_capacity: usize) -> Self {
        Self {
            id,
            registers,
            origin: registers,
            frames: Vec::new(),
            pipe: Pipe::new(pipe_capacity),
            stream: Stream::Code,
            status: LaneStatus::Ready,
            race: None,
            cursor: 0,
            cycles: 0,
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Registers as they were when the lane was spawned.
    pub fn origin(&self) -> &Registers {
        &self.origin
    }

    pub fn status(&self) -> LaneStatus {
        self.status
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn pipe(&self) -> &Pipe {
        &self.pipe
    }

    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn race_group(&self) -> Option<u32> {
        self.race
    }

    /// Io bank cursor set by ADDRESS.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_ready(&self) -> bool {
        self.status == LaneStatus::Ready
    }

    /// Sets pc and returns to the code stream.
    pub(super) fn jump(&mut self, target: u8) {
        self.registers.set(Register::Pc, target);
        self.stream = Stream::Code;
    }

    /// Register write through an instruction. Writing pc is a jump.
    pub(super) fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Pc => self.jump(value),
            _ => self.registers.set(reg, value),
        }
    }

    pub(super) fn into_exit(self, reason: ExitReason) -> LaneExit {
        LaneExit {
            lane: self.id,
            reason,
            registers: self.registers,
            cycles: self.cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_write_leaves_pipe_stream() {
        let mut lane = Lane::new(LaneId::new(0, 0), Registers::new(), 8);
        lane.stream = Stream::Pipe { remaining: 3 };
        lane.write(Register::X, 5);
        assert_eq!(lane.stream(), Stream::Pipe { remaining: 3 });
        lane.write(Register::Pc, 40);
        assert_eq!(lane.stream(), Stream::Code);
        assert_eq!(lane.registers().pc(), 40);
    }

    #[test]
    fn origin_is_spawn_snapshot() {
        let mut regs = Registers::new();
        regs.set(Register::Y, 3);
        let mut lane = Lane::new(LaneId::new(1, 2), regs, 8);
        lane.write(Register::Y, 9);
        assert_eq!(lane.origin().get(Register::Y), 3);
        assert_eq!(lane.id().to_string(), "lane 1.2");
    }
}
