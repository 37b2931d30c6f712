//! Lane machine: dispatcher and scheduler.
//!
//! A [`Machine`] owns the four memory banks, the lock table and every lane.
//! [`Machine::step`] advances one lane by one instruction; [`Machine::run`]
//! interleaves the ready lanes round-robin, one instruction per turn, until
//! they are all retired, the machine is stopped, or the cycle budget is spent.
//!
//! Lanes live in a slot arena. While a lane executes it is taken out of its
//! slot, so handlers get `&mut Lane` next to `&mut self` and can still spawn,
//! wake or retire the other lanes.

pub mod alu;
pub mod config;
pub mod cycles;
pub mod decode;
pub mod lane;
pub mod locks;
pub mod registers;
pub mod stack;

#[cfg(test)]
mod properties;

use crate::virtual_machine::errors::{ConfigError, Fault};
use crate::virtual_machine::host::{Host, OperateContext};
use crate::virtual_machine::isa::Operation;
use crate::virtual_machine::memory::{BankKind, Memory, address};
use crate::virtual_machine::operand::{Mode, Register};
use crate::{debug, error, info, warn};
use alu::{BinaryFn, CompareFn, UnaryFn};
use decode::{Decoded, decode};
use locks::{Acquire, LockTable};
use stack::ValueStack;

pub use config::VmConfig;
pub use cycles::CycleProfile;
pub use lane::{ExitReason, Frame, Lane, LaneExit, LaneId, LaneStatus, Stream};
pub use registers::Registers;

/// Result of [`Machine::step`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    /// The instruction completed and the lane is still live.
    Continued,
    /// The lane is waiting on a lock.
    Blocked,
    /// The instruction faulted and the lane was retired.
    Faulted(Fault),
    /// HALT or NUKE retired every lane.
    Halted,
    /// The lane is retired, or the machine has stopped.
    Done,
}

/// Result of [`Machine::run`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// Every lane retired on its own.
    Completed,
    Halted,
    Nuked,
    BudgetExhausted,
    /// The last live lane faulted, or (`lane: None`) every live lane is blocked.
    Faulted { lane: Option<LaneId>, fault: Fault },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stop {
    Halted,
    Nuked,
}

/// What the scheduler does with the lane after a handler returns.
enum Flow {
    Continue,
    Block,
    Done,
    Halt,
    Nuke,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    lane: Option<Lane>,
}

macro_rules! exec_vm {
    // Entry point
    (
        vm = $vm:ident,
        host = $host:ident,
        lane = $lane:ident,
        decoded = $decoded:ident,
        { $( $op:ident => $handler:ident $args:tt ),* $(,)? }
    ) => {{
        let instr = $decoded.syntax();
        match $decoded.instruction.operation() {
            $(
                Operation::$op => exec_vm!(@call $vm, $host, $lane, $decoded, instr, $handler, $args),
            )*
        }
    }};

    // Handler that talks to the host
    (@call $vm:ident, $host:ident, $lane:ident, $decoded:ident, $instr:ident, $handler:ident, (host)) => {
        $vm.$handler($instr, $host, $lane, &$decoded)
    };

    // Handler parameterised by an ALU function
    (@call $vm:ident, $host:ident, $lane:ident, $decoded:ident, $instr:ident, $handler:ident, ($f:path)) => {
        $vm.$handler($instr, $lane, &$decoded, $f)
    };

    (@call $vm:ident, $host:ident, $lane:ident, $decoded:ident, $instr:ident, $handler:ident, ()) => {
        $vm.$handler($instr, $lane, &$decoded)
    };
}

/// ZEN_80 machine.
pub struct Machine {
    config: VmConfig,
    memory: Memory,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    /// Slot index where the next round-robin scan starts.
    cursor: usize,
    locks: LockTable,
    exits: Vec<LaneExit>,
    profile: CycleProfile,
    cycles: u64,
    next_race: u32,
    stop: Option<Stop>,
}

impl Machine {
    /// Builds a machine with `code` loaded at the start of the code bank and
    /// one lane at `pc = 0` with every register zeroed.
    pub fn new(config: VmConfig, code: &[u8]) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut memory = Memory::new(config.layout())?;
        memory.load_image(BankKind::Code, 0, code)?;
        let mut machine = Self {
            config,
            memory,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            cursor: 0,
            locks: LockTable::new(),
            exits: Vec::new(),
            profile: CycleProfile::new(),
            cycles: 0,
            next_race: 0,
            stop: None,
        };
        machine.insert(Registers::new(), None);
        Ok(machine)
    }

    /// Loads bytes into a bank. They also become part of what NUKE restores.
    pub fn load_image(&mut self, bank: BankKind, address: usize, bytes: &[u8]) -> Result<(), ConfigError> {
        self.memory.load_image(bank, address, bytes)
    }

    /// Runs ready lanes round-robin until `budget` cycles have been spent.
    ///
    /// The budget is checked between instructions, so the last instruction may
    /// overshoot it.
    pub fn run<H: Host>(&mut self, host: &mut H, budget: u64) -> RunOutcome {
        let start = self.cycles;
        loop {
            match self.stop {
                Some(Stop::Halted) => return RunOutcome::Halted,
                Some(Stop::Nuked) => return RunOutcome::Nuked,
                None => {}
            }
            if self.live == 0 {
                return RunOutcome::Completed;
            }
            if self.cycles - start >= budget {
                return RunOutcome::BudgetExhausted;
            }
            let Some(id) = self.next_ready() else {
                let fault = Fault::DeadlockSuspected { blocked: self.live };
                error!("{fault}");
                return RunOutcome::Faulted { lane: None, fault };
            };
            if let StepOutcome::Faulted(fault) = self.step(host, id) {
                if self.live == 0 {
                    return RunOutcome::Faulted {
                        lane: Some(id),
                        fault,
                    };
                }
            }
        }
    }

    /// Executes one instruction of lane `id`.
    pub fn step<H: Host>(&mut self, host: &mut H, id: LaneId) -> StepOutcome {
        if self.stop.is_some() {
            return StepOutcome::Done;
        }
        let Some(mut lane) = self.take(id) else {
            return StepOutcome::Done;
        };
        if !lane.is_ready() {
            self.put(lane);
            return StepOutcome::Blocked;
        }

        let snapshot = lane.registers;
        match self.execute(host, &mut lane) {
            Ok(Flow::Continue) => {
                self.put(lane);
                StepOutcome::Continued
            }
            Ok(Flow::Block) => {
                self.put(lane);
                StepOutcome::Blocked
            }
            Ok(Flow::Done) => {
                self.retire(lane, ExitReason::Done);
                StepOutcome::Done
            }
            Ok(Flow::Halt) => {
                info!("{id} halted the machine");
                self.shutdown(lane, Stop::Halted);
                StepOutcome::Halted
            }
            Ok(Flow::Nuke) => {
                info!("{id} nuked the machine");
                self.shutdown(lane, Stop::Nuked);
                StepOutcome::Halted
            }
            Err(fault) => {
                lane.registers = snapshot;
                warn!("{id} faulted at pc {:#04x}: {fault}", snapshot.pc());
                self.retire(lane, ExitReason::Faulted(fault.clone()));
                StepOutcome::Faulted(fault)
            }
        }
    }

    fn execute<H: Host>(&mut self, host: &mut H, lane: &mut Lane) -> Result<Flow, Fault> {
        let decoded = decode(self.memory.bank(BankKind::Code), lane)?;
        if !decoded.piped {
            let pc = lane.registers.pc();
            lane.registers
                .set(Register::Pc, pc.wrapping_add(decoded.size as u8));
        }
        lane.cycles += decoded.cycles;
        self.cycles += decoded.cycles;
        self.profile
            .add(decoded.instruction.operation().group(), decoded.cycles);

        exec_vm! {
            vm = self,
            host = host,
            lane = lane,
            decoded = decoded,
            {
                // Control flow
                Done => op_done(),
                Halt => op_halt(),
                Nuke => op_nuke(),
                Noop => op_noop(),
                Return => op_return(),
                Jump => op_jump(),
                Fork => op_fork(),
                Else => op_else(),
                Call => op_call(),
                Race => op_race(),
                Poke => op_poke(),
                Lock => op_lock(),
                Free => op_free(),
                // Block
                Read => op_read(),
                Write => op_write(),
                Address => op_address(),
                Execute => op_execute(),
                Operate => op_operate(host),
                // Register
                Set => op_set(),
                Reset => op_reset(),
                Copy => op_copy(),
                Sync => op_sync(),
                Load => op_load(),
                Store => op_store(),
                // Stack
                Push => op_push(),
                Pop => op_pop(),
                Drop => op_drop(),
                Dupe => op_dupe(),
                Swap => op_swap(),
                Peek => op_peek(),
                Void => op_void(),
                // Pipe
                Pack => op_pack(),
                Pass => op_pass(),
                Dump => op_dump(),
                Poll => op_poll(),
                // Comparison
                Eq => op_compare(alu::eq),
                Gt => op_compare(alu::gt),
                Lt => op_compare(alu::lt),
                Neq => op_compare(alu::neq),
                Ngt => op_compare(alu::ngt),
                Nlt => op_compare(alu::nlt),
                // Unary
                Clz => op_unary(alu::clz),
                Ctz => op_unary(alu::ctz),
                Nsa => op_unary(alu::nsa),
                Not => op_unary(alu::not),
                // Arithmetic
                Inc => op_unary(alu::inc),
                Dec => op_unary(alu::dec),
                Add => op_binary(alu::add),
                Sub => op_binary(alu::sub),
                Tally => op_binary(alu::tally),
                Debit => op_binary(alu::debit),
                Mul => op_binary(alu::mul),
                Div => op_binary(alu::div),
                Mod => op_binary(alu::modulo),
                // Bitwise
                And => op_logic(alu::and),
                Or => op_logic(alu::or),
                Xor => op_logic(alu::xor),
                Zsh => op_binary(alu::zsh),
                Ssh => op_binary(alu::ssh),
                Lsh => op_binary(alu::lsh),
                Rot => op_binary(alu::rot),
            }
        }
    }

    // ---------- lane arena ----------

    fn insert(&mut self, registers: Registers, race: Option<u32>) -> LaneId {
        let id = match self.free.pop() {
            Some(index) => LaneId::new(index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    lane: None,
                });
                LaneId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        let mut lane = Lane::new(id, registers, self.config.pipe_capacity);
        lane.race = race;
        self.slots[id.index()].lane = Some(lane);
        self.live += 1;
        debug!("{id} spawned at pc {:#04x}", registers.pc());
        id
    }

    fn spawn(&mut self, parent: &Lane, target: u8, race: Option<u32>) -> Result<LaneId, Fault> {
        if self.live >= self.config.max_lanes {
            return Err(Fault::LaneLimit {
                max: self.config.max_lanes,
            });
        }
        let page = self.free_stack_page(parent)?;
        let mut registers = parent.registers;
        let depth = registers.get(Register::Sp) as usize;
        if depth > 0 {
            self.memory.copy(
                BankKind::Stack,
                address(registers.get(Register::Sb), 0),
                BankKind::Stack,
                address(page, 0),
                depth,
            )?;
        }
        registers.set(Register::Sb, page);
        registers.set(Register::Pc, target);
        Ok(self.insert(registers, race))
    }

    /// Lowest stack page that is not any live lane's `sb`.
    fn free_stack_page(&self, parent: &Lane) -> Result<u8, Fault> {
        let pages = self.memory.bank(BankKind::Stack).pages();
        let mut used = vec![false; pages];
        let claimed = self.lanes().map(Lane::registers).chain(Some(parent.registers()));
        for registers in claimed {
            if let Some(slot) = used.get_mut(registers.get(Register::Sb) as usize) {
                *slot = true;
            }
        }
        used.iter()
            .position(|in_use| !in_use)
            .map(|page| page as u8)
            .ok_or(Fault::StackPagesExhausted { pages })
    }

    fn take(&mut self, id: LaneId) -> Option<Lane> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.lane.take())
    }

    fn put(&mut self, lane: Lane) {
        let index = lane.id().index();
        self.slots[index].lane = Some(lane);
    }

    fn wake(&mut self, id: LaneId) {
        if let Some(lane) = self.lane_mut(id) {
            lane.status = LaneStatus::Ready;
        }
    }

    fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.lane.as_mut())
    }

    /// Records the exit, hands off the lane's locks and frees its slot.
    fn retire(&mut self, lane: Lane, reason: ExitReason) {
        let id = lane.id();
        for woken in self.locks.release_all(id) {
            self.wake(woken);
        }
        let slot = &mut self.slots[id.index()];
        slot.lane = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        self.live -= 1;
        debug!("{id} retired: {reason}");
        self.exits.push(lane.into_exit(reason));
    }

    /// Retires every lane in the arena that matches `pred`.
    fn retire_where(&mut self, reason: &ExitReason, pred: impl Fn(&Lane) -> bool) {
        for index in 0..self.slots.len() {
            if !self.slots[index].lane.as_ref().is_some_and(&pred) {
                continue;
            }
            if let Some(lane) = self.slots[index].lane.take() {
                self.retire(lane, reason.clone());
            }
        }
    }

    fn shutdown(&mut self, current: Lane, stop: Stop) {
        let reason = match stop {
            Stop::Halted => ExitReason::Halted,
            Stop::Nuked => ExitReason::Nuked,
        };
        self.retire(current, reason.clone());
        self.retire_where(&reason, |_| true);
        self.locks.clear();
        if stop == Stop::Nuked {
            self.memory.reset();
        }
        self.stop = Some(stop);
    }

    fn next_ready(&mut self) -> Option<LaneId> {
        let count = self.slots.len();
        for offset in 0..count {
            let index = (self.cursor + offset) % count;
            if let Some(lane) = &self.slots[index].lane {
                if lane.is_ready() {
                    self.cursor = index + 1;
                    return Some(lane.id());
                }
            }
        }
        None
    }

    // ---------- operand helpers ----------

    fn stack<'a>(&'a mut self, lane: &'a mut Lane) -> ValueStack<'a> {
        ValueStack::new(
            self.memory.bank_mut(BankKind::Stack),
            &mut lane.registers,
            self.config.stack_depth,
        )
    }

    /// Register named by the mode, or A for implicit forms.
    fn target(decoded: &Decoded) -> Register {
        decoded.instruction.mode().register().unwrap_or(Register::A)
    }

    /// Value of an A/n operand.
    fn immediate_or_a(lane: &Lane, decoded: &Decoded) -> u8 {
        match decoded.instruction.mode() {
            Mode::Immediate => decoded.operand,
            _ => lane.registers.a(),
        }
    }

    /// Data bank address of a memory operand.
    fn data_address(lane: &Lane, decoded: &Decoded) -> usize {
        let regs = &lane.registers;
        let db = regs.get(Register::Db);
        match decoded.instruction.mode() {
            Mode::Indirect(r) => address(db, regs.get(r) as usize),
            Mode::Indexed(r) => address(db, decoded.operand as usize + regs.get(r) as usize),
            _ => address(db, decoded.operand as usize),
        }
    }

    /// Value of a non-stack source operand.
    fn source(&self, lane: &Lane, decoded: &Decoded) -> Result<u8, Fault> {
        match decoded.instruction.mode() {
            Mode::Immediate | Mode::RegisterImmediate(_) => Ok(decoded.operand),
            Mode::Register(r) => Ok(lane.registers.get(r)),
            Mode::Absolute | Mode::Indirect(_) | Mode::Indexed(_) | Mode::RegisterAbsolute(_) => self
                .memory
                .bank(BankKind::Data)
                .read_byte(Self::data_address(lane, decoded)),
            Mode::Implicit | Mode::Stack => Ok(lane.registers.a()),
        }
    }

    // ---------- control flow ----------

    fn op_done(&mut self, _instr: &'static str, _lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        Ok(Flow::Done)
    }

    fn op_halt(&mut self, _instr: &'static str, _lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        Ok(Flow::Halt)
    }

    fn op_nuke(&mut self, _instr: &'static str, _lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        Ok(Flow::Nuke)
    }

    fn op_noop(&mut self, _instr: &'static str, _lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        Ok(Flow::Continue)
    }

    fn op_jump(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let target = Self::immediate_or_a(lane, decoded);
        lane.jump(target);
        Ok(Flow::Continue)
    }

    fn op_else(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        if lane.registers.fx() == 0 {
            let target = Self::immediate_or_a(lane, decoded);
            lane.jump(target);
        }
        Ok(Flow::Continue)
    }

    fn op_call(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        if lane.frames.len() >= self.config.call_depth {
            return Err(Fault::CallStackOverflow {
                depth: self.config.call_depth,
            });
        }
        lane.frames.push(Frame {
            cb: lane.registers.get(Register::Cb),
            pc: lane.registers.pc(),
        });
        let target = Self::immediate_or_a(lane, decoded);
        lane.jump(target);
        Ok(Flow::Continue)
    }

    fn op_return(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        let frame = lane.frames.pop().ok_or(Fault::ReturnWithoutCall)?;
        lane.registers.set(Register::Cb, frame.cb);
        lane.jump(frame.pc);
        Ok(Flow::Continue)
    }

    fn op_fork(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let target = Self::immediate_or_a(lane, decoded);
        self.spawn(lane, target, None)?;
        Ok(Flow::Continue)
    }

    fn op_race(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let target = Self::immediate_or_a(lane, decoded);
        let group = match lane.race {
            Some(group) => group,
            None => {
                self.next_race = self.next_race.wrapping_add(1);
                self.next_race
            }
        };
        self.spawn(lane, target, Some(group))?;
        lane.race = Some(group);
        Ok(Flow::Continue)
    }

    /// First member of a race group to POKE wins; the rest are retired.
    fn op_poke(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        if let Some(group) = lane.race.take() {
            self.retire_where(&ExitReason::LostRace, |other| other.race == Some(group));
        }
        if decoded.instruction.mode() == Mode::Immediate {
            lane.jump(decoded.operand);
        }
        Ok(Flow::Continue)
    }

    fn op_lock(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let key = Self::immediate_or_a(lane, decoded);
        match self.locks.acquire(key, lane.id()) {
            Acquire::Granted => Ok(Flow::Continue),
            Acquire::Queued => {
                lane.status = LaneStatus::Blocked { lock: key };
                Ok(Flow::Block)
            }
        }
    }

    fn op_free(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let key = Self::immediate_or_a(lane, decoded);
        if let Some(next) = self.locks.release(key, lane.id())? {
            self.wake(next);
        }
        Ok(Flow::Continue)
    }

    // ---------- block ----------

    fn op_read(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        let len = lane.registers.a() as usize;
        let regs = &lane.registers;
        let dst = address(regs.get(Register::Db), regs.get(Register::X) as usize);
        self.memory
            .copy(BankKind::Io, lane.cursor, BankKind::Data, dst, len)?;
        lane.cursor += len;
        Ok(Flow::Continue)
    }

    fn op_write(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        let len = lane.registers.a() as usize;
        let regs = &lane.registers;
        let src = address(regs.get(Register::Db), regs.get(Register::X) as usize);
        self.memory
            .copy(BankKind::Data, src, BankKind::Io, lane.cursor, len)?;
        lane.cursor += len;
        Ok(Flow::Continue)
    }

    fn op_address(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        lane.cursor = Self::immediate_or_a(lane, decoded) as usize;
        Ok(Flow::Continue)
    }

    /// Switches to the pipe stream: the whole pipe, or at most n bytes of it.
    fn op_execute(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let count = match decoded.instruction.mode() {
            Mode::Immediate => lane.pipe.len().min(decoded.operand as usize),
            _ => lane.pipe.len(),
        };
        if count > 0 {
            lane.stream = Stream::Pipe { remaining: count };
        }
        Ok(Flow::Continue)
    }

    fn op_operate<H: Host>(
        &mut self,
        _instr: &'static str,
        host: &mut H,
        lane: &mut Lane,
        decoded: &Decoded,
    ) -> Result<Flow, Fault> {
        let operation = Self::immediate_or_a(lane, decoded);
        let ctx = OperateContext {
            lane: lane.id(),
            registers: &mut lane.registers,
            io: self.memory.bank_mut(BankKind::Io),
        };
        host.operate(operation, ctx)
            .map_err(|reason| Fault::HostOperation { operation, reason })?;
        Ok(Flow::Continue)
    }

    // ---------- register ----------

    fn op_set(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        lane.write(Self::target(decoded), 0);
        Ok(Flow::Continue)
    }

    fn op_reset(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let reg = Self::target(decoded);
        let value = lane.origin().get(reg);
        lane.write(reg, value);
        Ok(Flow::Continue)
    }

    fn op_copy(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        lane.registers.copy(Self::target(decoded));
        Ok(Flow::Continue)
    }

    fn op_sync(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = lane.registers.a();
        lane.write(Self::target(decoded), value);
        Ok(Flow::Continue)
    }

    fn op_load(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = self.source(lane, decoded)?;
        lane.write(Self::target(decoded), value);
        Ok(Flow::Continue)
    }

    fn op_store(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let dst = Self::data_address(lane, decoded);
        self.memory
            .bank_mut(BankKind::Data)
            .write_byte(dst, lane.registers.a())?;
        Ok(Flow::Continue)
    }

    // ---------- stack ----------

    fn op_push(&mut self, _instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = match decoded.instruction.mode() {
            Mode::Immediate => decoded.operand,
            _ => lane.registers.get(Self::target(decoded)),
        };
        self.stack(lane).push(value)?;
        Ok(Flow::Continue)
    }

    fn op_pop(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = self.stack(lane).pop(instr)?;
        lane.write(Self::target(decoded), value);
        Ok(Flow::Continue)
    }

    fn op_drop(&mut self, instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        self.stack(lane).drop_top(instr)?;
        Ok(Flow::Continue)
    }

    fn op_dupe(&mut self, instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        self.stack(lane).dupe(instr)?;
        Ok(Flow::Continue)
    }

    fn op_swap(&mut self, instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        self.stack(lane).swap(instr)?;
        Ok(Flow::Continue)
    }

    fn op_peek(&mut self, instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        let top = self.stack(lane).peek(instr)?;
        lane.registers.set(Register::A, top);
        Ok(Flow::Continue)
    }

    fn op_void(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        self.stack(lane).void();
        Ok(Flow::Continue)
    }

    // ---------- pipe ----------

    fn op_pack(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = match decoded.instruction.mode() {
            Mode::Immediate => decoded.operand,
            Mode::Stack => self.stack(lane).pop(instr)?,
            _ => lane.registers.get(Self::target(decoded)),
        };
        lane.pipe.pack(value)?;
        Ok(Flow::Continue)
    }

    /// In the pipe stream the dequeued byte also counts against the stream budget.
    fn op_pass(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded) -> Result<Flow, Fault> {
        let value = lane.pipe.pass(instr)?;
        lane.registers.set(Register::A, value);
        if let (true, Stream::Pipe { remaining }) = (decoded.piped, lane.stream) {
            lane.stream = match remaining.saturating_sub(1) {
                0 => Stream::Code,
                remaining => Stream::Pipe { remaining },
            };
        }
        Ok(Flow::Continue)
    }

    fn op_dump(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        lane.pipe.dump();
        lane.stream = Stream::Code;
        Ok(Flow::Continue)
    }

    fn op_poll(&mut self, _instr: &'static str, lane: &mut Lane, _decoded: &Decoded) -> Result<Flow, Fault> {
        lane.registers.set(Register::A, lane.pipe.len() as u8);
        Ok(Flow::Continue)
    }

    // ---------- ALU ----------

    /// FX = A op operand, or `$1 op $2` for the stack form. Nothing is pushed.
    fn op_compare(
        &mut self,
        instr: &'static str,
        lane: &mut Lane,
        decoded: &Decoded,
        f: CompareFn,
    ) -> Result<Flow, Fault> {
        let result = match decoded.instruction.mode() {
            Mode::Stack => {
                let mut stack = self.stack(lane);
                let first = stack.pop(instr)?;
                let second = stack.pop(instr)?;
                f(first, second)
            }
            _ => f(lane.registers.a(), self.source(lane, decoded)?),
        };
        lane.registers.set(Register::Fx, result as u8);
        Ok(Flow::Continue)
    }

    fn op_unary(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded, f: UnaryFn) -> Result<Flow, Fault> {
        let fx = match decoded.instruction.mode() {
            Mode::Stack => {
                let mut stack = self.stack(lane);
                let out = f(stack.pop(instr)?);
                stack.push(out.value)?;
                out.fx
            }
            _ => {
                let reg = Self::target(decoded);
                let out = f(lane.registers.get(reg));
                lane.registers.set(reg, out.value);
                out.fx
            }
        };
        lane.registers.set(Register::Fx, fx);
        Ok(Flow::Continue)
    }

    fn op_binary(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded, f: BinaryFn) -> Result<Flow, Fault> {
        self.binary(instr, lane, decoded, f, false)
    }

    /// AND/OR/XOR: FX is the result itself, except in the stack form.
    fn op_logic(&mut self, instr: &'static str, lane: &mut Lane, decoded: &Decoded, f: BinaryFn) -> Result<Flow, Fault> {
        self.binary(instr, lane, decoded, f, true)
    }

    fn binary(
        &mut self,
        instr: &'static str,
        lane: &mut Lane,
        decoded: &Decoded,
        f: BinaryFn,
        boolean_on_stack: bool,
    ) -> Result<Flow, Fault> {
        let fx = lane.registers.fx();
        let fx = match decoded.instruction.mode() {
            Mode::Stack => {
                let mut stack = self.stack(lane);
                let first = stack.pop(instr)?;
                let second = stack.pop(instr)?;
                let mut out = f(instr, first, second, fx)?;
                if boolean_on_stack {
                    out = out.boolean();
                }
                stack.push(out.value)?;
                out.fx
            }
            _ => {
                let rhs = self.source(lane, decoded)?;
                let out = f(instr, lane.registers.a(), rhs, fx)?;
                lane.registers.set(Register::A, out.value);
                out.fx
            }
        };
        lane.registers.set(Register::Fx, fx);
        Ok(Flow::Continue)
    }

    // ---------- introspection ----------

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Id of the lane created by [`Machine::new`].
    pub fn root(&self) -> LaneId {
        LaneId::new(0, 0)
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.lane.as_ref())
    }

    /// Live lanes in slot order.
    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.slots.iter().filter_map(|slot| slot.lane.as_ref())
    }

    pub fn live_lanes(&self) -> usize {
        self.live
    }

    /// Retired lanes in retirement order.
    pub fn exits(&self) -> &[LaneExit] {
        &self.exits
    }

    pub fn lock_holder(&self, key: u8) -> Option<LaneId> {
        self.locks.holder(key)
    }

    /// Total cycles spent by every lane.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn profile(&self) -> &CycleProfile {
        &self.profile
    }

    /// True after HALT or NUKE.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_some()
    }
}
