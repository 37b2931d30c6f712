//! Value stack and pipe.
//!
//! The value stack has no storage of its own: items live in the stack bank at
//! page `sb`, and `sp` counts them. Item `i` sits at `sb:i`, so an empty stack
//! is `sp == 0` and a push writes at `sp` before incrementing it. A spawned
//! lane gets a stack page no other live lane has as its `sb`, with a copy of
//! the parent's items.
//!
//! The pipe is a per-lane FIFO.

use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::memory::{Bank, address};
use crate::virtual_machine::operand::Register;
use crate::virtual_machine::vm::registers::Registers;
use std::collections::VecDeque;

/// View of one lane's value stack over the shared stack bank.
pub struct ValueStack<'a> {
    bank: &'a mut Bank,
    regs: &'a mut Registers,
    depth: usize,
}

impl<'a> ValueStack<'a> {
    pub fn new(bank: &'a mut Bank, regs: &'a mut Registers, depth: usize) -> Self {
        Self { bank, regs, depth }
    }

    fn slot(&self, index: u8) -> usize {
        address(self.regs.get(Register::Sb), index as usize)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.regs.get(Register::Sp) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: u8) -> Result<(), Fault> {
        let sp = self.regs.get(Register::Sp);
        if sp as usize >= self.depth {
            return Err(Fault::StackOverflow { depth: self.depth });
        }
        self.bank.write_byte(self.slot(sp), value)?;
        self.regs.set(Register::Sp, sp + 1);
        Ok(())
    }

    pub fn pop(&mut self, instr: &'static str) -> Result<u8, Fault> {
        let value = self.peek(instr)?;
        let sp = self.regs.get(Register::Sp);
        self.regs.set(Register::Sp, sp - 1);
        Ok(value)
    }

    pub fn peek(&self, instr: &'static str) -> Result<u8, Fault> {
        let sp = self.regs.get(Register::Sp);
        if sp == 0 {
            return Err(Fault::StackUnderflow { instruction: instr });
        }
        self.bank.read_byte(self.slot(sp - 1))
    }

    pub fn drop_top(&mut self, instr: &'static str) -> Result<(), Fault> {
        self.pop(instr).map(|_| ())
    }

    pub fn dupe(&mut self, instr: &'static str) -> Result<(), Fault> {
        let top = self.peek(instr)?;
        self.push(top)
    }

    pub fn swap(&mut self, instr: &'static str) -> Result<(), Fault> {
        let first = self.pop(instr)?;
        let second = match self.pop(instr) {
            Ok(v) => v,
            Err(fault) => {
                // Leave the stack as it was.
                self.push(first)?;
                return Err(fault);
            }
        };
        self.push(first)?;
        self.push(second)
    }

    /// Empties the stack without touching the bank.
    pub fn void(&mut self) {
        self.regs.set(Register::Sp, 0);
    }
}

/// Bounded FIFO of words owned by one lane.
#[derive(Clone, Debug)]
pub struct Pipe {
    items: VecDeque<u8>,
    capacity: usize,
}

impl Pipe {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn pack(&mut self, value: u8) -> Result<(), Fault> {
        if self.items.len() >= self.capacity {
            return Err(Fault::QueueOverflow {
                capacity: self.capacity,
            });
        }
        self.items.push_back(value);
        Ok(())
    }

    pub fn pass(&mut self, instr: &'static str) -> Result<u8, Fault> {
        self.items
            .pop_front()
            .ok_or(Fault::QueueUnderflow { instruction: instr })
    }

    /// Next byte of the pipe stream.
    pub(super) fn fetch(&mut self) -> Option<u8> {
        self.items.pop_front()
    }

    pub fn dump(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.items.iter()
    }
}
