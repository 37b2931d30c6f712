//! Property-based tests for the stack, pipe and ALU laws.

use super::*;
use super::stack::Pipe;
use crate::virtual_machine::host::NullHost;
use crate::virtual_machine::memory::Bank;
use crate::virtual_machine::program::Program;
use proptest::prelude::*;

const INSTR: &str = "TEST";

fn stack_bank() -> Bank {
    Bank::new(BankKind::Stack, 1).unwrap()
}

// ========================================================================
// Stack and pipe
// ========================================================================

proptest! {
    /// Pops return pushed values in reverse order and leave sp at zero.
    #[test]
    fn prop_stack_is_lifo(values in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut bank = stack_bank();
        let mut regs = Registers::new();
        let mut stack = ValueStack::new(&mut bank, &mut regs, 255);
        for &v in &values {
            stack.push(v).unwrap();
        }
        prop_assert_eq!(stack.len(), values.len());
        for &v in values.iter().rev() {
            prop_assert_eq!(stack.pop(INSTR).unwrap(), v);
        }
        prop_assert!(stack.is_empty());
        prop_assert!(stack.pop(INSTR).is_err());
    }

    /// PUSH v, DUPE, POP, POP yields v twice.
    #[test]
    fn prop_dupe_duplicates_top(prefix in prop::collection::vec(any::<u8>(), 0..8), v in any::<u8>()) {
        let mut bank = stack_bank();
        let mut regs = Registers::new();
        let mut stack = ValueStack::new(&mut bank, &mut regs, 255);
        for &p in &prefix {
            stack.push(p).unwrap();
        }
        stack.push(v).unwrap();
        stack.dupe(INSTR).unwrap();
        prop_assert_eq!(stack.pop(INSTR).unwrap(), v);
        prop_assert_eq!(stack.pop(INSTR).unwrap(), v);
        prop_assert_eq!(stack.len(), prefix.len());
    }

    /// Swapping twice is the identity.
    #[test]
    fn prop_swap_is_involution(a in any::<u8>(), b in any::<u8>()) {
        let mut bank = stack_bank();
        let mut regs = Registers::new();
        let mut stack = ValueStack::new(&mut bank, &mut regs, 255);
        stack.push(a).unwrap();
        stack.push(b).unwrap();
        stack.swap(INSTR).unwrap();
        prop_assert_eq!(stack.peek(INSTR).unwrap(), a);
        stack.swap(INSTR).unwrap();
        prop_assert_eq!(stack.pop(INSTR).unwrap(), b);
        prop_assert_eq!(stack.pop(INSTR).unwrap(), a);
    }

    /// Passes return packed values in order; the pipe never exceeds capacity.
    #[test]
    fn prop_pipe_is_fifo(capacity in 1usize..32, values in prop::collection::vec(any::<u8>(), 0..48)) {
        let mut pipe = Pipe::new(capacity);
        let mut accepted = Vec::new();
        for &v in &values {
            match pipe.pack(v) {
                Ok(()) => accepted.push(v),
                Err(fault) => prop_assert_eq!(fault, Fault::QueueOverflow { capacity }),
            }
        }
        prop_assert_eq!(accepted.len(), values.len().min(capacity));
        for &v in &accepted {
            prop_assert_eq!(pipe.pass(INSTR).unwrap(), v);
        }
        prop_assert!(pipe.pass(INSTR).is_err());
    }

    /// The machine's PUSH n stores each value at sb:index.
    #[test]
    fn prop_pushed_values_land_in_stack_page(page in 0u8..4, values in prop::collection::vec(any::<u8>(), 1..32)) {
        let mut program = Program::new();
        program.op_n("LOAD sb <Number>", page).unwrap();
        for &v in &values {
            program.op_n("PUSH <Number>", v).unwrap();
        }
        program.op("DONE").unwrap();
        let code = program.finish().unwrap();

        let mut vm = Machine::new(VmConfig::default(), &code).unwrap();
        prop_assert_eq!(vm.run(&mut NullHost, u64::MAX), RunOutcome::Completed);
        let start = address(page, 0);
        prop_assert_eq!(vm.memory().read(BankKind::Stack, start, values.len()).unwrap(), &values[..]);
        prop_assert_eq!(vm.exits()[0].registers.get(Register::Sp) as usize, values.len());
    }
}

// ========================================================================
// ALU
// ========================================================================

proptest! {
    /// ADD and SUB: value and carry/borrow recombine to the wide result.
    #[test]
    fn prop_add_sub_carry(a in any::<u8>(), b in any::<u8>()) {
        let out = alu::add(INSTR, a, b, 0).unwrap();
        prop_assert_eq!(out.value as u16 + ((out.fx as u16) << 8), a as u16 + b as u16);
        let out = alu::sub(INSTR, a, b, 0).unwrap();
        prop_assert_eq!(out.value, a.wrapping_sub(b));
        prop_assert_eq!(out.fx, (b > a) as u8);
    }

    /// ADD then TALLY over two bytes is a 16-bit add.
    #[test]
    fn prop_tally_chains_16_bit_add(a in any::<u16>(), b in any::<u16>()) {
        let [al, ah] = a.to_le_bytes();
        let [bl, bh] = b.to_le_bytes();
        let low = alu::add(INSTR, al, bl, 0).unwrap();
        let high = alu::tally(INSTR, ah, bh, low.fx).unwrap();
        prop_assert_eq!(u16::from_le_bytes([low.value, high.value]), a.wrapping_add(b));
        prop_assert_eq!(high.fx, a.checked_add(b).is_none() as u8);
    }

    /// SUB then DEBIT over two bytes is a 16-bit subtract.
    #[test]
    fn prop_debit_chains_16_bit_sub(a in any::<u16>(), b in any::<u16>()) {
        let [al, ah] = a.to_le_bytes();
        let [bl, bh] = b.to_le_bytes();
        let low = alu::sub(INSTR, al, bl, 0).unwrap();
        let high = alu::debit(INSTR, ah, bh, low.fx).unwrap();
        prop_assert_eq!(u16::from_le_bytes([low.value, high.value]), a.wrapping_sub(b));
        prop_assert_eq!(high.fx, (b > a) as u8);
    }

    #[test]
    fn prop_mul_recombines(a in any::<u8>(), b in any::<u8>()) {
        let out = alu::mul(INSTR, a, b, 0).unwrap();
        prop_assert_eq!(u16::from_le_bytes([out.value, out.fx]), a as u16 * b as u16);
    }

    /// DIV and MOD agree: quotient * divisor + remainder == dividend.
    #[test]
    fn prop_div_mod_agree(a in any::<u8>(), b in 1u8..) {
        let div = alu::div(INSTR, a, b, 0).unwrap();
        let rem = alu::modulo(INSTR, a, b, 0).unwrap();
        prop_assert_eq!(div.value, rem.fx);
        prop_assert_eq!(div.fx, rem.value);
        prop_assert_eq!(div.value as u16 * b as u16 + div.fx as u16, a as u16);
    }

    #[test]
    fn prop_rotate_full_turn(a in any::<u8>(), n in any::<u8>()) {
        let once = alu::rot(INSTR, a, n, 0).unwrap().value;
        let back = alu::rot(INSTR, once, 8 - n % 8, 0).unwrap().value;
        prop_assert_eq!(back, a);
    }

    #[test]
    fn prop_shifts_saturate(a in any::<u8>(), n in 8u8..) {
        prop_assert_eq!(alu::zsh(INSTR, a, n, 0).unwrap().value, 0);
        prop_assert_eq!(alu::lsh(INSTR, a, n, 0).unwrap().value, 0);
        let fill = if a & 0x80 != 0 { 0xFF } else { 0 };
        prop_assert_eq!(alu::ssh(INSTR, a, n, 0).unwrap().value, fill);
    }

    /// FX of every unary operation is BOOL(result).
    #[test]
    fn prop_unary_fx_is_bool(a in any::<u8>()) {
        for f in [alu::inc, alu::dec, alu::clz, alu::ctz, alu::nsa, alu::not] {
            let out = f(a);
            prop_assert_eq!(out.fx, (out.value != 0) as u8);
        }
        prop_assert_eq!(alu::not(alu::not(a).value).value, a);
        prop_assert_eq!(alu::dec(alu::inc(a).value).value, a);
    }

    /// Each negated comparison is the complement of its pair.
    #[test]
    fn prop_comparisons_are_consistent(a in any::<u8>(), b in any::<u8>()) {
        prop_assert_eq!(alu::neq(a, b), !alu::eq(a, b));
        prop_assert_eq!(alu::ngt(a, b), !alu::gt(a, b));
        prop_assert_eq!(alu::nlt(a, b), !alu::lt(a, b));
        prop_assert_eq!(alu::gt(a, b), alu::lt(b, a));
    }
}
