//! Host interface for the OPERATE instruction.
//!
//! The machine itself has no I/O. OPERATE hands an operation id to the
//! [`Host`] together with the invoking lane's registers and the io bank, and
//! the host decides what the operation means.

use crate::virtual_machine::memory::Bank;
use crate::virtual_machine::vm::LaneId;
use crate::virtual_machine::vm::registers::Registers;

/// What a host operation can see and change.
pub struct OperateContext<'a> {
    pub lane: LaneId,
    pub registers: &'a mut Registers,
    pub io: &'a mut Bank,
}

/// Services OPERATE calls.
///
/// An `Err` faults the invoking lane with
/// [`Fault::HostOperation`](crate::virtual_machine::errors::Fault::HostOperation).
pub trait Host {
    fn operate(&mut self, operation: u8, ctx: OperateContext<'_>) -> Result<(), String>;
}

/// Host with no operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn operate(&mut self, operation: u8, _ctx: OperateContext<'_>) -> Result<(), String> {
        Err(format!("no host operation {operation}"))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::virtual_machine::operand::Register;

    /// Records every call. Operation 0 copies A to `io[0]`, operation 1 sets A
    /// to `io[0]`, anything else fails.
    #[derive(Default)]
    pub struct TestHost {
        pub calls: Vec<(LaneId, u8)>,
    }

    impl Host for TestHost {
        fn operate(&mut self, operation: u8, ctx: OperateContext<'_>) -> Result<(), String> {
            self.calls.push((ctx.lane, operation));
            match operation {
                0 => ctx
                    .io
                    .write_byte(0, ctx.registers.a())
                    .map_err(|fault| fault.to_string()),
                1 => {
                    let value = ctx.io.read_byte(0).map_err(|fault| fault.to_string())?;
                    ctx.registers.set(Register::A, value);
                    Ok(())
                }
                _ => Err("unsupported".to_string()),
            }
        }
    }
}
