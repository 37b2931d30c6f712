//! VM benchmark binary.
//!
//! Measures execution time for representative ZEN_80 programs.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use zen80::virtual_machine::errors::ProgramError;
use zen80::virtual_machine::host::NullHost;
use zen80::virtual_machine::program::Program;
use zen80::virtual_machine::vm::{Machine, RunOutcome, VmConfig};

const BUDGET: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    cycles: u64,
    /// Instructions executed per run (None to omit column).
    instructions: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_instr = self
            .instructions
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>12} cycles  {} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.cycles,
            ns_per_instr,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(
    name: &'static str,
    min_duration: Duration,
    instructions: Option<u64>,
    mut f: F,
) -> BenchResult
where
    F: FnMut() -> u64,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut last_cycles = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last_cycles = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        cycles: last_cycles,
        instructions,
    }
}

/// Runs `code` to completion, returns the machine.
fn execute(code: &[u8]) -> Machine {
    let mut vm = Machine::new(VmConfig::default(), code).expect("vm new failed");
    let outcome = vm.run(&mut NullHost, BUDGET);
    assert_eq!(outcome, RunOutcome::Completed, "benchmark program did not complete");
    vm
}

/// Benchmarks one program; the instruction count comes from a dry run.
fn bench_program(name: &'static str, min: Duration, code: &[u8]) -> BenchResult {
    let instructions = execute(code).profile().instructions();
    bench(name, min, Some(instructions), || execute(code).cycles())
}

fn build(f: impl FnOnce(&mut Program) -> Result<&mut Program, ProgramError>) -> Vec<u8> {
    let mut program = Program::new();
    f(&mut program).expect("program build failed");
    program.finish().expect("label resolution failed")
}

// ---------------------------------------------------------------------------
// Benchmark definitions
// ---------------------------------------------------------------------------

/// Wraps `body` in a 250 x `outer` loop counted in x and y.
fn looped(
    outer: u8,
    body: impl FnOnce(&mut Program) -> Result<&mut Program, ProgramError>,
) -> Vec<u8> {
    build(|p| {
        p.op_n("LOAD x <Number>", outer)?
            .label("outer")?
            .op_n("LOAD y <Number>", 250)?
            .label("inner")?;
        body(p)?
            .op("DEC y")?
            .op_to("ELSE <Number>", "next")?
            .op_to("JUMP <Number>", "inner")?
            .label("next")?
            .op("DEC x")?
            .op_to("ELSE <Number>", "end")?
            .op_to("JUMP <Number>", "outer")?
            .label("end")?
            .op("DONE")
    })
}

fn tight_loop() -> Vec<u8> {
    looped(200, |p| p.op("INC z"))
}

fn arithmetic_mix() -> Vec<u8> {
    looped(40, |p| {
        p.op_n("ADD <Number>", 3)?
            .op("MUL y")?
            .op("SUB x")?
            .op_n("DIV <Number>", 3)?
            .op_n("MOD <Number>", 7)?
            .op_n("LSH <Number>", 1)?
            .op_n("ZSH <Number>", 2)?
            .op_n("XOR <Number>", 0x5A)
    })
}

fn stack_ops() -> Vec<u8> {
    looped(40, |p| {
        p.op("PUSH y")?
            .op("DUPE")?
            .op("ADD $")?
            .op("PUSH x")?
            .op("SWAP")?
            .op("SUB $")?
            .op("POP z")
    })
}

fn call_overhead() -> Vec<u8> {
    build(|p| {
        p.op_n("LOAD x <Number>", 40)?
            .label("outer")?
            .op_n("LOAD y <Number>", 250)?
            .label("inner")?
            .op_to("CALL <Number>", "noop")?
            .op("DEC y")?
            .op_to("ELSE <Number>", "next")?
            .op_to("JUMP <Number>", "inner")?
            .label("next")?
            .op("DEC x")?
            .op_to("ELSE <Number>", "end")?
            .op_to("JUMP <Number>", "outer")?
            .label("end")?
            .op("DONE")?
            .label("noop")?
            .op("RETURN")
    })
}

fn pipe_execute() -> Vec<u8> {
    let inc = zen80::virtual_machine::isa::Instruction::Inc as u8;
    looped(40, |p| {
        p.op_n("PACK <Number>", inc)?
            .op_n("PACK <Number>", inc)?
            .op_n("PACK <Number>", inc)?
            .op("EXECUTE")
    })
}

fn memory() -> Vec<u8> {
    looped(40, |p| {
        p.op("COPY y")?
            .op_n("STORE [<Number> y]", 0)?
            .op_n("LOAD [<Number> y]", 0)?
            .op_n("STORE [<Number>]", 255)
    })
}

/// Two lanes increment a 16-bit counter under LOCK 0.
fn fork_lock_counter() -> Vec<u8> {
    build(|p| {
        p.op_to("FORK <Number>", "worker")?
            .label("worker")?
            .op_n("LOAD x <Number>", 4)?
            .label("outer")?
            .op_n("LOAD y <Number>", 250)?
            .label("inner")?
            .op_n("LOCK <Number>", 0)?
            .op_n("LOAD [<Number>]", 0)?
            .op_n("ADD <Number>", 1)?
            .op_n("STORE [<Number>]", 0)?
            .op_n("LOAD [<Number>]", 1)?
            .op_n("TALLY <Number>", 0)?
            .op_n("STORE [<Number>]", 1)?
            .op_n("FREE <Number>", 0)?
            .op("DEC y")?
            .op_to("ELSE <Number>", "next")?
            .op_to("JUMP <Number>", "inner")?
            .label("next")?
            .op("DEC x")?
            .op_to("ELSE <Number>", "end")?
            .op_to("JUMP <Number>", "outer")?
            .label("end")?
            .op("DONE")
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>12}     {:>10}",
        "benchmark", "iters", "avg time", "cycles/run", "ns/instr"
    );
    println!("  {}", "-".repeat(85));

    // Build programs up front (builder cost excluded from benchmark)
    let programs: [(&'static str, Vec<u8>); 7] = [
        ("tight_loop(50K)", tight_loop()),
        ("arithmetic_mix(10K)", arithmetic_mix()),
        ("stack_ops(10K)", stack_ops()),
        ("call_overhead(10K)", call_overhead()),
        ("pipe_execute(10K)", pipe_execute()),
        ("memory(10K)", memory()),
        ("fork_lock_counter(2x1000)", fork_lock_counter()),
    ];

    for (name, code) in &programs {
        bench_program(*name, min, code).print();
    }

    println!();
}
