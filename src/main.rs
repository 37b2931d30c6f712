//! ZEN_80 runner.
//!
//! Loads a raw code image and runs it to completion or until the cycle budget
//! is spent.
//!
//! # Usage
//! ```text
//! zen80 <code_file> [OPTIONS]
//! ```
//!
//! # Options
//! - `--budget <cycles>`: Cycle budget (default 1000000)
//! - `--code-pages <n>`, `--data-pages <n>`, `--stack-pages <n>`, `--io-pages <n>`: Bank sizes
//! - `--stack-depth <n>`, `--pipe <n>`, `--calls <n>`, `--lanes <n>`: Per-lane limits
//! - `--data <file>`: Image loaded at the start of the data bank
//! - `--io <file>`: Image loaded at the start of the io bank
//! - `--dump <page>`: Data page printed after the run (default 0)
//!
//! Log level comes from `ZEN80_LOG` (`debug`, `info`, `warn`, `error`).
//!
//! # Host operations
//! - `OPERATE 0`: write A to stdout as a byte
//! - `OPERATE 1`: print A in decimal on its own line

use std::env;
use std::io::Write;
use std::process;
use zen80::virtual_machine::host::{Host, OperateContext};
use zen80::virtual_machine::memory::{BankKind, PAGE_SIZE};
use zen80::virtual_machine::vm::{Machine, RunOutcome, VmConfig};
use zen80::{error, info};

const DEFAULT_BUDGET: u64 = 1_000_000;

/// Console host: byte and decimal output on stdout.
struct ConsoleHost {
    out: std::io::Stdout,
}

impl Host for ConsoleHost {
    fn operate(&mut self, operation: u8, ctx: OperateContext<'_>) -> Result<(), String> {
        let a = ctx.registers.a();
        let written = match operation {
            0 => self.out.write_all(&[a]),
            1 => writeln!(self.out, "{a}"),
            other => return Err(format!("unknown console operation {other}")),
        };
        written.map_err(|e| e.to_string())
    }
}

struct Options {
    code: String,
    budget: u64,
    config: VmConfig,
    data: Option<String>,
    io: Option<String>,
    dump: u8,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <code_file> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --budget <cycles>      Cycle budget (default {DEFAULT_BUDGET})");
    eprintln!("  --code-pages <n>       Code bank pages");
    eprintln!("  --data-pages <n>       Data bank pages");
    eprintln!("  --stack-pages <n>      Stack bank pages");
    eprintln!("  --io-pages <n>         Io bank pages");
    eprintln!("  --stack-depth <n>      Value stack depth limit");
    eprintln!("  --pipe <n>             Pipe capacity");
    eprintln!("  --calls <n>            Call depth limit");
    eprintln!("  --lanes <n>            Live lane limit");
    eprintln!("  --data <file>          Data bank image");
    eprintln!("  --io <file>            Io bank image");
    eprintln!("  --dump <page>          Data page to print afterwards (default 0)");
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    let Some(value) = value else {
        eprintln!("{flag} requires an argument");
        process::exit(1);
    };
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid value for {flag}: {value}");
        process::exit(1);
    })
}

fn parse_args(args: &[String]) -> Options {
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut options = Options {
        code: args[1].clone(),
        budget: DEFAULT_BUDGET,
        config: VmConfig::default(),
        data: None,
        io: None,
        dump: 0,
    };

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--budget" => options.budget = parse_value(flag, value),
            "--code-pages" => options.config.code_pages = parse_value(flag, value),
            "--data-pages" => options.config.data_pages = parse_value(flag, value),
            "--stack-pages" => options.config.stack_pages = parse_value(flag, value),
            "--io-pages" => options.config.io_pages = parse_value(flag, value),
            "--stack-depth" => options.config.stack_depth = parse_value(flag, value),
            "--pipe" => options.config.pipe_capacity = parse_value(flag, value),
            "--calls" => options.config.call_depth = parse_value(flag, value),
            "--lanes" => options.config.max_lanes = parse_value(flag, value),
            "--data" => options.data = Some(parse_value(flag, value)),
            "--io" => options.io = Some(parse_value(flag, value)),
            "--dump" => options.dump = parse_value(flag, value),
            other => {
                eprintln!("Unexpected argument: {other}\n");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
        i += 2;
    }
    options
}

fn read_file(path: &str) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| {
        error!("cannot read {path}: {e}");
        process::exit(1);
    })
}

fn main() {
    zen80::utils::log::init_from_env();
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    let code = read_file(&options.code);
    let mut machine = match Machine::new(options.config, &code) {
        Ok(machine) => machine,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    for (bank, path) in [(BankKind::Data, &options.data), (BankKind::Io, &options.io)] {
        if let Some(path) = path {
            if let Err(e) = machine.load_image(bank, 0, &read_file(path)) {
                error!("{e}");
                process::exit(1);
            }
        }
    }

    info!("running {} ({} bytes)", options.code, code.len());
    let mut host = ConsoleHost {
        out: std::io::stdout(),
    };
    let outcome = machine.run(&mut host, options.budget);
    let _ = host.out.flush();

    println!();
    println!("outcome: {outcome:?}");
    println!("cycles:  {}", machine.cycles());
    for (group, cycles) in machine.profile().iter().filter(|(_, c)| *c > 0) {
        println!("  {:<12} {cycles}", group.as_str());
    }
    for exit in machine.exits() {
        println!("{}: {} [{}]", exit.lane, exit.reason, exit.registers);
    }
    for lane in machine.lanes() {
        println!("{}: {:?} [{}]", lane.id(), lane.status(), lane.registers());
    }

    let start = options.dump as usize * PAGE_SIZE;
    match machine.memory().read(BankKind::Data, start, PAGE_SIZE) {
        Ok(page) => {
            println!("data page {}:", options.dump);
            for (row, chunk) in page.chunks(16).enumerate() {
                let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
                println!("  {:04x}  {}", start + row * 16, hex.join(" "));
            }
        }
        Err(e) => error!("{e}"),
    }

    let code = match outcome {
        RunOutcome::Completed | RunOutcome::Halted | RunOutcome::Nuked => 0,
        RunOutcome::BudgetExhausted => 2,
        RunOutcome::Faulted { .. } => 3,
    };
    process::exit(code);
}
