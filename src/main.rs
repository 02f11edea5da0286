//! ZEV - CLI Entry Point
//!
//! Commands:
//! - `zev run <program>` - Run a `.zev` source or `.zimg` image
//! - `zev debug <program>` - Interactive debugger
//! - `zev asm <source>` - Assemble to an image
//! - `zev disasm <image>` - Disassemble an image
//! - `zev test` - Built-in self-test

use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zev::{MachineConfig, Program};

#[derive(Parser)]
#[command(name = "zev")]
#[command(version = "0.1.0")]
#[command(about = "A minimal binary virtual machine for the ZEV instruction set")]
struct Cli {
    /// Machine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the number of registers
    #[arg(long, global = true)]
    registers: Option<usize>,
    /// Override the memory capacity in slots
    #[arg(long, global = true)]
    memory_slots: Option<usize>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it exits
    Run {
        /// Path to the `.zev` source or image to execute
        program: PathBuf,
        /// Stop after this many cycles
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Print each executed word to stderr
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the `.zev` source or image to debug
        program: PathBuf,
    },
    /// Assemble source to an image
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output image file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the image file
        image: PathBuf,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli);

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace }) => {
            run_program(&program, config, max_cycles, trace);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program, config);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output, &config);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("ZEV Virtual Machine v0.1.0");
            println!("A tiny register machine running on bit-strings");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_binary_primitives();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> MachineConfig {
    let mut config = match &cli.config {
        Some(path) => match MachineConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => MachineConfig::default(),
    };

    if let Some(n) = cli.registers {
        config.register_count = n;
    }
    if let Some(n) = cli.memory_slots {
        config.memory_max_slots = Some(n);
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    config
}

/// Load a program: `.zev` files are assembled, anything else is an image.
fn load_program(path: &Path, config: &MachineConfig) -> Program {
    use zev::{assemble_with_width, load_image};

    let is_source = path.extension().is_some_and(|ext| ext == "zev");

    let program = if is_source {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble_with_width(&source, config.token_width) {
            Ok(program) => {
                eprintln!("📝 Assembled {} words", program.len());
                program
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_image(path) {
            Ok(program) => {
                eprintln!("📂 Loaded {} words", program.len());
                program
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    };

    if program.is_empty() {
        eprintln!("❌ No words to execute");
        std::process::exit(1);
    }

    program
}

fn run_program(path: &Path, config: MachineConfig, max_cycles: u64, trace: bool) {
    use zev::{ConsoleSerial, Cpu, CpuState};
    use zev::asm::disasm::format_instruction;

    eprintln!("🔧 Running: {}", path.display());
    let program = load_program(path, &config);

    let mut cpu = Cpu::with_serial(config, ConsoleSerial);
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    while cpu.is_running() && cpu.cycle < max_cycles {
        let addr = cpu.next_address();

        match cpu.step() {
            Ok(executed) => {
                if trace {
                    let text = match &executed {
                        Some(instr) => format_instruction(instr),
                        None => "(data)".to_string(),
                    };
                    eprintln!("{:>6}: {:<24} {:?}", addr.to_string(), text, cpu.regs);
                }
            }
            Err(e) => {
                eprintln!("❌ CPU fault: {}", e);
                std::process::exit(1);
            }
        }
    }

    match cpu.state {
        CpuState::Halted(code) => {
            eprintln!("✓ Exited with status {} after {} cycles", code, cpu.cycle);
            std::process::exit(code);
        }
        _ => {
            eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path, config: MachineConfig) {
    use zev::tui::run_debugger;

    eprintln!("🔍 Loading: {}", path.display());
    let program = load_program(path, &config);

    eprintln!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(config, program) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &Path, _config: MachineConfig) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>, config: &MachineConfig) {
    use zev::{assemble_with_width, save_image};

    let out_path = output.unwrap_or_else(|| source_path.with_extension("zimg"));

    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    // Read source
    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    // Assemble
    let program = match assemble_with_width(&source, config.token_width) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} words", program.len());

    if let Err(e) = save_image(&out_path, &program) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path.display());
}

fn disassemble_file(image_path: &Path) {
    use zev::{disassemble, load_image};

    println!("📖 Disassembling: {}", image_path.display());
    println!();

    let program = match load_image(image_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble(&program));
}

fn demo_binary_primitives() {
    use zev::binary::{add_binary, decode_signed, encode_unsigned, sub_binary};

    println!("━━━ Binary Codec Demo ━━━");
    println!();

    println!("Fixed-width encoding (4 bits):");
    for value in [0u64, 7, 15, 42] {
        println!("  {:>2} → {}", value, encode_unsigned(value, 4));
    }
    println!();

    println!("Bit-string arithmetic:");
    let pairs = [("0111", "0011"), ("0011", "0111"), ("1111", "0001")];
    for (a, b) in pairs {
        if let (Ok(sum), Ok(diff)) = (add_binary(a, b), sub_binary(a, b)) {
            println!("  {} + {} = {:<6} {} - {} = {:<6} ({})",
                a, b, sum, a, b, diff,
                decode_signed(diff.as_str()).unwrap_or_default());
        }
    }
    println!();

    println!("✓ Core binary primitives working!");
}

fn run_self_test() {
    use zev::{assemble, CaptureSerial, Cpu, CpuError, Memory, Word};
    use zev::binary::{add_binary, decode_signed, decode_unsigned, encode_unsigned, sub_binary};

    println!("━━━ ZEV Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    // Codec
    let ok = [0u64, 1, 7, 15, 255, 1 << 40]
        .iter()
        .all(|&v| decode_unsigned(encode_unsigned(v, 4).as_str()) == Ok(v));
    check("Encode/decode roundtrip", ok);

    check("Signed decode", decode_signed("-101") == Ok(-5));

    // Arithmetic
    let ok = add_binary("0111", "0011").map(|b| b.as_str() == "1010").unwrap_or(false);
    check("Bit-string addition", ok);

    let ok = sub_binary("0011", "0111").map(|b| b.as_str() == "-100").unwrap_or(false);
    check("Bit-string subtraction", ok);

    // Memory
    let mut mem = Memory::new();
    let ok = match Word::parse("0101 0000") {
        Ok(word) => mem.insert(word.clone()).map(|a| mem.get(a) == Ok(&word)).unwrap_or(false),
        Err(_) => false,
    };
    check("Memory insert/get", ok);

    // CPU
    let run = |source: &str| -> Result<(Vec<Option<i64>>, Result<i32, CpuError>), String> {
        let program = assemble(source).map_err(|e| e.to_string())?;
        let mut cpu = Cpu::with_serial(Default::default(), CaptureSerial::new());
        cpu.load_program(&program).map_err(|e| e.to_string())?;
        let result = cpu.run().map(|status| status.code);
        Ok((cpu.serial().values().to_vec(), result))
    };

    let ok = matches!(
        run("MOV reg0 $7\nMOV reg1 $3\nADD reg0 reg1 reg2\nOUT reg2\nEXIT $0"),
        Ok((out, Ok(0))) if out == [Some(10)]
    );
    check("CPU add program", ok);

    let ok = matches!(
        run("MOV reg0 $3\nMOV reg1 $7\nSUB reg0 reg1 reg2\nOUT reg2\nEXIT $0"),
        Ok((out, Ok(0))) if out == [Some(-4)]
    );
    check("CPU negative subtraction", ok);

    let ok = matches!(
        run("MOV reg0 $7\nMOV reg1 $0\nDIV reg0 reg1 reg2"),
        Ok((_, Err(CpuError::DivisionByZero { cycle: 3 })))
    );
    check("CPU division by zero fault", ok);

    let ok = matches!(run("OUT reg8"), Ok((_, Err(CpuError::InvalidRegister { cycle: 1, .. }))));
    check("CPU invalid register fault", ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
