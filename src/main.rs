use std::error::Error;
use std::fs::File;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use clap::Parser;

use chip8vm::display::MonoTermDisplay;
use chip8vm::environment::Environment;
use chip8vm::input::StdinInput;
use chip8vm::{Chip8Interpreter, Config, Session};

#[derive(Parser)]
#[command(name = "chip8vm")]
#[command(about = "A CHIP-8 virtual machine for the terminal")]
struct Args {
    /// ROM file to load
    rom: PathBuf,

    #[arg(long, help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, value_parser = parse_addr, help = "load origin, e.g. 0x200")]
    origin: Option<u16>,

    #[arg(long, help = "instructions per 60Hz frame")]
    ipf: Option<u32>,

    #[arg(long, help = "seed for RND")]
    seed: Option<u64>,

    #[arg(long, help = "print a disassembly of the ROM and exit")]
    disasm: bool,

    #[arg(long, help = "write logs here (RUST_LOG picks the level)")]
    log_file: Option<PathBuf>,

    #[arg(long, help = "stop after this many frames")]
    frames: Option<u64>,
}

fn parse_addr(s: &str) -> Result<u16, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    // the terminal belongs to the display, so without a file we stay quiet
    let default = if log_file.is_some() { "chip8vm=debug" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    // initialise
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(origin) = args.origin {
        config.load_origin = origin;
    }
    if let Some(ipf) = args.ipf {
        config.instructions_per_frame = ipf;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    // load a program
    let mut interpreter = Chip8Interpreter::new(&config)?;
    let mut f = File::open(&args.rom)?;
    interpreter.load_program(&mut f)?;

    if args.disasm {
        for line in interpreter.disassemble().listing() {
            println!("{}", line);
        }
        return Ok(());
    }

    let session = Session::spawn(interpreter, &config)?;
    let report = {
        let mut display = MonoTermDisplay::new(config.display_width, config.display_height)?;
        let mut input = StdinInput::new()?;
        Environment::new(session)
            .frame_limit(args.frames)
            .run(&mut display, &mut input)?
    };

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..2 {
        println!();
    }

    if let Some(fault) = report.fault {
        eprintln!("{}", report.interpreter.dump());
        return Err(Box::new(fault));
    }
    Ok(())
}
