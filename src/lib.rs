//!
//! ## Design
//!
//! * one owner for all machine state: the interpreter, moved onto an
//!   executor thread for the length of a session
//! * one decode table, shared by the executor and the disassembler
//! * 60Hz timer interrupt paces everything; a fixed number of instructions
//!   run per frame, then the executor sleeps until the next tick
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * abstract input; the keypad is replaced wholesale on every change
//! * no sound; only the sound timer value is kept
//!
//! Model
//!
//! Environment
//!  |-- display, input, config
//!  |-- session(interpreter, config)
//!  |    |-- interpreter(memory, framebuffer, keypad, timers)
//!  |    |    `-- instruction set (opcode)
//!  |    `-- executor loop, per 60Hz frame
//!  |         |-- drain commands (keypad, disassemble, dump, halt)
//!  |         |-- step() up to N times, stopping early on LD Vx, K
//!  |         |-- interrupt(): timers down, frame out
//!  |         `-- block on commands until the deadline, spinning out the
//!  |             last millisecond
//!  `-- main loop
//!       |-- frame = session.output().recv()
//!       |-- display.draw(frame)
//!       `-- input.scan() -> session.send_keypad() on change
pub mod config;
pub mod disasm;
pub mod display;
pub mod environment;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod opcode;
pub mod session;
pub mod timer;

pub use config::Config;
pub use error::{ConfigError, Fault, FaultKind, LoadError, RunError};
pub use framebuffer::Framebuffer;
pub use interpreter::{Chip8Interpreter, RegisterDump, RunState, StepOutcome};
pub use opcode::{Instruction, Opcode};
pub use session::{Command, Output, Report, Session};
