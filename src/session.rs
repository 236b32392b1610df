//! The execution task. One thread owns the [`Chip8Interpreter`] for its
//! whole life; everything else talks to it over two channels:
//!
//!  in   [`Command`]  keypad snapshots, inspection requests, halt
//!  out  [`Output`]   one frame per 60Hz tick, then a single `Halted`
//!
//! Commands are only handled between instructions, so nobody ever sees a
//! half-executed one.
use crate::config::Config;
use crate::error::Fault;
use crate::framebuffer::Framebuffer;
use crate::interpreter::{Chip8Interpreter, RegisterDump, StepOutcome};
use crate::keypad::KeyState;
use crate::timer::FrameClock;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info, trace};
use std::io;
use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};

/// frames held for a slow consumer before new ones are dropped
const FRAME_BACKLOG: usize = 4;

pub enum Command {
    /// full keypad state, replacing the last one
    Keypad(KeyState),
    Disassemble(Sender<Vec<String>>),
    Dump(Sender<RegisterDump>),
    Halt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Frame(Framebuffer),
    /// last message; carries the fault if that's what stopped us
    Halted(Option<Fault>),
}

/// what's left once the executor stops
pub struct Report {
    pub interpreter: Chip8Interpreter,
    pub fault: Option<Fault>,
    pub frames: u64,
}

pub struct Session {
    commands: Sender<Command>,
    output: Receiver<Output>,
    handle: JoinHandle<Report>,
}

impl Session {
    /// move `interpreter` onto its own thread and start running
    pub fn spawn(interpreter: Chip8Interpreter, config: &Config) -> io::Result<Session> {
        let (commands, command_rx) = channel::unbounded();
        // one slot more than the backlog so `Halted` always fits
        let (output_tx, output) = channel::bounded(FRAME_BACKLOG + 1);
        let ipf = config.instructions_per_frame;
        let handle = thread::Builder::new()
            .name("chip8-executor".into())
            .spawn(move || run(interpreter, ipf, command_rx, output_tx))?;
        Ok(Session {
            commands,
            output,
            handle,
        })
    }

    /// false once the executor has gone away
    pub fn send_keypad(&self, keys: KeyState) -> bool {
        self.commands.send(Command::Keypad(keys)).is_ok()
    }

    pub fn halt(&self) {
        let _ = self.commands.send(Command::Halt);
    }

    /// listing of the loaded program, fetched through the executor
    pub fn disassemble(&self) -> Option<Vec<String>> {
        let (tx, rx) = channel::bounded(1);
        self.commands.send(Command::Disassemble(tx)).ok()?;
        rx.recv().ok()
    }

    pub fn dump(&self) -> Option<RegisterDump> {
        let (tx, rx) = channel::bounded(1);
        self.commands.send(Command::Dump(tx)).ok()?;
        rx.recv().ok()
    }

    pub fn output(&self) -> &Receiver<Output> {
        &self.output
    }

    /// stop the executor if it's still going and wait for it; `Err` only if
    /// it panicked
    pub fn join(self) -> thread::Result<Report> {
        drop(self.commands);
        self.handle.join()
    }
}

fn handle(interpreter: &mut Chip8Interpreter, command: Command) -> ControlFlow<()> {
    match command {
        Command::Keypad(keys) => {
            interpreter.update_keypad(keys);
        }
        Command::Disassemble(reply) => {
            let _ = reply.send(interpreter.disassemble().listing().collect());
        }
        Command::Dump(reply) => {
            let _ = reply.send(interpreter.dump());
        }
        Command::Halt => {
            debug!("halt requested");
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

fn run(
    mut interpreter: Chip8Interpreter,
    instructions_per_frame: u32,
    commands: Receiver<Command>,
    output: Sender<Output>,
) -> Report {
    let mut clock = FrameClock::default();
    let mut fault = None;
    let mut frames = 0u64;
    info!(
        "executor started at {:#05x}, {} instructions per frame",
        interpreter.program_counter(),
        instructions_per_frame
    );

    'session: loop {
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if handle(&mut interpreter, command).is_break() {
                        break 'session;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'session,
            }
        }

        for _ in 0..instructions_per_frame {
            match interpreter.step() {
                Ok(StepOutcome::AwaitingKey) => break,
                Ok(StepOutcome::Executed(_)) => {}
                Err(f) => {
                    error!("{}", f);
                    fault = Some(f);
                    break 'session;
                }
            }
        }

        let frame = interpreter.interrupt().clone();
        frames += 1;
        if output.len() < FRAME_BACKLOG {
            if output.try_send(Output::Frame(frame)).is_err() {
                debug!("frame consumer went away");
                break 'session;
            }
        } else {
            trace!("consumer behind, dropped frame {}", frames);
        }

        // stay responsive to commands (a key for LD Vx, K, or a halt) for
        // most of the frame, then spin out the rest
        loop {
            match commands.recv_deadline(clock.wake_deadline()) {
                Ok(command) => {
                    if handle(&mut interpreter, command).is_break() {
                        break 'session;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break 'session,
            }
        }
        clock.wait();
        clock.advance();
    }

    info!("executor stopped after {} frames", frames);
    let _ = output.try_send(Output::Halted(fault));
    Report {
        interpreter,
        fault,
        frames,
    }
}
