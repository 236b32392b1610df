//! # interpreter
//!
//! Machine state, all owned by one [`Chip8Interpreter`]:
//!  V0-VF        16 8bit registers; VF doubles as carry / borrow / collision flag
//!  I            16bit index register, for sprite and block memory ops
//!  PC           16bit program counter                  -- starts at the load origin
//!  stack        16 return addresses                    -- over/underflow is a fault
//!  delay timer  8bit, counted down by the 60Hz interrupt
//!  sound timer  ditto; we only keep the value, there's no tone
//!  framebuffer  64x32 (or configured) 1bit pixels
//!  keypad       16 keys, replaced wholesale by the input side
//!
//! `step()` runs exactly one instruction, or nothing at all while a
//! `LD Vx, K` is waiting for a key. Faults are raised before the faulting
//! instruction changes anything.
use crate::config::Config;
use crate::disasm::Disassembly;
use crate::error::{ConfigError, Fault, FaultKind, LoadError};
use crate::framebuffer::Framebuffer;
use crate::keypad::{KeyState, Keypad};
use crate::memory::{font_glyph_addr, Chip8MemoryMap, MemoryMap, CHIP8_RAM_SIZE_BYTES};
use crate::opcode::{Instruction, Reg};
use crate::timer::Timers;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::io;

pub const CHIP8_REGISTER_COUNT: usize = 16;
pub const CHIP8_STACK_DEPTH: usize = 16;

/// bytes of memory from I included in a [`RegisterDump`]
pub const DUMP_MEMORY_WINDOW: usize = 16;

/// flag register
const VF: usize = 0xf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// parked on `LD Vx, K` until a key goes down; holds x
    AwaitingKey(Reg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction),
    /// nothing ran; still waiting for a key press
    AwaitingKey,
}

/// where the program counter goes after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Wait(Reg),
}

fn skip_if(cond: bool) -> Flow {
    if cond {
        Flow::Skip
    } else {
        Flow::Next
    }
}

#[derive(Debug, Clone, Default)]
struct CallStack {
    frames: [u16; CHIP8_STACK_DEPTH],
    depth: usize,
}

impl CallStack {
    fn push(&mut self, addr: u16) -> Result<(), FaultKind> {
        let slot = self
            .frames
            .get_mut(self.depth)
            .ok_or(FaultKind::StackOverflow)?;
        *slot = addr;
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<u16, FaultKind> {
        if self.depth == 0 {
            return Err(FaultKind::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.frames[self.depth])
    }
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    registers: [u8; CHIP8_REGISTER_COUNT],
    index: u16,
    program_counter: u16,
    stack: CallStack,
    timers: Timers,
    framebuffer: Framebuffer,
    keypad: Keypad,
    run_state: RunState,
    rng: StdRng,
}

impl Chip8Interpreter {
    /// fails if `config` doesn't pass [`Config::validate`]
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Chip8Interpreter {
            memory: Chip8MemoryMap::new(config.load_origin),
            registers: [0; CHIP8_REGISTER_COUNT],
            index: 0,
            program_counter: config.load_origin,
            stack: CallStack::default(),
            timers: Timers::default(),
            framebuffer: Framebuffer::new(config.display_width, config.display_height),
            keypad: Keypad::default(),
            run_state: RunState::Running,
            rng,
        })
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        self.memory.load_program(reader)
    }

    pub fn load_bytes(&mut self, program: &[u8]) -> Result<usize, LoadError> {
        self.memory.load_bytes(program)
    }

    /// 60Hz timer interrupt: count the timers down and hand back the frame
    /// to show
    pub fn interrupt(&mut self) -> &Framebuffer {
        self.timers.tick();
        &self.framebuffer
    }

    /// Take a fresh keypad snapshot from the input side. The press edge is
    /// worked out against the previous snapshot before it gets replaced, so
    /// a key that was already down never satisfies a pending `LD Vx, K`.
    /// Returns the key that ended the wait, if any.
    pub fn update_keypad(&mut self, keys: KeyState) -> Option<u8> {
        let edge = self.keypad.replace(keys);
        match (self.run_state, edge) {
            (RunState::AwaitingKey(x), Some(key)) => {
                self.registers[x as usize] = key;
                self.program_counter = self.program_counter.wrapping_add(2);
                self.run_state = RunState::Running;
                debug!("key {:X} pressed, V{:X} set, resuming", key, x);
                Some(key)
            }
            _ => None,
        }
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        if let RunState::AwaitingKey(_) = self.run_state {
            return Ok(StepOutcome::AwaitingKey);
        }

        let pc = self.program_counter;
        let opcode = self.memory.fetch(pc).map_err(|_| Fault {
            kind: FaultKind::FetchOutOfBounds,
            pc,
            opcode: None,
        })?;
        let word = opcode.word;
        let instruction = Instruction::from(opcode);
        trace!("{:#05x}  {:04x}  {}", pc, word, instruction);

        let flow = self.execute(instruction).map_err(|kind| Fault {
            kind,
            pc,
            opcode: Some(word),
        })?;

        match flow {
            Flow::Next => self.program_counter = pc.wrapping_add(2),
            Flow::Skip => self.program_counter = pc.wrapping_add(4),
            Flow::Jump(addr) => self.program_counter = addr,
            Flow::Wait(x) => self.run_state = RunState::AwaitingKey(x),
        }
        Ok(StepOutcome::Executed(instruction))
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Flow, FaultKind> {
        use Instruction::*;
        let v = |r: Reg| r as usize;

        let flow = match instruction {
            Cls => {
                self.framebuffer.clear();
                Flow::Next
            }
            Ret => Flow::Jump(self.stack.pop()?),
            Jp(addr) => Flow::Jump(addr),
            Call(addr) => {
                self.stack.push(self.program_counter.wrapping_add(2))?;
                Flow::Jump(addr)
            }
            SeImm(x, kk) => skip_if(self.registers[v(x)] == kk),
            SneImm(x, kk) => skip_if(self.registers[v(x)] != kk),
            SeReg(x, y) => skip_if(self.registers[v(x)] == self.registers[v(y)]),
            SneReg(x, y) => skip_if(self.registers[v(x)] != self.registers[v(y)]),
            LdImm(x, kk) => {
                self.registers[v(x)] = kk;
                Flow::Next
            }
            AddImm(x, kk) => {
                self.registers[v(x)] = self.registers[v(x)].wrapping_add(kk);
                Flow::Next
            }
            LdReg(x, y) => self.alu(x, y, |_, b| (b, None)),
            Or(x, y) => self.alu(x, y, |a, b| (a | b, None)),
            And(x, y) => self.alu(x, y, |a, b| (a & b, None)),
            Xor(x, y) => self.alu(x, y, |a, b| (a ^ b, None)),
            AddReg(x, y) => self.alu(x, y, |a, b| {
                let (sum, carry) = a.overflowing_add(b);
                (sum, Some(carry as u8))
            }),
            Sub(x, y) => self.alu(x, y, |a, b| (a.wrapping_sub(b), Some((a >= b) as u8))),
            Subn(x, y) => self.alu(x, y, |a, b| (b.wrapping_sub(a), Some((b >= a) as u8))),
            Shr(x, y) => self.alu(x, y, |a, _| (a >> 1, Some(a & 1))),
            Shl(x, y) => self.alu(x, y, |a, _| (a << 1, Some(a >> 7))),
            LdI(addr) => {
                self.index = addr;
                Flow::Next
            }
            JpV0(addr) => Flow::Jump(addr.wrapping_add(self.registers[0] as u16)),
            Rnd(x, kk) => {
                self.registers[v(x)] = self.rng.gen::<u8>() & kk;
                Flow::Next
            }
            Drw(x, y, n) => {
                let sprite = self.memory.get_ro_slice(self.index, n as usize)?;
                let collided = self.framebuffer.draw_sprite(
                    self.registers[v(x)] as usize,
                    self.registers[v(y)] as usize,
                    sprite,
                );
                self.registers[VF] = collided as u8;
                Flow::Next
            }
            Skp(x) => skip_if(self.key_pressed(x)),
            Sknp(x) => skip_if(!self.key_pressed(x)),
            LdVxDt(x) => {
                self.registers[v(x)] = self.timers.delay;
                Flow::Next
            }
            LdVxK(x) => Flow::Wait(x),
            LdDtVx(x) => {
                self.timers.delay = self.registers[v(x)];
                Flow::Next
            }
            LdStVx(x) => {
                self.timers.sound = self.registers[v(x)];
                Flow::Next
            }
            AddI(x) => {
                self.index = self.index.wrapping_add(self.registers[v(x)] as u16);
                Flow::Next
            }
            LdF(x) => {
                self.index = font_glyph_addr(self.registers[v(x)]);
                Flow::Next
            }
            LdB(x) => {
                let val = self.registers[v(x)];
                self.memory
                    .write(&[val / 100, (val / 10) % 10, val % 10], self.index)?;
                Flow::Next
            }
            StoreRegs(x) => {
                self.memory
                    .write(&self.registers[..=v(x)], self.index)?;
                Flow::Next
            }
            LoadRegs(x) => {
                let src = self.memory.get_ro_slice(self.index, v(x) + 1)?;
                self.registers[..=v(x)].copy_from_slice(src);
                Flow::Next
            }
            Unknown(word) => {
                warn!(
                    "unknown opcode {:#06x} at {:#05x}, skipping",
                    word, self.program_counter
                );
                Flow::Next
            }
        };
        Ok(flow)
    }

    /// 8xyN: work out the result and flag from the operands as they were,
    /// then write Vx and only after that VF, so VF as a destination ends
    /// up holding the flag
    fn alu(&mut self, x: Reg, y: Reg, op: impl Fn(u8, u8) -> (u8, Option<u8>)) -> Flow {
        let (result, flag) = op(self.registers[x as usize], self.registers[y as usize]);
        self.registers[x as usize] = result;
        if let Some(flag) = flag {
            self.registers[VF] = flag;
        }
        Flow::Next
    }

    fn key_pressed(&self, x: Reg) -> bool {
        let key = self.registers[x as usize];
        match self.keypad.is_pressed(key) {
            Some(pressed) => pressed,
            None => {
                warn!(
                    "V{:X} holds {:#04x}, which isn't a key (at {:#05x}); treating as not pressed",
                    x, key, self.program_counter
                );
                false
            }
        }
    }

    pub fn registers(&self) -> &[u8; CHIP8_REGISTER_COUNT] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.run_state, RunState::AwaitingKey(_))
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    /// listing of the loaded program
    pub fn disassemble(&self) -> Disassembly<'_> {
        Disassembly::new(&self.memory)
    }

    pub fn dump(&self) -> RegisterDump {
        // the window stops short at the top of memory
        let top = CHIP8_RAM_SIZE_BYTES.saturating_sub(self.index as usize);
        let memory = self
            .memory
            .get_ro_slice(self.index, DUMP_MEMORY_WINDOW.min(top))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        RegisterDump {
            registers: self.registers,
            index: self.index,
            program_counter: self.program_counter,
            stack_depth: self.stack.depth,
            timers: self.timers,
            run_state: self.run_state,
            memory,
        }
    }
}

/// point-in-time copy of the CPU registers, plus the memory I points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump {
    pub registers: [u8; CHIP8_REGISTER_COUNT],
    pub index: u16,
    pub program_counter: u16,
    pub stack_depth: usize,
    pub timers: Timers,
    pub run_state: RunState,
    /// up to [`DUMP_MEMORY_WINDOW`] bytes starting at I
    pub memory: Vec<u8>,
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, vals) in self.registers.chunks(8).enumerate() {
            for (i, val) in vals.iter().enumerate() {
                write!(f, "V{:X}={:02x} ", r * 8 + i, val)?;
            }
            writeln!(f)?;
        }
        write!(f, "[I]")?;
        for byte in &self.memory {
            write!(f, " {:02x}", byte)?;
        }
        writeln!(f)?;
        let state = match self.run_state {
            RunState::Running => "running".to_string(),
            RunState::AwaitingKey(x) => format!("waiting for key -> V{:X}", x),
        };
        write!(
            f,
            "I={:#05x} PC={:#05x} SP={} DT={} ST={} ({})",
            self.index,
            self.program_counter,
            self.stack_depth,
            self.timers.delay,
            self.timers.sound,
            state
        )
    }
}
