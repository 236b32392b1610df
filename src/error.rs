use std::fmt;
use std::io;

/// Why a ROM could not be copied into memory. None of these touch the
/// machine; it stays in its zeroed, font-seeded state.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("refusing to load a zero-length ROM")]
    Empty,

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("a ROM is already loaded at {origin:#05x}")]
    AlreadyLoaded { origin: u16 },

    #[error("failed to read ROM: {0}")]
    Io(#[from] io::Error),
}

/// Engine invariants a program can violate. Execution can't continue past
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FaultKind {
    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("instruction fetch outside of memory")]
    FetchOutOfBounds,

    #[error("memory access out of bounds at {addr:#06x} (+{len})")]
    MemoryOutOfBounds { addr: u16, len: usize },
}

/// A fatal fault, pinned to the instruction that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub pc: u16,
    /// `None` only when the fetch itself failed
    pub opcode: Option<u16>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Some(op) => write!(f, "{} at pc {:#05x} (opcode {:#06x})", self.kind, self.pc, op),
            None => write!(f, "{} at pc {:#05x}", self.kind, self.pc),
        }
    }
}

impl std::error::Error for Fault {}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("load origin {origin:#05x} must lie in {min:#05x}..{max:#06x}")]
    BadOrigin { origin: u16, min: u16, max: u16 },

    #[error("display must be at least 1x1, got {width}x{height}")]
    BadResolution { width: usize, height: usize },

    #[error("instructions per frame must be non-zero")]
    ZeroSpeed,

    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Why the front end loop stopped early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("front end I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("executor thread panicked")]
    ExecutorPanicked,
}
