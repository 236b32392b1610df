//! # opcode
//!
//! One decode table for the whole crate. The interpreter executes an
//! [`Instruction`] and the disassembler prints the very same value, so the
//! two can't drift apart.
//!
//! Instruction word layout (big-endian, nibble-aligned):
//!
//! ```text
//!  15    12 11     8 7      4 3      0
//! | family |   x    |   y    |   n    |
//!          |<-------- nnn ----------->|
//!                   |<----- kk ------>|
//! ```
use std::fmt;

/// the raw field tuple of an instruction word; every u16 has one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub word: u16,
    /// high nibble, the instruction family
    pub family: u8,
    /// bits 8-11, first register index
    pub x: u8,
    /// bits 4-7, second register index
    pub y: u8,
    /// low nibble
    pub n: u8,
    /// low 8 bits, immediate
    pub kk: u8,
    /// low 12 bits, address
    pub nnn: u16,
}

impl Opcode {
    pub fn new(word: u16) -> Self {
        Opcode {
            word,
            family: (word >> 12) as u8,
            x: ((word >> 8) & 0xf) as u8,
            y: ((word >> 4) & 0xf) as u8,
            n: (word & 0xf) as u8,
            kk: (word & 0xff) as u8,
            nnn: word & 0x0fff,
        }
    }

    /// combine two bytes fetched from memory, high byte first
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Self::new(u16::from_be_bytes([hi, lo]))
    }
}

/// Register indices are 0..=0xf; `Vf` doubles as the flag register.
pub type Reg = u8;

/// Every instruction the interpreter knows, with its operands already pulled
/// out of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SeImm(Reg, u8),
    /// 4xkk
    SneImm(Reg, u8),
    /// 5xy0
    SeReg(Reg, Reg),
    /// 6xkk
    LdImm(Reg, u8),
    /// 7xkk
    AddImm(Reg, u8),
    /// 8xy0
    LdReg(Reg, Reg),
    /// 8xy1
    Or(Reg, Reg),
    /// 8xy2
    And(Reg, Reg),
    /// 8xy3
    Xor(Reg, Reg),
    /// 8xy4
    AddReg(Reg, Reg),
    /// 8xy5
    Sub(Reg, Reg),
    /// 8xy6
    Shr(Reg, Reg),
    /// 8xy7
    Subn(Reg, Reg),
    /// 8xyE
    Shl(Reg, Reg),
    /// 9xy0
    SneReg(Reg, Reg),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxkk
    Rnd(Reg, u8),
    /// Dxyn
    Drw(Reg, Reg, u8),
    /// Ex9E
    Skp(Reg),
    /// ExA1
    Sknp(Reg),
    /// Fx07
    LdVxDt(Reg),
    /// Fx0A
    LdVxK(Reg),
    /// Fx15
    LdDtVx(Reg),
    /// Fx18
    LdStVx(Reg),
    /// Fx1E
    AddI(Reg),
    /// Fx29
    LdF(Reg),
    /// Fx33
    LdB(Reg),
    /// Fx55
    StoreRegs(Reg),
    /// Fx65
    LoadRegs(Reg),
    /// anything else; executes as a no-op
    Unknown(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Self {
        Self::from(Opcode::new(word))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Instruction::Unknown(_))
    }
}

impl From<Opcode> for Instruction {
    fn from(op: Opcode) -> Self {
        use Instruction::*;
        let Opcode { x, y, n, kk, nnn, .. } = op;
        match (op.family, x, y, n) {
            (0x0, 0x0, 0xe, 0x0) => Cls,
            (0x0, 0x0, 0xe, 0xe) => Ret,
            (0x1, ..) => Jp(nnn),
            (0x2, ..) => Call(nnn),
            (0x3, ..) => SeImm(x, kk),
            (0x4, ..) => SneImm(x, kk),
            (0x5, _, _, 0x0) => SeReg(x, y),
            (0x6, ..) => LdImm(x, kk),
            (0x7, ..) => AddImm(x, kk),
            (0x8, _, _, 0x0) => LdReg(x, y),
            (0x8, _, _, 0x1) => Or(x, y),
            (0x8, _, _, 0x2) => And(x, y),
            (0x8, _, _, 0x3) => Xor(x, y),
            (0x8, _, _, 0x4) => AddReg(x, y),
            (0x8, _, _, 0x5) => Sub(x, y),
            (0x8, _, _, 0x6) => Shr(x, y),
            (0x8, _, _, 0x7) => Subn(x, y),
            (0x8, _, _, 0xe) => Shl(x, y),
            (0x9, _, _, 0x0) => SneReg(x, y),
            (0xa, ..) => LdI(nnn),
            (0xb, ..) => JpV0(nnn),
            (0xc, ..) => Rnd(x, kk),
            (0xd, ..) => Drw(x, y, n),
            (0xe, _, 0x9, 0xe) => Skp(x),
            (0xe, _, 0xa, 0x1) => Sknp(x),
            (0xf, _, 0x0, 0x7) => LdVxDt(x),
            (0xf, _, 0x0, 0xa) => LdVxK(x),
            (0xf, _, 0x1, 0x5) => LdDtVx(x),
            (0xf, _, 0x1, 0x8) => LdStVx(x),
            (0xf, _, 0x1, 0xe) => AddI(x),
            (0xf, _, 0x2, 0x9) => LdF(x),
            (0xf, _, 0x3, 0x3) => LdB(x),
            (0xf, _, 0x5, 0x5) => StoreRegs(x),
            (0xf, _, 0x6, 0x5) => LoadRegs(x),
            _ => Unknown(op.word),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SeImm(x, kk) => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SneImm(x, kk) => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdImm(x, kk) => write!(f, "LD V{:X}, {:#04x}", x, kk),
            AddImm(x, kk) => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, _) => write!(f, "SHR V{:X}", x),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, _) => write!(f, "SHL V{:X}", x),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, {:#05x}", a),
            JpV0(a) => write!(f, "JP V0, {:#05x}", a),
            Rnd(x, kk) => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdVxDt(x) => write!(f, "LD V{:X}, DT", x),
            LdVxK(x) => write!(f, "LD V{:X}, K", x),
            LdDtVx(x) => write!(f, "LD DT, V{:X}", x),
            LdStVx(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdF(x) => write!(f, "LD F, V{:X}", x),
            LdB(x) => write!(f, "LD B, V{:X}", x),
            StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(w) => write!(f, "RAW {:#06x}", w),
        }
    }
}
