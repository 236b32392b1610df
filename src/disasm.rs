use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::opcode::{Instruction, Opcode};

/// Walks the loaded program two bytes at a time, decoding lazily. Cloning
/// (or asking the interpreter again) starts over from the origin.
#[derive(Clone)]
pub struct Disassembly<'a> {
    memory: &'a Chip8MemoryMap,
    addr: u16,
    end: u16,
}

impl<'a> Disassembly<'a> {
    pub fn new(memory: &'a Chip8MemoryMap) -> Self {
        Disassembly {
            memory,
            addr: memory.load_origin(),
            end: memory.load_end(),
        }
    }

    /// bare mnemonics, e.g. `LD V1, 0x0a`
    pub fn mnemonics(self) -> impl Iterator<Item = String> + 'a {
        self.map(|(_, instruction)| instruction.to_string())
    }

    /// address-tagged lines, e.g. `0x200: CLS`
    pub fn listing(self) -> impl Iterator<Item = String> + 'a {
        self.map(|(addr, instruction)| format!("{:#05x}: {}", addr, instruction))
    }
}

impl<'a> Iterator for Disassembly<'a> {
    type Item = (u16, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        if self.addr >= self.end {
            return None;
        }
        let addr = self.addr;
        // an odd-length program ends on a half word; pad it from memory
        let hi = self.memory.read_byte(addr).ok()?;
        let lo = self.memory.read_byte(addr + 1).unwrap_or(0);
        self.addr = addr.saturating_add(2);
        Some((addr, Instruction::from(Opcode::from_bytes(hi, lo))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let words = (self.end.saturating_sub(self.addr) as usize + 1) / 2;
        (words, Some(words))
    }
}
