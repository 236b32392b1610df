use crate::error::{FaultKind, LoadError};
use crate::opcode::Opcode;
use log::debug;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the addressable memory of the machine
pub trait MemoryMap {
    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], FaultKind>;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], FaultKind>;

    fn read_byte(&self, addr: u16) -> Result<u8, FaultKind> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// fetch the two-byte opcode at `addr`
    fn fetch(&self, addr: u16) -> Result<Opcode, FaultKind> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(Opcode::from_bytes(word[0], word[1]))
    }

    /// write a chunk of bytes; nothing is written unless all of it fits
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), FaultKind> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where programs are conventionally loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the built-in font lives; must sit below the load origin
pub const CHIP8_FONT_ADDR: u16 = 0x050;

/// bytes per font glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// first byte past the font table
pub const CHIP8_FONT_END: u16 = CHIP8_FONT_ADDR + CHIP8_FONT.len() as u16;

/// Defines the CHIP-8 memory map
///
///   0x0000-0x004f  unused (interpreter)
///   0x0050-0x009f  font, 16 glyphs x 5 bytes
///   0x00a0-origin  unused (interpreter)
///   origin-end     loaded program
///   end-0x0fff     workspace
///
/// `load_origin` defaults to 0x200.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    load_origin: u16,
    load_end: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], FaultKind> {
        let a = addr as usize;
        self.bytes
            .get(a..a + len)
            .ok_or(FaultKind::MemoryOutOfBounds { addr, len })
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], FaultKind> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + len)
            .ok_or(FaultKind::MemoryOutOfBounds { addr, len })
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in; `load_origin` must already be
    /// validated (see [`crate::Config::validate`])
    pub fn new(load_origin: u16) -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            load_origin,
            load_end: load_origin,
        }
    }

    pub fn load_origin(&self) -> u16 {
        self.load_origin
    }

    /// first byte past the loaded program; equals the origin until a load
    /// succeeds
    pub fn load_end(&self) -> u16 {
        self.load_end
    }

    /// largest program that fits between the origin and the top of memory
    pub fn max_program_len(&self) -> usize {
        CHIP8_RAM_SIZE_BYTES.saturating_sub(self.load_origin as usize)
    }

    pub fn is_loaded(&self) -> bool {
        self.load_end > self.load_origin
    }

    /// load a CHIP-8 program from any byte source at the load origin
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_bytes(&buf)
    }

    pub fn load_bytes(&mut self, program: &[u8]) -> Result<usize, LoadError> {
        if self.is_loaded() {
            return Err(LoadError::AlreadyLoaded {
                origin: self.load_origin,
            });
        }
        if program.is_empty() {
            return Err(LoadError::Empty);
        }
        let max = self.max_program_len();
        if program.len() > max {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max,
            });
        }
        let origin = self.load_origin as usize;
        self.bytes[origin..origin + program.len()].copy_from_slice(program);
        self.load_end = (origin + program.len()) as u16;
        debug!(
            "loaded {} bytes at {:#05x}..{:#05x}",
            program.len(),
            self.load_origin,
            self.load_end
        );
        Ok(program.len())
    }
}

/// address of the glyph for hex digit `digit` (low nibble only)
pub fn font_glyph_addr(digit: u8) -> u16 {
    CHIP8_FONT_ADDR + (digit & 0xf) as u16 * CHIP8_FONT_GLYPH_BYTES
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        // NB. zeroed from 0x200; the font sits below that
        assert_eq!(m.bytes[0x200..], [0; 0xe00]);
        assert_eq!(m.bytes[..0x50], [0; 0x50]);
    }

    #[test]
    fn test_font_seeded() {
        let m = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        assert_eq!(m.get_ro_slice(font_glyph_addr(0), 5), Ok(&CHIP8_FONT[..5]));
        assert_eq!(
            m.get_ro_slice(font_glyph_addr(0xf), 5),
            Ok(&[0xF0, 0x80, 0xF0, 0x80, 0x80][..])
        );
    }

    #[test]
    fn test_glyph_addr_masks_high_nibble() {
        assert_eq!(font_glyph_addr(0x1a), font_glyph_addr(0xa));
        assert_eq!(font_glyph_addr(0xa), 0x050 + 50);
    }

    #[test]
    fn test_write_slice_ok() {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        dst.write(&[0, 1, 2, 3, 4, 5, 6, 7], 8).unwrap();
        assert_eq!(
            dst.bytes[..16],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0).unwrap();
        assert_eq!(m.fetch(0x4).map(|op| op.word), Ok(0x0405));
    }

    #[test]
    fn test_read_word_at_top_fails() {
        let m = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        assert_eq!(m.fetch(0xffe).map(|op| op.word), Ok(0));
        assert_eq!(
            m.fetch(0xfff).map(|op| op.word),
            Err(FaultKind::MemoryOutOfBounds { addr: 0xfff, len: 2 })
        );
    }

    #[test]
    fn test_write_too_much_leaves_memory_alone() {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        assert!(dst.write(&[0xaa; 8], 4089).is_err());
        assert_eq!(dst.bytes[4089..], [0; 7]);
    }

    #[test]
    fn test_program_load_ok() -> Result<(), LoadError> {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(dst.load_program(&mut prog)?, 2);
        assert_eq!(dst.get_ro_slice(0x200, 2), Ok(&[0x00, 0xe0][..]));
        assert_eq!(dst.load_end(), 0x202);
        Ok(())
    }

    #[test]
    fn test_empty_load_fails() {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        let mut prog: &[u8] = &[];
        assert!(matches!(dst.load_program(&mut prog), Err(LoadError::Empty)));
        assert_eq!(dst.load_end(), dst.load_origin());
    }

    #[test]
    fn test_exact_fit_loads() -> Result<(), LoadError> {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        let prog = vec![0x11; 4096 - 0x200];
        dst.load_bytes(&prog)?;
        assert_eq!(dst.load_end() as usize, 4096);
        Ok(())
    }

    #[test]
    fn test_one_byte_too_many_fails() {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        let prog = vec![0x11; 4096 - 0x200 + 1];
        match dst.load_bytes(&prog) {
            Err(LoadError::TooLarge { size, max }) => {
                assert_eq!(size, 3585);
                assert_eq!(max, 3584);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(dst.bytes[0x200..], [0; 0xe00]);
        assert!(!dst.is_loaded());
    }

    #[test]
    fn test_second_load_fails() -> Result<(), LoadError> {
        let mut dst = Chip8MemoryMap::new(CHIP8_PROGRAM_ADDR);
        dst.load_bytes(&[0x00, 0xe0])?;
        assert!(matches!(
            dst.load_bytes(&[0x12, 0x00]),
            Err(LoadError::AlreadyLoaded { origin: 0x200 })
        ));
        Ok(())
    }

    #[test]
    fn test_custom_origin() -> Result<(), LoadError> {
        let mut dst = Chip8MemoryMap::new(0x600);
        dst.load_bytes(&[0xab, 0xcd])?;
        assert_eq!(dst.fetch(0x600).map(|op| op.word), Ok(0xabcd));
        assert_eq!(dst.max_program_len(), 0xa00);
        Ok(())
    }

    #[test]
    fn test_origin_past_memory_fits_nothing() {
        let mut dst = Chip8MemoryMap::new(0x2000);
        assert_eq!(dst.max_program_len(), 0);
        assert!(matches!(
            dst.load_bytes(&[0x00, 0xe0]),
            Err(LoadError::TooLarge { size: 2, max: 0 })
        ));
    }
}
