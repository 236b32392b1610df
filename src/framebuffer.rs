/// default CHIP-8 resolution
pub const CHIP8_WIDTH: usize = 64;
pub const CHIP8_HEIGHT: usize = 32;

/// Monochrome pixel grid, one bool per cell, row-major. Only the clear and
/// draw instructions change it; everyone else gets a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new(CHIP8_WIDTH, CHIP8_HEIGHT)
    }
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|px| *px = false);
    }

    /// `false` for anything off-grid
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// XOR `sprite` onto the grid with its top-left corner at (x, y). Each
    /// row is one byte, MSB leftmost. Coordinates wrap around both edges.
    /// Returns true if any lit pixel was switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collided = false;
        if self.pixels.is_empty() {
            return collided;
        }
        for (row, bits) in sprite.iter().enumerate() {
            let ty = (y + row) % self.height;
            for col in 0..8 {
                if bits & (0x80u8 >> col) == 0 {
                    continue;
                }
                let tx = (x + col) % self.width;
                let px = &mut self.pixels[ty * self.width + tx];
                collided |= *px;
                *px = !*px;
            }
        }
        collided
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|px| **px).count()
    }

    /// iterate (x, y, lit) over every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        let w = self.width;
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, px)| (i % w, i / w, *px))
    }

    /// pack into 1 bit per pixel, MSB first, rows concatenated; the last byte
    /// is zero-padded when width * height isn't a multiple of 8
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; (self.pixels.len() + 7) / 8];
        for (i, px) in self.pixels.iter().enumerate() {
            if *px {
                out[i / 8] |= 0x80u8 >> (i % 8);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolution() {
        let fb = Framebuffer::default();
        assert_eq!((fb.width(), fb.height()), (64, 32));
        assert_eq!(fb.to_packed_bytes().len(), 256);
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_draw_sets_pixels() {
        let mut fb = Framebuffer::default();
        assert!(!fb.draw_sprite(0, 0, &[0b1010_0000]));
        assert!(fb.get(0, 0));
        assert!(!fb.get(1, 0));
        assert!(fb.get(2, 0));
        assert_eq!(fb.lit_count(), 2);
    }

    #[test]
    fn test_double_draw_restores_and_collides() {
        let mut fb = Framebuffer::default();
        fb.draw_sprite(3, 3, &[0xff]);
        let before = fb.clone();
        let sprite = [0x3c, 0x42, 0x81];
        assert!(!fb.draw_sprite(10, 5, &sprite));
        assert!(fb.draw_sprite(10, 5, &sprite));
        assert_eq!(fb, before);
    }

    #[test]
    fn test_wraps_horizontally_and_vertically() {
        let mut fb = Framebuffer::default();
        fb.draw_sprite(62, 31, &[0xf0, 0xf0]);
        assert!(fb.get(62, 31));
        assert!(fb.get(63, 31));
        assert!(fb.get(0, 31));
        assert!(fb.get(1, 31));
        assert!(fb.get(62, 0));
        assert!(fb.get(1, 0));
        assert_eq!(fb.lit_count(), 8);
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::default();
        fb.draw_sprite(0, 0, &[0xff; 5]);
        fb.clear();
        assert_eq!(fb, Framebuffer::default());
    }

    #[test]
    fn test_parameterized_resolution() {
        let mut fb = Framebuffer::new(128, 64);
        fb.draw_sprite(127, 63, &[0x80]);
        assert!(fb.get(127, 63));
        assert_eq!(fb.to_packed_bytes().len(), 1024);
    }

    #[test]
    fn test_packed_bytes_msb_first() {
        let mut fb = Framebuffer::default();
        fb.draw_sprite(0, 1, &[0x81]);
        let packed = fb.to_packed_bytes();
        assert_eq!(packed[8], 0x81);
        assert_eq!(packed.iter().filter(|b| **b != 0).count(), 1);
    }

    #[test]
    fn test_draw_on_empty_grid_is_noop() {
        let mut fb = Framebuffer::new(0, 32);
        assert!(!fb.draw_sprite(3, 3, &[0xff]));
        assert_eq!(fb.lit_count(), 0);
    }
}
