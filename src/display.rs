use crate::framebuffer::Framebuffer;
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is what the front end hands each frame to. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// draw one frame
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    fn matches(&self, frame: &Framebuffer) -> bool {
        self.0 == frame.width() && self.1 == frame.height()
    }

    /// canvas coords of one bitplane; y grows downwards on the chip8, upwards
    /// on the canvas
    fn bitplane_from_frame(frame: &Framebuffer, lit: bool) -> Vec<(f64, f64)> {
        frame
            .cells()
            .filter(|(_, _, px)| *px == lit)
            .map(|(x, y, _)| (x as f64, -1.0 * y as f64))
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y),
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        if !self.resolution.matches(frame) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "MonoTermDisplay is {}x{}, got a {}x{} frame",
                    self.resolution.0,
                    self.resolution.1,
                    frame.width(),
                    frame.height()
                ),
            ));
        }

        let off = Resolution::bitplane_from_frame(frame, false);
        let on = Resolution::bitplane_from_frame(frame, true);
        let resolution = &self.resolution;

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

/// useful for testing the front end; keeps the last frame it was given
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: u64,
    pub last: Option<Framebuffer>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplanes_partition_frame() {
        let mut frame = Framebuffer::default();
        frame.draw_sprite(1, 2, &[0x80]);
        let on = Resolution::bitplane_from_frame(&frame, true);
        let off = Resolution::bitplane_from_frame(&frame, false);
        assert_eq!(on, [(1.0, -2.0)]);
        assert_eq!(on.len() + off.len(), 64 * 32);
    }

    #[test]
    fn test_resolution_matches() {
        assert!(Resolution(64, 32).matches(&Framebuffer::default()));
        assert!(!Resolution(128, 64).matches(&Framebuffer::default()));
    }

    #[test]
    fn test_dummy_keeps_last() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        let mut frame = Framebuffer::default();
        d.draw(&frame)?;
        frame.draw_sprite(0, 0, &[0xff]);
        d.draw(&frame)?;
        assert_eq!(d.frames, 2);
        assert_eq!(d.last.as_ref().map(|f| f.lit_count()), Some(8));
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. figure out how to stop rendering during tests
    fn test_draw_rejects_wrong_size() {
        let mut d = MonoTermDisplay::new(64, 32).unwrap();
        assert!(d.draw(&Framebuffer::new(128, 64)).is_err());
    }
}
