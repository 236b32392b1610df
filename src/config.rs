use crate::error::ConfigError;
use crate::framebuffer::{CHIP8_HEIGHT, CHIP8_WIDTH};
use crate::memory::{CHIP8_FONT_END, CHIP8_PROGRAM_ADDR, CHIP8_RAM_SIZE_BYTES};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Emulator settings. Every field has a default, so a config file only has
/// to name what it changes:
///
/// ```toml
/// load_origin = 0x200
/// instructions_per_frame = 12
/// seed = 42
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// where the ROM is copied and execution starts
    pub load_origin: u16,
    /// instructions executed per 60 Hz frame
    pub instructions_per_frame: u32,
    pub display_width: usize,
    pub display_height: usize,
    /// fixed seed for RND, for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            load_origin: CHIP8_PROGRAM_ADDR,
            instructions_per_frame: 10,
            display_width: CHIP8_WIDTH,
            display_height: CHIP8_HEIGHT,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // the origin must leave the font intact and room for at least one
        // instruction
        let max = (CHIP8_RAM_SIZE_BYTES - 2) as u16;
        if self.load_origin < CHIP8_FONT_END || self.load_origin > max {
            return Err(ConfigError::BadOrigin {
                origin: self.load_origin,
                min: CHIP8_FONT_END,
                max,
            });
        }
        if self.display_width == 0 || self.display_height == 0 {
            return Err(ConfigError::BadResolution {
                width: self.display_width,
                height: self.display_height,
            });
        }
        if self.instructions_per_frame == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        Ok(())
    }
}
