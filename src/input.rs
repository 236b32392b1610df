use crate::keypad::{KeyState, KEY_COUNT};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// left-hand side of a qwerty keyboard laid over the COSMAC hex pad
///
///   1 2 3 4        1 2 3 C
///   q w e r   =>   4 5 6 D
///   a s d f        7 8 9 E
///   z x c v        A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// terminals report presses (and autorepeat) but never releases, so a key
/// counts as held for this many scans after its last event
const KEY_HOLD_SCANS: u8 = 6;

/// produces keypad snapshots for the emulator
pub trait Input {
    /// current state of all 16 keys
    fn scan(&mut self) -> Result<KeyState, io::Error>;

    /// true once the user asked to leave
    fn quit_requested(&self) -> bool;
}

/// keyboard input from the terminal, using crossterm
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    held: [u8; KEY_COUNT],
    quit: bool,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            held: [0; KEY_COUNT],
            quit: false,
        })
    }

    fn on_key(&mut self, evt: KeyEvent) {
        match evt.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(mapped) => self.held[*mapped as usize] = KEY_HOLD_SCANS,
                None => debug!("can't map {:?} to a COSMAC key", key),
            },
            other => debug!("ignoring key {:?}", other),
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn scan(&mut self) -> Result<KeyState, io::Error> {
        self.held.iter_mut().for_each(|h| *h = h.saturating_sub(1));
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                self.on_key(evt);
            }
        }
        let mut keys = [false; KEY_COUNT];
        for (key, held) in keys.iter_mut().zip(self.held.iter()) {
            *key = *held > 0;
        }
        Ok(keys)
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing: plays back a script of keypad
/// states, one per scan, then holds the last one
pub struct DummyInput {
    script: VecDeque<KeyState>,
    current: KeyState,
    scans: usize,
    quit_after: Option<usize>,
}

impl DummyInput {
    /// start with `keys` held down
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            script: VecDeque::new(),
            current: crate::keypad::keys_down(keys),
            scans: 0,
            quit_after: None,
        }
    }

    /// queue another state for the next scan
    pub fn then(mut self, keys: &[u8]) -> Self {
        self.script.push_back(crate::keypad::keys_down(keys));
        self
    }

    /// ask to quit once this many scans have happened
    pub fn quit_after(mut self, scans: usize) -> Self {
        self.quit_after = Some(scans);
        self
    }

    pub fn scans(&self) -> usize {
        self.scans
    }
}

impl Input for DummyInput {
    fn scan(&mut self) -> Result<KeyState, io::Error> {
        let keys = self.current;
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
        self.scans += 1;
        Ok(keys)
    }

    fn quit_requested(&self) -> bool {
        self.quit_after.map_or(false, |n| self.scans >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::keys_down;

    #[test]
    fn test_keymap_covers_every_key() {
        let mut seen: Vec<u8> = CHIP8_CONVENTIONAL_KEYMAP.iter().map(|(_, k)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_dummy_plays_script() -> Result<(), io::Error> {
        let mut input = DummyInput::new(&[1]).then(&[]).then(&[2, 3]).quit_after(4);
        assert_eq!(input.scan()?, keys_down(&[1]));
        assert_eq!(input.scan()?, keys_down(&[]));
        assert_eq!(input.scan()?, keys_down(&[2, 3]));
        assert!(!input.quit_requested());
        assert_eq!(input.scan()?, keys_down(&[2, 3]));
        assert!(input.quit_requested());
        Ok(())
    }
}
