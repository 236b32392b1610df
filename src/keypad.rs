/// number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// A full keypad snapshot, as supplied by the input collaborator.
pub type KeyState = [bool; KEY_COUNT];

/// Current state of the 0x0-0xF hex keypad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: KeyState,
}

impl Keypad {
    /// `None` if `key` doesn't name a key on the pad
    pub fn is_pressed(&self, key: u8) -> Option<bool> {
        self.keys.get(key as usize).copied()
    }

    /// lowest key that is down in `next` but was up here
    pub fn press_edge(&self, next: &KeyState) -> Option<u8> {
        self.keys
            .iter()
            .zip(next.iter())
            .position(|(was, now)| !was && *now)
            .map(|i| i as u8)
    }

    /// commit a new snapshot, returning the press edge it contained
    pub fn replace(&mut self, next: KeyState) -> Option<u8> {
        let edge = self.press_edge(&next);
        self.keys = next;
        edge
    }
}

/// build a snapshot with just `pressed` held down
pub fn keys_down(pressed: &[u8]) -> KeyState {
    let mut keys = [false; KEY_COUNT];
    for k in pressed {
        if let Some(slot) = keys.get_mut(*k as usize) {
            *slot = true;
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_key() {
        let pad = Keypad::default();
        assert_eq!(pad.is_pressed(0xf), Some(false));
        assert_eq!(pad.is_pressed(0x10), None);
    }

    #[test]
    fn test_edge_ignores_held_keys() {
        let mut pad = Keypad::default();
        pad.replace(keys_down(&[3]));
        assert_eq!(pad.press_edge(&keys_down(&[3])), None);
        assert_eq!(pad.press_edge(&keys_down(&[3, 9])), Some(9));
    }

    #[test]
    fn test_simultaneous_edges_pick_lowest() {
        let pad = Keypad::default();
        assert_eq!(pad.press_edge(&keys_down(&[0xc, 0x5, 0xa])), Some(5));
    }

    #[test]
    fn test_release_is_not_an_edge() {
        let mut pad = Keypad::default();
        pad.replace(keys_down(&[1, 2]));
        assert_eq!(pad.replace(keys_down(&[])), None);
        assert_eq!(pad, Keypad::default());
    }
}
