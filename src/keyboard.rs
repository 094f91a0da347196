use crate::definitions::{
    Word, BACKSPACE_KEY, DOWN_KEY, LEFT_KEY, NEWLINE_KEY, RIGHT_KEY, UP_KEY,
};
use std::collections::HashMap;

use lazy_static::lazy_static;

// raw codes as delivered by the platform (java.awt.event.KeyEvent virtual key codes)
pub const RAW_BACKSPACE: u16 = 8;
pub const RAW_ENTER: u16 = 10;
pub const RAW_ESCAPE: u16 = 27;
pub const RAW_SPACE: u16 = 32;
pub const RAW_LEFT: u16 = 37;
pub const RAW_UP: u16 = 38;
pub const RAW_RIGHT: u16 = 39;
pub const RAW_DOWN: u16 = 40;

lazy_static! {
    static ref DEFAULT_REMAP: HashMap<u16, Word> = {
        let mut map = HashMap::new();
        map.insert(RAW_LEFT, LEFT_KEY);
        map.insert(RAW_UP, UP_KEY);
        map.insert(RAW_RIGHT, RIGHT_KEY);
        map.insert(RAW_DOWN, DOWN_KEY);
        map.insert(RAW_BACKSPACE, BACKSPACE_KEY);
        map.insert(RAW_ENTER, NEWLINE_KEY);
        map
    };
    static ref RAW_KEY_CODES: HashMap<&'static str, u16> = {
        let mut map = HashMap::new();
        // browser names
        map.insert("ArrowLeft", RAW_LEFT);
        map.insert("ArrowUp", RAW_UP);
        map.insert("ArrowRight", RAW_RIGHT);
        map.insert("ArrowDown", RAW_DOWN);
        map.insert("Enter", RAW_ENTER);
        // sdl names
        map.insert("Left", RAW_LEFT);
        map.insert("Up", RAW_UP);
        map.insert("Right", RAW_RIGHT);
        map.insert("Down", RAW_DOWN);
        map.insert("Return", RAW_ENTER);
        // both
        map.insert("Backspace", RAW_BACKSPACE);
        map.insert("Escape", RAW_ESCAPE);
        map.insert("Space", RAW_SPACE);
        map
    };
}

/// Maps raw platform key codes to the values the machine expects in its keyboard register.
///
/// Codes without an entry are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    remap: HashMap<u16, Word>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            remap: DEFAULT_REMAP.clone(),
        }
    }
}

impl KeyMap {
    /// A map without any entries, every code maps to itself.
    pub fn identity() -> Self {
        Self {
            remap: HashMap::new(),
        }
    }

    pub fn insert(&mut self, raw: u16, code: Word) -> Option<Word> {
        self.remap.insert(raw, code)
    }

    pub fn translate(&self, raw: u16) -> Word {
        self.remap.get(&raw).copied().unwrap_or(raw as Word)
    }

    pub fn len(&self) -> usize {
        self.remap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remap.is_empty()
    }
}

/// Converts the name of a key, as reported by the browser or SDL, into its raw code.
pub fn raw_key_code(name: &str) -> Option<u16> {
    if name.len() == 1 {
        name.chars()
            .next()
            // virtual key codes of letters are the upper case ascii values
            .map(|c| c.to_ascii_uppercase())
            .filter(char::is_ascii)
            .map(|c| c as u16)
    } else {
        RAW_KEY_CODES.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_remap() {
        let map = KeyMap::default();
        assert_eq!(130, map.translate(37));
        assert_eq!(131, map.translate(38));
        assert_eq!(132, map.translate(39));
        assert_eq!(133, map.translate(40));
        assert_eq!(129, map.translate(8));
        assert_eq!(128, map.translate(10));
        assert_eq!(6, map.len());
    }

    #[test]
    fn test_unmapped_codes_pass_through() {
        let map = KeyMap::default();
        assert_eq!(65, map.translate(65));
        assert_eq!(0, map.translate(0));
        assert_eq!(37, KeyMap::identity().translate(37));
    }

    #[test]
    fn test_override() {
        let mut map = KeyMap::default();
        assert_eq!(Some(130), map.insert(37, 200));
        assert_eq!(200, map.translate(37));
    }

    #[test]
    fn test_raw_key_codes() {
        assert_eq!(Some(65), raw_key_code("a"));
        assert_eq!(Some(65), raw_key_code("A"));
        assert_eq!(Some(49), raw_key_code("1"));
        assert_eq!(Some(37), raw_key_code("ArrowLeft"));
        assert_eq!(Some(37), raw_key_code("Left"));
        assert_eq!(Some(10), raw_key_code("Return"));
        assert_eq!(Some(32), raw_key_code("Space"));
        assert_eq!(None, raw_key_code("Hyper"));
        assert_eq!(None, raw_key_code("ä"));
    }
}
