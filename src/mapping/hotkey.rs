//! Keyboard hotkeys: (keycode, modifiers) to menu entry.

use crate::menu::MenuRef;
use bitflags::bitflags;
use tracing::debug;

/// Host keycodes are below this value
pub const NUM_KEYCODES: usize = 512;

/// Number of modifier bits in [`Modifiers`]
pub const NUM_MODIFIERS: u32 = 4;

/// Entries in a [`HotkeyTable`]
pub const HOTKEY_TABLE_SIZE: usize = NUM_KEYCODES << NUM_MODIFIERS;

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Flat table index as used in hotkey files
pub fn flat_index(keycode: u16, modifiers: Modifiers) -> Option<usize> {
    let keycode = usize::from(keycode);
    (keycode < NUM_KEYCODES).then(|| keycode + usize::from(modifiers.bits()) * NUM_KEYCODES)
}

/// Inverse of [`flat_index`]
pub fn split_index(index: usize) -> Option<(u16, Modifiers)> {
    if index >= HOTKEY_TABLE_SIZE {
        return None;
    }
    let keycode = (index % NUM_KEYCODES) as u16;
    let modifiers = Modifiers::from_bits_truncate((index / NUM_KEYCODES) as u8);
    Some((keycode, modifiers))
}

/// Dense hotkey table with O(1) lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyTable {
    entries: Vec<Option<MenuRef>>,
}

impl Default for HotkeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self {
            entries: vec![None; HOTKEY_TABLE_SIZE],
        }
    }

    /// Bind or unbind a combination. Returns false for keycodes out of range.
    pub fn set(&mut self, keycode: u16, modifiers: Modifiers, entry: Option<MenuRef>) -> bool {
        match flat_index(keycode, modifiers) {
            Some(index) => self.set_flat(index, entry),
            None => false,
        }
    }

    fn set_flat(&mut self, index: usize, entry: Option<MenuRef>) -> bool {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, keycode: u16, modifiers: Modifiers) -> Option<MenuRef> {
        flat_index(keycode, modifiers).and_then(|index| self.entries[index])
    }

    pub fn clear_all(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
        debug!("Cleared hotkey table");
    }

    /// Bound entries in flat index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, MenuRef)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.map(|entry| (index, entry)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}
