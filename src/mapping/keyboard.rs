//! Host keyboard routing: menu navigation, menu key, hotkeys, passthrough.

use super::dispatcher::{Effect, MenuAction, Mode};
use super::hotkey::{HotkeyTable, Modifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Keycodes used while the menu is up, plus the key that opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuKeys {
    pub activate: u16,
    pub up: u16,
    pub down: u16,
    pub left: u16,
    pub right: u16,
    pub page_up: u16,
    pub page_down: u16,
    pub home: u16,
    pub end: u16,
    pub select: u16,
    pub cancel: u16,
    pub map: u16,
}

impl Default for MenuKeys {
    fn default() -> Self {
        Self {
            activate: 293, // F12
            up: 273,
            down: 274,
            left: 276,
            right: 275,
            page_up: 280,
            page_down: 281,
            home: 278,
            end: 279,
            select: 13,  // Return
            cancel: 8,   // Backspace
            map: 109,    // 'm'
        }
    }
}

impl MenuKeys {
    /// Menu action bound to `keycode`, the activation key closes the menu
    pub fn menu_action(&self, keycode: u16) -> Option<MenuAction> {
        let table = [
            (self.activate, MenuAction::Exit),
            (self.up, MenuAction::Up),
            (self.down, MenuAction::Down),
            (self.left, MenuAction::Left),
            (self.right, MenuAction::Right),
            (self.page_up, MenuAction::PageUp),
            (self.page_down, MenuAction::PageDown),
            (self.home, MenuAction::Home),
            (self.end, MenuAction::End),
            (self.select, MenuAction::Select),
            (self.cancel, MenuAction::Cancel),
            (self.map, MenuAction::Map),
        ];
        table
            .into_iter()
            .find(|(key, _)| *key == keycode)
            .map(|(_, action)| action)
    }
}

/// Keys whose press was passed through to the emulated machine. Their
/// release goes to the machine too, whatever the modifiers or mode are by
/// then.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    keys: HashSet<u16>,
}

impl HeldKeys {
    pub fn contains(&self, keycode: u16) -> bool {
        self.keys.contains(&keycode)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Route a host key press.
///
/// In menu or capture mode keys only navigate. In run mode the menu key
/// wins over hotkeys, and hotkeys win over the emulated keyboard.
pub fn route_key_press(
    keycode: u16,
    modifiers: Modifiers,
    mode: Mode,
    keys: &MenuKeys,
    hotkeys: &HotkeyTable,
    held: &mut HeldKeys,
) -> Option<Effect> {
    if mode.is_navigation() {
        return keys.menu_action(keycode).map(|action| Effect::Menu {
            action,
            pressed: true,
        });
    }

    if keycode == keys.activate {
        return Some(Effect::OpenMenu);
    }

    if let Some(entry) = hotkeys.get(keycode, modifiers) {
        debug!("Hotkey {} {:?} -> {}", keycode, modifiers, entry);
        return Some(Effect::InvokeMenuEntry(entry));
    }

    held.keys.insert(keycode);
    Some(Effect::HostKey {
        keycode,
        modifiers,
        pressed: true,
    })
}

/// Route a host key release. Only keys the machine saw pressed are released
/// to it, so the menu key and hotkeys stay silent even when the modifiers
/// changed while the key was down.
pub fn route_key_release(
    keycode: u16,
    modifiers: Modifiers,
    mode: Mode,
    keys: &MenuKeys,
    held: &mut HeldKeys,
) -> Option<Effect> {
    if held.keys.remove(&keycode) {
        return Some(Effect::HostKey {
            keycode,
            modifiers,
            pressed: false,
        });
    }

    if mode.is_navigation() {
        return keys
            .menu_action(keycode)
            .filter(|action| *action != MenuAction::Exit)
            .map(|action| Effect::Menu {
                action,
                pressed: false,
            });
    }

    None
}
