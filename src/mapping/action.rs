//! Logical actions a mapping cell can carry.

use crate::menu::MenuRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of physical reporting element on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InputElementKind {
    Axis,
    Button,
    Hat,
    Ball,
}

impl InputElementKind {
    pub const ALL: [InputElementKind; 4] = [
        InputElementKind::Axis,
        InputElementKind::Button,
        InputElementKind::Hat,
        InputElementKind::Ball,
    ];

    /// Number of table slots one element of this kind occupies
    pub const fn multiplicity(self) -> usize {
        match self {
            InputElementKind::Axis => 2,
            InputElementKind::Button => 1,
            InputElementKind::Hat => 4,
            InputElementKind::Ball => 1,
        }
    }

    /// Numeric code used in mapping files
    pub const fn code(self) -> u8 {
        match self {
            InputElementKind::Axis => 0,
            InputElementKind::Button => 1,
            InputElementKind::Hat => 2,
            InputElementKind::Ball => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub(crate) const fn position(self) -> usize {
        self.code() as usize
    }
}

impl fmt::Display for InputElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputElementKind::Axis => "axis",
            InputElementKind::Button => "button",
            InputElementKind::Hat => "hat",
            InputElementKind::Ball => "ball",
        };
        f.write_str(name)
    }
}

/// Emulated joystick pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoyPin {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl JoyPin {
    pub const fn mask(self) -> u8 {
        match self {
            JoyPin::Up => 0x01,
            JoyPin::Down => 0x02,
            JoyPin::Left => 0x04,
            JoyPin::Right => 0x08,
            JoyPin::Fire => 0x10,
        }
    }

    pub fn from_mask(mask: u8) -> Option<Self> {
        match mask {
            0x01 => Some(JoyPin::Up),
            0x02 => Some(JoyPin::Down),
            0x04 => Some(JoyPin::Left),
            0x08 => Some(JoyPin::Right),
            0x10 => Some(JoyPin::Fire),
            _ => None,
        }
    }
}

/// What a single mapping cell does when its input asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    None,
    Joystick { port: u8, pin: JoyPin },
    /// Emulated keyboard matrix key, negative rows address the extra bank
    Key { row: i16, col: i16 },
    EnterRemapMode,
    ActivateMenu,
    InvokeMenuEntry(MenuRef),
}

impl Action {
    /// Action id used in mapping files
    pub const fn id(&self) -> u8 {
        match self {
            Action::None => 0,
            Action::Joystick { .. } => 1,
            Action::Key { .. } => 2,
            Action::EnterRemapMode => 3,
            Action::ActivateMenu => 4,
            Action::InvokeMenuEntry(_) => 5,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

/// Address of one cell inside a device's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotAddress {
    pub kind: InputElementKind,
    pub slot: usize,
}

impl SlotAddress {
    pub const fn new(kind: InputElementKind, slot: usize) -> Self {
        Self { kind, slot }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slot {}", self.kind, self.slot)
    }
}
