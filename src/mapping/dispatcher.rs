//! Turns raw device events into effects.
//!
//! The dispatcher looks up the device's action table, runs the hysteresis
//! decoder for axes and hats, and maps every resulting slot transition to an
//! [`Effect`]. Which effect depends on the [`Mode`]: in run mode actions
//! drive the emulated machine, while the menu is up the same actions steer
//! the menu instead.

use super::action::{Action, InputElementKind, JoyPin, SlotAddress};
use super::device::Device;
use super::hotkey::Modifiers;
use crate::controller::event::{hat_bits, RawInputEvent};
use crate::controller::hysteresis::{
    decode_axis, decode_hat, AxisChange, AxisDirection, AXIS_NEUTRAL,
};
use crate::menu::MenuRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dispatch mode, observed from the menu subsystem before every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Run,
    Menu,
    RemapCapture,
}

impl Mode {
    pub fn from_flags(menu_active: bool, capture_active: bool) -> Self {
        if capture_active {
            Mode::RemapCapture
        } else if menu_active {
            Mode::Menu
        } else {
            Mode::Run
        }
    }

    pub fn is_navigation(self) -> bool {
        !matches!(self, Mode::Run)
    }
}

/// Navigation commands understood by the menu subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuAction {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Select,
    Cancel,
    Exit,
    /// Assign the selected entry to the pressed input
    Map,
}

impl MenuAction {
    pub fn repeats(self) -> bool {
        matches!(
            self,
            MenuAction::Up
                | MenuAction::Down
                | MenuAction::Left
                | MenuAction::Right
                | MenuAction::PageUp
                | MenuAction::PageDown
        )
    }
}

/// Concrete instruction produced for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Joystick { port: u8, pin: JoyPin, asserted: bool },
    MatrixKey { row: i16, col: i16, asserted: bool },
    OpenMenu,
    InvokeMenuEntry(MenuRef),
    Menu { action: MenuAction, pressed: bool },
    /// Key passed through unmapped to the emulated keyboard
    HostKey {
        keycode: u16,
        modifiers: Modifiers,
        pressed: bool,
    },
}

/// Poll counts for held menu directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutorepeatSettings {
    pub initial_delay: u32,
    pub repeat_delay: u32,
}

impl Default for AutorepeatSettings {
    fn default() -> Self {
        Self {
            initial_delay: 30,
            repeat_delay: 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Autorepeat {
    held: Option<MenuAction>,
    countdown: u32,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    threshold: u16,
    fuzz: u16,
    repeat: AutorepeatSettings,
    autorepeat: Autorepeat,
    remap_requested: bool,
}

impl Dispatcher {
    pub fn new(threshold: u16, fuzz: u16, repeat: AutorepeatSettings) -> Self {
        Self {
            threshold,
            fuzz,
            repeat,
            autorepeat: Autorepeat::default(),
            remap_requested: false,
        }
    }

    /// Handle one event from `device`.
    ///
    /// Never fails: events for slots outside the table are dropped.
    pub fn dispatch(&mut self, device: &mut Device, event: &RawInputEvent, mode: Mode) -> Vec<Effect> {
        if !mode.is_navigation() {
            self.autorepeat = Autorepeat::default();
        }

        let transitions = match self.slot_transitions(device, event) {
            Some(transitions) => transitions,
            None => {
                debug!(
                    "Dropping {:?} for device {}: outside its {:?}",
                    event,
                    device.id(),
                    device.counts()
                );
                return Vec::new();
            }
        };

        let mut effects = Vec::with_capacity(transitions.len());
        for (address, asserted) in transitions {
            let action = device.table.action(address);
            let effect = if mode.is_navigation() {
                self.navigation_effect(action, asserted)
            } else {
                self.run_effect(action, asserted)
            };
            if let Some(effect) = effect {
                debug!("{} on device {} -> {:?}", address, device.id(), effect);
                effects.push(effect);
            }
        }
        effects
    }

    /// One-shot flag set when an `EnterRemapMode` input was pressed
    pub fn take_remap_request(&mut self) -> bool {
        std::mem::take(&mut self.remap_requested)
    }

    /// Call once per poll iteration while the menu is up. Re-emits the held
    /// direction once the repeat delay has run out.
    pub fn autorepeat_tick(&mut self) -> Option<Effect> {
        let action = self.autorepeat.held?;
        if self.autorepeat.countdown > 0 {
            self.autorepeat.countdown -= 1;
            None
        } else {
            self.autorepeat.countdown = self.repeat.repeat_delay;
            Some(Effect::Menu {
                action,
                pressed: true,
            })
        }
    }

    fn note_menu_action(&mut self, action: MenuAction, pressed: bool) {
        if pressed && action.repeats() {
            self.autorepeat = Autorepeat {
                held: Some(action),
                countdown: self.repeat.initial_delay,
            };
        } else {
            self.autorepeat = Autorepeat::default();
        }
    }

    /// Decode the event into (slot, asserted) pairs, releases first.
    /// `None` when the element is outside the device's table.
    fn slot_transitions(
        &self,
        device: &mut Device,
        event: &RawInputEvent,
    ) -> Option<Vec<(SlotAddress, bool)>> {
        match *event {
            RawInputEvent::Axis { index, value } => {
                let base = index.checked_mul(2)?;
                let cell = device
                    .table
                    .cell_mut(SlotAddress::new(InputElementKind::Axis, base))?;
                let previous = cell.previous_state;
                let current = decode_axis(value, previous, self.threshold, self.fuzz);
                if current == previous {
                    return Some(Vec::new());
                }
                cell.previous_state = current;

                let slot_of = |direction: AxisDirection| {
                    let offset = if direction == AxisDirection::Negative { 0 } else { 1 };
                    SlotAddress::new(InputElementKind::Axis, base + offset)
                };
                let mut transitions = Vec::with_capacity(2);
                if previous != AXIS_NEUTRAL {
                    transitions.push((slot_of(AxisDirection::from_code(previous)), false));
                }
                if current != AXIS_NEUTRAL {
                    transitions.push((slot_of(AxisDirection::from_code(current)), true));
                }
                Some(transitions)
            }
            RawInputEvent::Hat { index, bits } => {
                let base = index.checked_mul(4)?;
                let cell = device
                    .table
                    .cell_mut(SlotAddress::new(InputElementKind::Hat, base))?;
                let changes = decode_hat(bits, cell.previous_state);
                cell.previous_state = bits;

                let mut transitions = Vec::new();
                for change in [changes.vertical, changes.horizontal] {
                    push_hat_change(&mut transitions, base, change);
                }
                Some(transitions)
            }
            RawInputEvent::Button { index, pressed } => {
                let address = SlotAddress::new(InputElementKind::Button, index);
                device.table.contains(address).then(|| vec![(address, pressed)])
            }
            RawInputEvent::Ball { index, dx, dy } => {
                let address = SlotAddress::new(InputElementKind::Ball, index);
                let cell = device.table.cell_mut(address)?;
                let moving = u8::from(dx != 0 || dy != 0);
                if moving == cell.previous_state {
                    return Some(Vec::new());
                }
                cell.previous_state = moving;
                Some(vec![(address, moving != 0)])
            }
        }
    }

    fn run_effect(&mut self, action: Action, asserted: bool) -> Option<Effect> {
        match action {
            Action::None => None,
            Action::Joystick { port, pin } => Some(Effect::Joystick {
                port,
                pin,
                asserted,
            }),
            Action::Key { row, col } => Some(Effect::MatrixKey { row, col, asserted }),
            Action::ActivateMenu => asserted.then_some(Effect::OpenMenu),
            Action::InvokeMenuEntry(entry) => asserted.then_some(Effect::InvokeMenuEntry(entry)),
            Action::EnterRemapMode => {
                if asserted {
                    self.remap_requested = true;
                }
                None
            }
        }
    }

    fn navigation_effect(&mut self, action: Action, pressed: bool) -> Option<Effect> {
        let menu_action = match action {
            Action::Joystick { pin, .. } => match pin {
                JoyPin::Up => MenuAction::Up,
                JoyPin::Down => MenuAction::Down,
                JoyPin::Left => MenuAction::Left,
                JoyPin::Right => MenuAction::Right,
                JoyPin::Fire => MenuAction::Select,
            },
            Action::ActivateMenu => MenuAction::Cancel,
            Action::EnterRemapMode => MenuAction::Map,
            Action::None | Action::Key { .. } | Action::InvokeMenuEntry(_) => return None,
        };
        self.note_menu_action(menu_action, pressed);
        Some(Effect::Menu {
            action: menu_action,
            pressed,
        })
    }
}

fn push_hat_change(transitions: &mut Vec<(SlotAddress, bool)>, base: usize, change: AxisChange) {
    let slot_of = |bit: u8| {
        let offset = match bit {
            hat_bits::UP => 0,
            hat_bits::DOWN => 1,
            hat_bits::LEFT => 2,
            _ => 3,
        };
        SlotAddress::new(InputElementKind::Hat, base + offset)
    };
    if let Some(bit) = change.released {
        transitions.push((slot_of(bit), false));
    }
    if let Some(bit) = change.pressed {
        transitions.push((slot_of(bit), true));
    }
}
