//! Per-device action tables and the default mapping heuristic.

use super::action::{Action, InputElementKind, JoyPin, SlotAddress};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One entry of an action table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingCell {
    pub action: Action,
    /// Last decoded state, only written by the hysteresis decoder path
    pub previous_state: u8,
}

/// Number of physical elements per kind, as reported at discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementCounts {
    pub axes: usize,
    pub buttons: usize,
    pub hats: usize,
    pub balls: usize,
}

impl ElementCounts {
    pub fn elements(&self, kind: InputElementKind) -> usize {
        match kind {
            InputElementKind::Axis => self.axes,
            InputElementKind::Button => self.buttons,
            InputElementKind::Hat => self.hats,
            InputElementKind::Ball => self.balls,
        }
    }

    pub fn slots(&self, kind: InputElementKind) -> usize {
        self.elements(kind) * kind.multiplicity()
    }
}

/// How buttons are split between fire pins and menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonLayout {
    /// Repeating pattern by index mod 4: fire, menu, remap, fire
    Interleaved,
    /// First `pin_buttons` fire (one third when unset), the rest alternate
    /// menu and remap
    Split { pin_buttons: Option<usize> },
}

impl Default for ButtonLayout {
    fn default() -> Self {
        ButtonLayout::Interleaved
    }
}

/// Inputs of the default mapping heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPolicy {
    pub primary_port: u8,
    pub threshold: u16,
    pub button_layout: ButtonLayout,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            primary_port: 0,
            threshold: 10000,
            button_layout: ButtonLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    counts: ElementCounts,
    cells: [Vec<MappingCell>; 4],
}

impl ActionTable {
    /// Empty table sized for `counts`, every cell `None`
    pub fn new(counts: ElementCounts) -> Self {
        let cells = InputElementKind::ALL.map(|kind| vec![MappingCell::default(); counts.slots(kind)]);
        Self { counts, cells }
    }

    /// Table filled by the default heuristic.
    ///
    /// `resting_axes` holds the axis values seen at discovery; axes already
    /// past the threshold at rest get no action.
    pub fn with_defaults(
        device_index: usize,
        counts: ElementCounts,
        resting_axes: &[i16],
        policy: &DefaultPolicy,
    ) -> Self {
        let mut table = Self::new(counts);
        let base = usize::from(policy.primary_port) + device_index;

        for slot in 0..counts.slots(InputElementKind::Axis) {
            let axis = slot / 2;
            let resting = resting_axes.get(axis).copied().unwrap_or(0);
            let action = if i32::from(resting).abs() > i32::from(policy.threshold) {
                if slot % 2 == 0 {
                    warn!(
                        "Axis {} rests at {} beyond the threshold, leaving it unmapped",
                        axis, resting
                    );
                }
                Action::None
            } else {
                let pin = match slot & 3 {
                    0 => JoyPin::Left,
                    1 => JoyPin::Right,
                    2 => JoyPin::Up,
                    _ => JoyPin::Down,
                };
                Action::Joystick {
                    port: port_for(base + ((slot & 4) >> 2)),
                    pin,
                }
            };
            table.cells[InputElementKind::Axis.position()][slot].action = action;
        }

        for slot in 0..counts.slots(InputElementKind::Hat) {
            let pin = match slot & 3 {
                0 => JoyPin::Up,
                1 => JoyPin::Down,
                2 => JoyPin::Left,
                _ => JoyPin::Right,
            };
            table.cells[InputElementKind::Hat.position()][slot].action = Action::Joystick {
                port: port_for(base + ((slot & 4) >> 2)),
                pin,
            };
        }

        let buttons = counts.slots(InputElementKind::Button);
        for slot in 0..buttons {
            let fire = Action::Joystick {
                port: port_for(base + (slot & 1)),
                pin: JoyPin::Fire,
            };
            let action = match policy.button_layout {
                ButtonLayout::Interleaved => match slot & 3 {
                    1 => Action::ActivateMenu,
                    2 => Action::EnterRemapMode,
                    _ => fire,
                },
                ButtonLayout::Split { pin_buttons } => {
                    let pins = pin_buttons.unwrap_or(buttons.div_ceil(3));
                    if slot < pins {
                        fire
                    } else if (slot - pins) % 2 == 0 {
                        Action::ActivateMenu
                    } else {
                        Action::EnterRemapMode
                    }
                }
            };
            table.cells[InputElementKind::Button.position()][slot].action = action;
        }

        debug!(
            "Built default table for device {} ({:?}, {:?})",
            device_index, counts, policy.button_layout
        );
        table
    }

    pub fn counts(&self) -> ElementCounts {
        self.counts
    }

    pub fn slot_count(&self, kind: InputElementKind) -> usize {
        self.cells[kind.position()].len()
    }

    pub fn contains(&self, address: SlotAddress) -> bool {
        address.slot < self.slot_count(address.kind)
    }

    pub fn cell(&self, address: SlotAddress) -> Option<&MappingCell> {
        self.cells[address.kind.position()].get(address.slot)
    }

    pub fn cell_mut(&mut self, address: SlotAddress) -> Option<&mut MappingCell> {
        self.cells[address.kind.position()].get_mut(address.slot)
    }

    pub fn action(&self, address: SlotAddress) -> Action {
        self.cell(address).map(|cell| cell.action).unwrap_or_default()
    }

    /// Overwrite one cell's action. Returns false when the address is out of range.
    pub fn set_action(&mut self, address: SlotAddress, action: Action) -> bool {
        match self.cell_mut(address) {
            Some(cell) => {
                cell.action = action;
                true
            }
            None => false,
        }
    }

    /// Set every action to `None`. Decoder state is left alone.
    pub fn clear(&mut self) {
        for cells in &mut self.cells {
            for cell in cells.iter_mut() {
                cell.action = Action::None;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotAddress, &MappingCell)> + '_ {
        InputElementKind::ALL.into_iter().flat_map(move |kind| {
            self.cells[kind.position()]
                .iter()
                .enumerate()
                .map(move |(slot, cell)| (SlotAddress::new(kind, slot), cell))
        })
    }

    /// Flip the port of every joystick action, returns how many changed
    pub fn swap_ports(&mut self) -> usize {
        let mut changed = 0;
        for cells in &mut self.cells {
            for cell in cells.iter_mut() {
                if let Action::Joystick { port, .. } = &mut cell.action {
                    *port ^= 1;
                    changed += 1;
                }
            }
        }
        changed
    }
}

fn port_for(n: usize) -> u8 {
    (n & 1) as u8
}
