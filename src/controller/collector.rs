use super::event::{hat_bits, DeviceId, RawInputEvent};
use crate::mapping::device::DeviceInfo;
use crate::mapping::table::ElementCounts;
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

// Axis order exposed to the action tables
const AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

// Button order exposed to the action tables, d-pad buttons become hat 0
const BUTTONS: [Button; 13] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
];

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Gamepads in registration order, index is the DeviceId
    devices: Vec<GamepadId>,

    // Current hat bits per device
    hats: Vec<u8>,
}

impl EventCollector<Initializing> {
    pub fn create() -> Result<Self, CollectorError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };
        Ok(Self::new(gilrs, Vec::new(), Vec::new()))
    }

    /// Enumerate connected gamepads and report them in device id order
    pub fn initialize(mut self) -> (EventCollector<Collecting>, Vec<DeviceInfo>) {
        let mut infos = Vec::new();
        for (id, gamepad) in self.gilrs.gamepads() {
            let resting_axes = AXES
                .iter()
                .map(|axis| {
                    gamepad
                        .axis_data(*axis)
                        .map(|data| to_raw(*axis, data.value()))
                        .unwrap_or(0)
                })
                .collect();
            info!("  [{}] ID: {}, Name: {}", infos.len(), id, gamepad.name());
            infos.push(DeviceInfo {
                name: gamepad.name().to_string(),
                counts: ElementCounts {
                    axes: AXES.len(),
                    buttons: BUTTONS.len(),
                    hats: 1,
                    balls: 0,
                },
                resting_axes,
            });
            self.devices.push(id);
        }

        if infos.is_empty() {
            warn!("No gamepad connected, continuing in idle mode");
        }
        self.hats = vec![hat_bits::CENTERED; self.devices.len()];
        (self.transition(), infos)
    }
}

impl EventCollector<Collecting> {
    /// Next event that maps onto a registered device, without blocking
    pub fn next_event(&mut self) -> Option<(DeviceId, RawInputEvent)> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let Some(device) = self.devices.iter().position(|known| *known == id) else {
                debug!("Skipping event from unregistered gamepad {}", id);
                continue;
            };
            if let Some(raw) = self.convert(device, event) {
                return Some((device, raw));
            }
        }
        None
    }

    fn convert(&mut self, device: DeviceId, event: EventType) -> Option<RawInputEvent> {
        match event {
            EventType::AxisChanged(axis, value, _) => {
                let index = AXES.iter().position(|known| *known == axis)?;
                Some(RawInputEvent::Axis {
                    index,
                    value: to_raw(axis, value),
                })
            }
            EventType::ButtonPressed(button, _) => self.button(device, button, true),
            EventType::ButtonReleased(button, _) => self.button(device, button, false),
            EventType::Connected | EventType::Disconnected => {
                // device count is fixed after start-up
                warn!("Gamepad {} hot-plug ignored: {:?}", device, event);
                None
            }
            _ => None,
        }
    }

    fn button(&mut self, device: DeviceId, button: Button, pressed: bool) -> Option<RawInputEvent> {
        let bit = match button {
            Button::DPadUp => hat_bits::UP,
            Button::DPadDown => hat_bits::DOWN,
            Button::DPadLeft => hat_bits::LEFT,
            Button::DPadRight => hat_bits::RIGHT,
            _ => {
                let index = BUTTONS.iter().position(|known| *known == button)?;
                return Some(RawInputEvent::Button { index, pressed });
            }
        };
        let bits = self.hats.get_mut(device)?;
        if pressed {
            *bits |= bit;
        } else {
            *bits &= !bit;
        }
        Some(RawInputEvent::Hat {
            index: 0,
            bits: *bits,
        })
    }
}

/// gilrs reports -1.0..=1.0 with Y up, tables expect i16 with Y down
fn to_raw(axis: Axis, value: f32) -> i16 {
    let value = match axis {
        Axis::LeftStickY | Axis::RightStickY => -value,
        _ => value,
    };
    (value.clamp(-1.0, 1.0) * 32767.0) as i16
}
