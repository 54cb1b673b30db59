//! Raw hardware events as they arrive from the host's input backend.

use serde::{Deserialize, Serialize};

/// Index of a device in the registry, in discovery order.
pub type DeviceId = usize;

/// Hat direction bits as reported by the host backend.
pub mod hat_bits {
    pub const UP: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const DOWN: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
    pub const CENTERED: u8 = 0x00;
}

/// One unprocessed input event from a joystick-like device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawInputEvent {
    /// Absolute position of an analog axis.
    Axis { index: usize, value: i16 },
    /// Button edge.
    Button { index: usize, pressed: bool },
    /// Full bit set of a hat switch (see [`hat_bits`]).
    Hat { index: usize, bits: u8 },
    /// Relative trackball motion since the last report.
    Ball { index: usize, dx: i16, dy: i16 },
}

impl RawInputEvent {
    /// Element index the event refers to
    pub fn index(&self) -> usize {
        match *self {
            RawInputEvent::Axis { index, .. }
            | RawInputEvent::Button { index, .. }
            | RawInputEvent::Hat { index, .. }
            | RawInputEvent::Ball { index, .. } => index,
        }
    }
}
