//! Remap capture: wait for the next qualifying input and bind it.
//!
//! A capture is armed with the action to assign and a deadline. Every event
//! polled while it is armed is offered to it; the first qualifying one
//! decides which table cell (or hotkey) receives the action. There is no
//! timer, the deadline is checked whenever an event or a poll arrives.

use super::action::{Action, InputElementKind, SlotAddress};
use super::hotkey::Modifiers;
use crate::controller::event::{hat_bits, DeviceId, RawInputEvent};
use crate::menu::MenuRef;
use chrono::{DateTime, Duration, Local};
use statum::{machine, state};
use tracing::{debug, info, warn};

/// What the captured input will be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapTarget {
    /// Assign an action to whichever device slot is triggered
    Joystick(Action),
    /// Bind (or unbind with `None`) the next key combination
    Hotkey(Option<MenuRef>),
}

/// Cell picked by a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturedSlot {
    Device {
        device: DeviceId,
        address: SlotAddress,
    },
    Key {
        keycode: u16,
        modifiers: Modifiers,
    },
}

#[state]
#[derive(Debug, Clone)]
pub enum CaptureState {
    Armed,
    Captured(CapturedSlot),
    Expired,
}

#[machine]
#[derive(Debug)]
pub struct RemapCapture<S: CaptureState> {
    target: RemapTarget,
    deadline: DateTime<Local>,
    threshold: u16,
}

pub type PendingCapture = RemapCapture<Armed>;

/// Result of offering one input to an armed capture
#[derive(Debug)]
pub enum CaptureStep {
    Waiting(RemapCapture<Armed>),
    Captured(RemapCapture<Captured>),
    Expired(RemapCapture<Expired>),
}

impl<S: CaptureState> RemapCapture<S> {
    pub fn target(&self) -> RemapTarget {
        self.target
    }

    pub fn deadline(&self) -> DateTime<Local> {
        self.deadline
    }
}

impl RemapCapture<Armed> {
    /// Arm a capture that expires `timeout` after `now`.
    pub fn arm(target: RemapTarget, threshold: u16, timeout: Duration, now: DateTime<Local>) -> Self {
        info!("Waiting for input to bind {:?} ({}s)", target, timeout.num_seconds());
        Self::new(target, now + timeout, threshold)
    }

    /// Offer a device event. Only joystick targets accept device events.
    pub fn offer_event(self, device: DeviceId, event: &RawInputEvent, now: DateTime<Local>) -> CaptureStep {
        if now >= self.deadline {
            return self.expire();
        }
        if !matches!(self.target, RemapTarget::Joystick(_)) {
            return CaptureStep::Waiting(self);
        }

        match qualifying_slot(event, self.threshold) {
            Some(address) => {
                debug!("Captured {} on device {}", address, device);
                CaptureStep::Captured(self.transition_with(CapturedSlot::Device { device, address }))
            }
            None => CaptureStep::Waiting(self),
        }
    }

    /// Offer a key press. Only hotkey targets accept keys.
    pub fn offer_key(self, keycode: u16, modifiers: Modifiers, now: DateTime<Local>) -> CaptureStep {
        if now >= self.deadline {
            return self.expire();
        }
        if !matches!(self.target, RemapTarget::Hotkey(_)) {
            return CaptureStep::Waiting(self);
        }
        debug!("Captured key {} {:?}", keycode, modifiers);
        CaptureStep::Captured(self.transition_with(CapturedSlot::Key { keycode, modifiers }))
    }

    /// Check the deadline without an input, once per poll iteration
    pub fn poll(self, now: DateTime<Local>) -> CaptureStep {
        if now >= self.deadline {
            self.expire()
        } else {
            CaptureStep::Waiting(self)
        }
    }

    fn expire(self) -> CaptureStep {
        warn!("Remap capture for {:?} timed out", self.target);
        CaptureStep::Expired(self.transition())
    }
}

impl RemapCapture<Captured> {
    pub fn slot(&self) -> Option<CapturedSlot> {
        self.get_state_data().copied()
    }
}

/// Slot an event would bind to, `None` when it does not qualify.
fn qualifying_slot(event: &RawInputEvent, threshold: u16) -> Option<SlotAddress> {
    match *event {
        RawInputEvent::Axis { index, value } => {
            let threshold = i32::from(threshold);
            let value = i32::from(value);
            let base = index.checked_mul(2)?;
            if value < -threshold {
                Some(SlotAddress::new(InputElementKind::Axis, base))
            } else if value > threshold {
                Some(SlotAddress::new(InputElementKind::Axis, base + 1))
            } else {
                None
            }
        }
        RawInputEvent::Hat { index, bits } => {
            let offset = [hat_bits::UP, hat_bits::DOWN, hat_bits::LEFT, hat_bits::RIGHT]
                .iter()
                .position(|bit| bits & bit != 0)?;
            Some(SlotAddress::new(InputElementKind::Hat, index.checked_mul(4)? + offset))
        }
        RawInputEvent::Button { index, pressed } => {
            pressed.then(|| SlotAddress::new(InputElementKind::Button, index))
        }
        RawInputEvent::Ball { index, dx, dy } => {
            (dx != 0 || dy != 0).then(|| SlotAddress::new(InputElementKind::Ball, index))
        }
    }
}
