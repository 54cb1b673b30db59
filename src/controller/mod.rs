//! Raw input side of the engine
//!
//! 1. [`event`] - Backend-neutral hardware events
//! 2. [`hysteresis`] - Threshold/fuzz decoding of axes and hats
//! 3. `collector` - gilrs backend (feature `gamepad`)
//!
//! ```text
//! Gamepad ──► Collector ──► RawInputEvent ──► Dispatcher
//! ```

#[cfg(feature = "gamepad")]
pub mod collector;
pub mod event;
pub mod hysteresis;
