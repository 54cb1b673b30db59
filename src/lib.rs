//! Input mapping and hotkey dispatch for an emulator front-end.
//!
//! Raw joystick events go through per-device action tables and a
//! threshold/fuzz decoder and come out as effects on the emulated machine
//! or the menu. Tables and keyboard hotkeys are persisted as patchable
//! text files that refer to menu entries by label path.

pub mod config;
pub mod controller;
pub mod host;
pub mod mapping;
pub mod menu;
pub mod persistence;

pub use config::Settings;
pub use controller::event::{DeviceId, RawInputEvent};
pub use host::{EmulatedMachine, MenuHost};
pub use mapping::InputEngine;
