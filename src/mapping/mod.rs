//! Mapping of raw input to emulator actions.
//!
//! Every device owns an [`ActionTable`] built from a default heuristic and
//! patched from mapping files. The [`Dispatcher`] turns events into
//! [`Effect`]s according to the table and the current [`Mode`]; the
//! [`InputEngine`] wraps all of it behind one facade.

pub mod action;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod hotkey;
pub mod keyboard;
pub mod manager;
pub mod remap;
pub mod table;

pub use action::{Action, InputElementKind, JoyPin, SlotAddress};
pub use device::{Device, DeviceInfo, DeviceRegistry};
pub use dispatcher::{AutorepeatSettings, Dispatcher, Effect, MenuAction, Mode};
pub use error::{CodecError, MappingError};
pub use hotkey::{HotkeyTable, Modifiers};
pub use keyboard::MenuKeys;
pub use manager::{ConfigScope, ConfigSource, InputEngine};
pub use remap::{CaptureStep, CapturedSlot, PendingCapture, RemapTarget};
pub use table::{ActionTable, ButtonLayout, DefaultPolicy, ElementCounts, MappingCell};
