//! # Persistence Module
//!
//! ## Why This Module Exists
//! Joystick mappings and keyboard hotkeys outlive a single run. This module
//! turns the in-memory tables into line-oriented text files and back, so a
//! user can keep a hand-edited override next to the built-in defaults.
//!
//! ## Key Abstractions
//! - **Patch Loading**: A file only overwrites the cells it mentions. The
//!   `!CLEAR` keyword wipes the tables in scope first.
//! - **Stable Menu Paths**: Menu references are written as `&`-joined label
//!   paths and resolved against the live menu tree on load.
//! - **Load Reports**: Bad lines are skipped and collected as diagnostics
//!   instead of aborting the load.
//!
//! ## Error Handling Strategy
//! File-level failures surface as [`CodecError`](crate::mapping::CodecError).
//! Everything below that is reported per line and logged at warn level.

pub mod codec;

pub use codec::{
    dump_hotkeys, dump_joymap, load_hotkeys, load_joymap, parse_hotkeys, parse_joymap,
    render_hotkeys, render_joymap, LoadReport,
};
