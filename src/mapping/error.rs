//! Error types of the mapping engine

use super::action::SlotAddress;
use crate::controller::event::DeviceId;
use std::path::PathBuf;
use thiserror::Error;

/// Problems reading or writing mapping files.
///
/// Per-line variants are collected into a load report; only `NotFound`
/// and `Io` abort a whole load or dump.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Mapping file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed line {0}")]
    Malformed(usize),

    #[error("Unknown action id {id} on line {line}")]
    UnknownAction { line: usize, id: String },

    #[error("Menu path \"{path}\" on line {line} does not match the current menu")]
    PathUnresolved { line: usize, path: String },

    #[error("Device, slot or key index out of range on line {0}")]
    OutOfRange(usize),

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    /// Line number for per-line diagnostics
    pub fn line(&self) -> Option<usize> {
        match self {
            CodecError::Malformed(line) | CodecError::OutOfRange(line) => Some(*line),
            CodecError::UnknownAction { line, .. } | CodecError::PathUnresolved { line, .. } => {
                Some(*line)
            }
            CodecError::NotFound(_) | CodecError::Io { .. } => None,
        }
    }

    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            CodecError::NotFound(path)
        } else {
            CodecError::Io { path, source }
        }
    }
}

/// Errors of runtime table operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    #[error("{address} is outside the table of device {device}")]
    SlotOutOfRange { device: DeviceId, address: SlotAddress },

    #[error("Key code {0} is outside the hotkey table")]
    KeyOutOfRange(u16),

    #[error("Menu entry is not reachable from the menu root")]
    UnreachableEntry,

    #[error("Captured input does not fit the remap target")]
    CaptureMismatch,
}
