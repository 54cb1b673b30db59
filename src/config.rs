use crate::mapping::dispatcher::AutorepeatSettings;
use crate::mapping::keyboard::MenuKeys;
use crate::mapping::table::{ButtonLayout, DefaultPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/joymap";
const SETTINGS_FILE: &str = "settings.toml";

/// Largest accepted threshold or fuzz value
pub const AXIS_LIMIT: u16 = 32767;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write settings {}: {}", .0.display(), .1)]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{name} must be within 0..=32767, got {value}")]
    OutOfRange { name: &'static str, value: u32 },
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct JoystickSettings {
    pub threshold: u32,
    pub fuzz: u32,
    /// Port of the first stick of device 0 in default tables
    pub primary_port: u8,
    pub button_layout: ButtonLayout,
    /// User joystick map, loaded as an optional override
    pub map_file: Option<PathBuf>,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            threshold: 10000,
            fuzz: 1000,
            primary_port: 0,
            button_layout: ButtonLayout::default(),
            map_file: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HotkeySettings {
    /// Shipped hotkeys, loaded first
    pub builtin_file: Option<PathBuf>,
    /// User hotkeys, patched over the built-in set
    pub user_file: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub remap_timeout_secs: u32,
    pub joystick: JoystickSettings,
    pub hotkeys: HotkeySettings,
    pub menu_keys: MenuKeys,
    pub autorepeat: AutorepeatSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remap_timeout_secs: 5,
            joystick: JoystickSettings::default(),
            hotkeys: HotkeySettings::default(),
            menu_keys: MenuKeys::default(),
            autorepeat: AutorepeatSettings::default(),
        }
    }
}

impl Settings {
    /// `$HOME/.config/joymap/settings.toml`
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    /// Load settings, a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Settings file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read(path.to_path_buf(), e)),
        };

        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        info!("Loaded settings from {}", path.display());
        debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(parent.to_path_buf(), e))?;
        }
        fs::write(path, content).map_err(|e| ConfigError::Write(path.to_path_buf(), e))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("joystick.threshold", self.joystick.threshold),
            ("joystick.fuzz", self.joystick.fuzz),
        ] {
            if value > u32::from(AXIS_LIMIT) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Threshold clamped into range
    pub fn threshold(&self) -> u16 {
        clamp_axis(self.joystick.threshold)
    }

    /// Fuzz clamped into range
    pub fn fuzz(&self) -> u16 {
        clamp_axis(self.joystick.fuzz)
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        DefaultPolicy {
            primary_port: self.joystick.primary_port,
            threshold: self.threshold(),
            button_layout: self.joystick.button_layout,
        }
    }

    pub fn remap_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.remap_timeout_secs))
    }
}

fn clamp_axis(value: u32) -> u16 {
    value.min(u32::from(AXIS_LIMIT)) as u16
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
