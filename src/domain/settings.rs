use crate::domain::ir_codes::default_code_table;
use crate::domain::models::IrCodeEntry;
use crate::infrastructure::bluetooth::protocol::{Timing, ADAPTER_PATH, DEFAULT_WRITE_TIMEOUT_MS};
use crate::infrastructure::bluetooth::resolver::CharacteristicUuids;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_target: default_false(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "ble_ir_programmer".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // BlueZ Settings
    #[serde(default = "default_adapter_path")]
    pub adapter_path: String,
    #[serde(default)]
    pub characteristics: CharacteristicUuids,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    // Programming Settings
    #[serde(default)]
    pub timing: Timing,
    #[serde(default = "default_code_table")]
    pub code_table: Vec<IrCodeEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            adapter_path: default_adapter_path(),
            characteristics: CharacteristicUuids::default(),
            write_timeout_ms: default_write_timeout_ms(),
            timing: Timing::default(),
            code_table: default_code_table(),
        }
    }
}

impl Settings {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn default_adapter_path() -> String {
    ADAPTER_PATH.to_string()
}
fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    /// Load from the default location, falling back to defaults if the file
    /// does not exist yet
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::open(settings_path)
    }

    /// Load from an explicit settings file
    pub fn open(settings_path: PathBuf) -> anyhow::Result<Self> {
        let settings = if settings_path.exists() {
            Self::load_from_file(&settings_path)?
        } else {
            Settings::default()
        };

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("ble-ir-programmer");
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.settings_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Replace the code table with the entries of a JSON file
    pub fn load_code_table(&mut self, path: &Path) -> anyhow::Result<()> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read code table {}", path.display()))?;
        let table: Vec<IrCodeEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid code table {}", path.display()))?;
        anyhow::ensure!(!table.is_empty(), "Code table {} is empty", path.display());
        self.settings.code_table = table;
        Ok(())
    }
}
