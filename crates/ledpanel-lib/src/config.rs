//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{Rgb, parse_color};
use crate::error::{PanelError, Result};
use crate::grid::{Addressing, DEFAULT_HEIGHT, DEFAULT_WIDTH, GridSize};
use crate::protocol::{WireFormat, endpoint_url};
use crate::render::DEFAULT_CELL_SIZE;
use crate::state::ColorMode;
use crate::transport::TransportOptions;

/// Leading comment of files written by [`Config::write_new`].
const CONFIG_HEADER: &str = "# LedPanel configuration. Remove a line to use its default.\n\n";

/// Largest accepted grid dimension.
pub const MAX_GRID_DIMENSION: u32 = 256;
/// Smallest accepted reconnect delay.
pub const MIN_RECONNECT_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Device host, optionally with a port. Default: "ledpanel.local".
    #[serde(default = "default_host")]
    pub host: String,

    /// Grid width in cells. Default: 30.
    #[serde(default = "default_grid_width")]
    pub grid_width: u32,

    /// Grid height in cells. Default: 15.
    #[serde(default = "default_grid_height")]
    pub grid_height: u32,

    /// Canvas pixels per cell. Default: 40.
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,

    /// How cells map to wire indices: "serpentine" (default) or "row-major".
    #[serde(default)]
    pub addressing: Addressing,

    /// Payload field name: "data" (default) or "value".
    #[serde(default)]
    pub wire_format: WireFormat,

    /// Brush color source: "rgb" (default, color picker) or "hsl" (sliders).
    #[serde(default)]
    pub color_mode: ColorMode,

    /// Delay before reconnecting after a close, in milliseconds. Default: 2000.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// TCP connect and handshake timeout, in milliseconds. Default: 3000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Initial brush color (hex or name). Default: "#FF0000".
    #[serde(default = "default_paint_color")]
    pub paint_color: String,
}

fn default_host() -> String {
    "ledpanel.local".into()
}
fn default_grid_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_grid_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_cell_size() -> u32 {
    DEFAULT_CELL_SIZE
}
fn default_reconnect_delay_ms() -> u64 {
    2000
}
fn default_connect_timeout_ms() -> u64 {
    3000
}
fn default_paint_color() -> String {
    "#FF0000".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: default_host(),
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            cell_size: default_cell_size(),
            addressing: Addressing::default(),
            wire_format: WireFormat::default(),
            color_mode: ColorMode::default(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            paint_color: default_paint_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyHost,
    InvalidGridSize { width: u32, height: u32 },
    InvalidCellSize(u32),
    ReconnectDelayTooShort(u64),
    ZeroConnectTimeout,
    InvalidColor(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyHost => write!(f, "Host cannot be empty"),
            ValidationError::InvalidGridSize { width, height } => write!(
                f,
                "Invalid grid size {width}x{height} (each side must be 1..={MAX_GRID_DIMENSION})"
            ),
            ValidationError::InvalidCellSize(n) => {
                write!(f, "Invalid cell size {n} (must be 4..=200)")
            }
            ValidationError::ReconnectDelayTooShort(ms) => write!(
                f,
                "Reconnect delay {ms} ms is too short (minimum {MIN_RECONNECT_DELAY_MS} ms)"
            ),
            ValidationError::ZeroConnectTimeout => write!(f, "Connect timeout cannot be zero"),
            ValidationError::InvalidColor(e) => write!(f, "Invalid paint color: {e}"),
        }
    }
}

impl Config {
    pub fn dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join("LedPanel"))
        }
        #[cfg(not(windows))]
        {
            dirs::config_dir().map(|p| p.join("ledpanel"))
        }
    }

    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("ledpanel.log"))
    }

    /// Load from the default path, logging any warnings.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Write every setting to a new file at `path`, creating parent
    /// directories. An existing file is left alone and reported as a
    /// `Config` error.
    pub fn write_new(&self, path: &Path) -> Result<()> {
        let body =
            toml::to_string_pretty(self).map_err(|e| PanelError::Config(e.to_string()))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    PanelError::Config(format!("{} already exists", path.display()))
                }
                _ => PanelError::Io(e),
            })?;
        file.write_all(CONFIG_HEADER.as_bytes())?;
        file.write_all(body.as_bytes())?;
        log::debug!("wrote config to {}", path.display());
        Ok(())
    }

    /// Load from `path`. A missing file gives defaults silently; an
    /// unparsable one gives defaults plus a warning.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    pub fn grid_size(&self) -> GridSize {
        GridSize::new(self.grid_width, self.grid_height)
    }

    /// `ws://<host>/ws`.
    pub fn endpoint(&self) -> String {
        endpoint_url(&self.host)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            host: self.host.trim().to_string(),
            format: self.wire_format,
            reconnect_delay: self.reconnect_delay(),
            connect_timeout: self.connect_timeout(),
        }
    }

    /// The configured brush color, or red if it does not parse.
    pub fn paint_color(&self) -> Rgb {
        parse_color(&self.paint_color).unwrap_or_else(|e| {
            log::warn!("{e}, using #ff0000");
            Rgb::new(0xFF, 0, 0)
        })
    }

    /// Check every field, collecting all problems.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost);
        }

        let dim_ok = |n: u32| (1..=MAX_GRID_DIMENSION).contains(&n);
        if !dim_ok(self.grid_width) || !dim_ok(self.grid_height) {
            errors.push(ValidationError::InvalidGridSize {
                width: self.grid_width,
                height: self.grid_height,
            });
        }

        if !(4..=200).contains(&self.cell_size) {
            errors.push(ValidationError::InvalidCellSize(self.cell_size));
        }

        if self.reconnect_delay_ms < MIN_RECONNECT_DELAY_MS {
            errors.push(ValidationError::ReconnectDelayTooShort(
                self.reconnect_delay_ms,
            ));
        }

        if self.connect_timeout_ms == 0 {
            errors.push(ValidationError::ZeroConnectTimeout);
        }

        if let Err(e) = parse_color(&self.paint_color) {
            errors.push(ValidationError::InvalidColor(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
