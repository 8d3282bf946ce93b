//! CLI subcommands — device status, controls, painting, monitoring.

mod clear;
mod config_cmd;
mod index;
mod monitor;
mod paint;
mod set;
mod status;

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use ledpanel_lib::config::Config;
pub(super) use ledpanel_lib::error::{PanelError, Result};
pub(super) use ledpanel_lib::panel::Panel;
pub(super) use ledpanel_lib::state::DeviceState;
pub(super) use ledpanel_lib::transport::{Link, Transport, TransportEvent};

const PADDING: usize = 2;

/// Flags shared by every subcommand.
pub struct GlobalOpts {
    pub json: bool,
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
}

/// Load the config from `--config` or the default location, then apply
/// `--host`.
pub(super) fn load_config(opts: &GlobalOpts) -> Config {
    let mut config = match &opts.config_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    };
    if let Some(host) = &opts.host {
        config.host = host.trim().to_string();
    }
    config
}

/// Open the device connection and wait until it is usable.
pub(super) fn connect(config: &Config, timeout: Duration) -> Result<Transport> {
    let transport = Transport::connect(config.transport_options());
    transport.wait_open(timeout)?;
    log::debug!("connected to {}", transport.url());
    Ok(transport)
}

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| PanelError::Protocol(format!("JSON serialization failed: {e}")))?;
    println!("{json_str}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub endpoint: String,
    pub connected: bool,
    pub device: Option<DeviceStateJson>,
}

#[derive(Serialize)]
pub(super) struct DeviceStateJson {
    pub on: bool,
    pub color: String,
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
    pub pattern: u8,
    pub pattern_name: Option<String>,
    pub status: Option<String>,
}

impl From<&DeviceState> for DeviceStateJson {
    fn from(state: &DeviceState) -> Self {
        DeviceStateJson {
            on: state.on,
            color: state.color.to_hex(),
            hue: state.hue,
            saturation: state.saturation,
            brightness: state.brightness,
            pattern: state.pattern,
            pattern_name: state.pattern_name().map(str::to_string),
            status: state.status.clone(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub endpoint: String,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct ConfigInitOutput {
    pub config_file: String,
}

#[derive(Serialize)]
pub(super) struct IndexOutput {
    pub x: u32,
    pub y: u32,
    pub row_major: usize,
    pub serpentine: usize,
}

#[derive(Serialize)]
pub(super) struct PaintOutput {
    pub color: String,
    pub cells: Vec<usize>,
    pub sent: bool,
    pub preview: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect, request a state snapshot, and print it
    Status {
        /// How long to wait for the connection and the snapshot
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
    },

    /// Change one control: on, off, color, brightness, hue, saturation, pattern
    Set {
        /// Control name
        control: String,
        /// New value (not used by `on`/`off`)
        value: Option<String>,
    },

    /// Paint cells as one stroke
    Paint {
        /// Brush color (hex or name). Default: `paint_color` from the config
        #[arg(long)]
        color: Option<String>,
        /// Cell as X,Y (repeatable, painted in order)
        #[arg(long = "cell", value_name = "X,Y", required = true)]
        cells: Vec<String>,
        /// Write the rendered canvas to this PNG file
        #[arg(long, value_name = "PNG")]
        preview: Option<PathBuf>,
        /// Do not contact the device; print what would be sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear every cell on the device
    Clear,

    /// Print device snapshots until Ctrl+C, reconnecting as needed
    Monitor,

    /// Show the wire index of a cell under both addressing policies
    Index {
        /// Column (0 = left)
        x: u32,
        /// Row (0 = top)
        y: u32,
    },

    /// Show current configuration and file paths
    Config {
        /// Write the effective settings to a new config file
        #[arg(long)]
        init: bool,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &GlobalOpts) -> Result<()> {
    let config = load_config(opts);
    match cmd {
        Command::Status { timeout_ms } => {
            status::cmd_status(&config, Duration::from_millis(timeout_ms), opts.json)
        }
        Command::Set { control, value } => {
            if opts.json {
                warn_json_unsupported("set");
            }
            set::cmd_set(&config, &control, value.as_deref())
        }
        Command::Paint {
            color,
            cells,
            preview,
            dry_run,
        } => paint::cmd_paint(
            &config,
            paint::PaintArgs {
                color,
                cells,
                preview,
                dry_run,
            },
            opts.json,
        ),
        Command::Clear => {
            if opts.json {
                warn_json_unsupported("clear");
            }
            clear::cmd_clear(&config)
        }
        Command::Monitor => monitor::cmd_monitor(&config, opts.json),
        Command::Index { x, y } => index::cmd_index(&config, x, y, opts.json),
        Command::Config { init: true } => {
            config_cmd::cmd_config_init(&config, opts.config_path.as_deref(), opts.json)
        }
        Command::Config { init: false } => {
            config_cmd::cmd_config(&config, opts.config_path.as_deref(), opts.json)
        }
    }
}


#[cfg(test)]
mod json_struct_tests {
    use super::*;
    use ledpanel_lib::color::Rgb;

    #[test]
    fn device_state_json_from_state() {
        let state = DeviceState {
            on: true,
            color: Rgb::new(0x12, 0x34, 0x56),
            pattern: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(DeviceStateJson::from(&state)).unwrap();
        assert_eq!(json["on"], true);
        assert_eq!(json["color"], "#123456");
        assert_eq!(json["pattern_name"], "confetti");
        assert!(json["status"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn status_output_with_null_device() {
        let output = StatusOutput {
            version: "0.1.0".into(),
            endpoint: "ws://10.0.0.2/ws".into(),
            connected: false,
            device: None,
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["endpoint"], "ws://10.0.0.2/ws");
        assert_eq!(parsed["connected"], false);
        assert!(parsed["device"].is_null());
    }

    #[test]
    fn config_output_embeds_settings() {
        let output = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            endpoint: Config::default().endpoint(),
            settings: Config::default(),
            problems: vec![],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert!(parsed["config_file"].is_null());
        assert_eq!(parsed["settings"]["grid_width"], 30);
        assert_eq!(parsed["settings"]["addressing"], "serpentine");
        assert_eq!(parsed["settings"]["wire_format"], "data");
        assert!(parsed["problems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn paint_output_fields() {
        let output = PaintOutput {
            color: "#ff0000".into(),
            cells: vec![420, 421],
            sent: false,
            preview: None,
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["cells"], serde_json::json!([420, 421]));
        assert_eq!(parsed["sent"], false);
    }
}
