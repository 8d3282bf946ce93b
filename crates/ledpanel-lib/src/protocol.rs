//! Wire protocol for the device WebSocket.
//!
//! Outbound messages are one JSON object per frame: an `action` name plus a
//! payload under `data` (or `value`, see [`WireFormat`]). Inbound messages
//! are state snapshots carrying any subset of the device fields.
//!
//! ```text
//! {"action":"on","data":true}
//! {"action":"grid","data":{"cells":[420,421],"color":16711680}}
//! {"action":"clear","data":""}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::color::Rgb;
use crate::error::{PanelError, Result};

/// Path of the WebSocket endpoint on the device.
pub const WS_PATH: &str = "/ws";

/// `ws://<host>/ws`. `host` may carry a port.
pub fn endpoint_url(host: &str) -> String {
    format!("ws://{}{WS_PATH}", host.trim().trim_end_matches('/'))
}

// ── Outbound ──

/// Name of the payload field in outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// `{"action": ..., "data": ...}`
    #[default]
    Data,
    /// `{"action": ..., "value": ...}`
    Value,
}

impl WireFormat {
    pub fn payload_key(self) -> &'static str {
        match self {
            WireFormat::Data => "data",
            WireFormat::Value => "value",
        }
    }
}

impl std::fmt::Display for WireFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.payload_key())
    }
}

/// A command sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    On(bool),
    Color(Rgb),
    Brightness(u8),
    Hue(u16),
    Saturation(u8),
    Pattern(u8),
    /// Paint `cells` (wire indices) with `color`.
    Grid { color: Rgb, cells: Vec<usize> },
    Clear,
    /// Ask the device to broadcast its state without changing anything.
    Sync,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridPayload {
    cells: Vec<usize>,
    color: u32,
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::On(_) => "on",
            Command::Color(_) => "color",
            Command::Brightness(_) => "brightness",
            Command::Hue(_) => "hue",
            Command::Saturation(_) => "saturation",
            Command::Pattern(_) => "pattern",
            Command::Grid { .. } => "grid",
            Command::Clear => "clear",
            Command::Sync => "sync",
        }
    }

    /// The payload as a JSON value. Colors go out as `0xRRGGBB` integers.
    pub fn payload(&self) -> Value {
        match self {
            Command::On(on) => json!(on),
            Command::Color(c) => json!(c.to_u32()),
            Command::Brightness(v) | Command::Saturation(v) | Command::Pattern(v) => json!(v),
            Command::Hue(v) => json!(v),
            Command::Grid { color, cells } => json!(GridPayload {
                cells: cells.clone(),
                color: color.to_u32(),
            }),
            Command::Clear | Command::Sync => json!(""),
        }
    }

    /// Serialize to a single JSON text frame.
    pub fn encode(&self, format: WireFormat) -> String {
        let mut obj = Map::new();
        obj.insert("action".into(), Value::from(self.action()));
        obj.insert(format.payload_key().into(), self.payload());
        Value::Object(obj).to_string()
    }

    /// Parse an outbound frame back into a command.
    ///
    /// Accepts both wire formats. Used by the loopback tooling and tests.
    pub fn decode(text: &str) -> Result<Command> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value
            .as_object()
            .ok_or_else(|| PanelError::Protocol("expected a JSON object".into()))?;
        let action = obj
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| PanelError::Protocol("missing action".into()))?;
        let payload = obj
            .get("data")
            .or_else(|| obj.get("value"))
            .cloned()
            .unwrap_or(Value::Null);

        let command = match action {
            "on" => Command::On(serde_json::from_value(payload)?),
            "color" => Command::Color(Rgb::from_u32(serde_json::from_value(payload)?)),
            "brightness" => Command::Brightness(serde_json::from_value(payload)?),
            "hue" => Command::Hue(serde_json::from_value(payload)?),
            "saturation" => Command::Saturation(serde_json::from_value(payload)?),
            "pattern" => Command::Pattern(serde_json::from_value(payload)?),
            "grid" => {
                let grid: GridPayload = serde_json::from_value(payload)?;
                Command::Grid {
                    color: Rgb::from_u32(grid.color),
                    cells: grid.cells,
                }
            }
            "clear" => Command::Clear,
            "sync" => Command::Sync,
            other => return Err(PanelError::Protocol(format!("unknown action: {other}"))),
        };
        Ok(command)
    }
}

// ── Inbound ──

/// A state snapshot broadcast by the device. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// `0xRRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DeviceSnapshot {
    /// Parse an inbound text frame.
    ///
    /// Unknown fields are ignored. Anything that is not a JSON object, or a
    /// known field with the wrong type, is a `Protocol` error.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(PanelError::Protocol(format!(
                "expected a JSON object, got: {}",
                truncate(text, 64)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// `true` when the snapshot carries no known field.
    pub fn is_empty(&self) -> bool {
        *self == DeviceSnapshot::default()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
