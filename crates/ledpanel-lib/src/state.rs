//! Device state mirror and the controls that change it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::{ColorValue, Hsl, Rgb, parse_color};
use crate::error::{PanelError, Result};
use crate::protocol::{Command, DeviceSnapshot};

/// Which color representation the panel paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// The color picker value.
    #[default]
    Rgb,
    /// Hue and saturation sliders, brightness as lightness.
    Hsl,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Rgb => write!(f, "rgb"),
            ColorMode::Hsl => write!(f, "hsl"),
        }
    }
}

/// Animation patterns known to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    ColorFill,
    ColorFade,
    Confetti,
    Grid,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [
        Pattern::ColorFill,
        Pattern::ColorFade,
        Pattern::Confetti,
        Pattern::Grid,
    ];

    pub fn index(self) -> u8 {
        match self {
            Pattern::ColorFill => 0,
            Pattern::ColorFade => 1,
            Pattern::Confetti => 2,
            Pattern::Grid => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Pattern> {
        Pattern::ALL.get(usize::from(index)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::ColorFill => "color-fill",
            Pattern::ColorFade => "color-fade",
            Pattern::Confetti => "confetti",
            Pattern::Grid => "grid",
        }
    }

    /// Parse a pattern name or index.
    pub fn parse(s: &str) -> Result<Pattern> {
        let s = s.trim();
        if let Ok(i) = s.parse::<u8>() {
            return Pattern::from_index(i)
                .ok_or_else(|| PanelError::Config(format!("Unknown pattern index: {i}")));
        }
        let wanted = s.to_lowercase().replace('_', "-");
        Pattern::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                PanelError::Config(format!(
                    "Unknown pattern: {s} (expected one of: color-fill, color-fade, confetti, grid)"
                ))
            })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The panel's mirror of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub on: bool,
    pub color: Rgb,
    /// Degrees, 0–360.
    pub hue: u16,
    /// Percent, 0–100.
    pub saturation: u8,
    pub brightness: u8,
    pub pattern: u8,
    pub status: Option<String>,
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState {
            on: false,
            color: Rgb::new(0xFF, 0, 0),
            hue: 0,
            saturation: 100,
            brightness: 32,
            pattern: 0,
            status: None,
        }
    }
}

impl DeviceState {
    /// Copy every field the snapshot carries. Returns how many were applied.
    pub fn apply(&mut self, snapshot: &DeviceSnapshot) -> usize {
        let mut applied = 0;
        if let Some(on) = snapshot.on {
            self.on = on;
            applied += 1;
        }
        if let Some(color) = snapshot.color {
            self.color = Rgb::from_u32(color);
            applied += 1;
        }
        if let Some(hue) = snapshot.hue {
            self.hue = hue;
            applied += 1;
        }
        if let Some(saturation) = snapshot.saturation {
            self.saturation = saturation;
            applied += 1;
        }
        if let Some(brightness) = snapshot.brightness {
            self.brightness = brightness;
            applied += 1;
        }
        if let Some(pattern) = snapshot.pattern {
            self.pattern = pattern;
            applied += 1;
        }
        if let Some(status) = &snapshot.status {
            self.status = Some(status.clone());
            applied += 1;
        }
        applied
    }

    /// The brush color for a new stroke.
    ///
    /// In HSL mode the lightness is the brightness, capped at 100.
    pub fn active_color(&self, mode: ColorMode) -> ColorValue {
        match mode {
            ColorMode::Rgb => ColorValue::Rgb(self.color),
            ColorMode::Hsl => ColorValue::Hsl(Hsl::new(
                self.hue.min(360),
                self.saturation.min(100),
                self.brightness.min(100),
            )),
        }
    }

    pub fn pattern_name(&self) -> Option<&'static str> {
        Pattern::from_index(self.pattern).map(Pattern::name)
    }
}

/// A single control change made by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    On(bool),
    Color(Rgb),
    Brightness(u8),
    Hue(u16),
    Saturation(u8),
    Pattern(u8),
}

impl Control {
    /// Parse a control name and value as typed on the command line.
    ///
    /// `on` and `off` take no value.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Control> {
        let need = |what: &str| {
            value.ok_or_else(|| PanelError::Config(format!("`{name}` needs a {what} value")))
        };
        let control = match name {
            "on" => Control::On(true),
            "off" => Control::On(false),
            "color" => Control::Color(parse_color(need("color")?)?),
            "brightness" => Control::Brightness(parse_number(name, need("number")?, 255)?),
            "hue" => Control::Hue(parse_number(name, need("number")?, 360)?),
            "saturation" => Control::Saturation(parse_number(name, need("number")?, 100)?),
            "pattern" => Control::Pattern(Pattern::parse(need("pattern")?)?.index()),
            other => {
                return Err(PanelError::Config(format!(
                    "Unknown control: {other} (expected on, off, color, brightness, hue, saturation, pattern)"
                )));
            }
        };
        Ok(control)
    }

    /// Update the local mirror.
    pub fn apply_to(self, state: &mut DeviceState) {
        match self {
            Control::On(on) => state.on = on,
            Control::Color(c) => state.color = c,
            Control::Brightness(v) => state.brightness = v,
            Control::Hue(v) => state.hue = v,
            Control::Saturation(v) => state.saturation = v,
            Control::Pattern(v) => state.pattern = v,
        }
    }

    pub fn command(self) -> Command {
        match self {
            Control::On(on) => Command::On(on),
            Control::Color(c) => Command::Color(c),
            Control::Brightness(v) => Command::Brightness(v),
            Control::Hue(v) => Command::Hue(v),
            Control::Saturation(v) => Command::Saturation(v),
            Control::Pattern(v) => Command::Pattern(v),
        }
    }
}

fn parse_number<T>(name: &str, value: &str, max: u16) -> Result<T>
where
    T: TryFrom<u16>,
{
    let n: u16 = value
        .trim()
        .parse()
        .map_err(|_| PanelError::Config(format!("`{name}` must be a number, got: {value}")))?;
    if n > max {
        return Err(PanelError::Config(format!(
            "`{name}` must be between 0 and {max}, got: {n}"
        )));
    }
    T::try_from(n)
        .map_err(|_| PanelError::Config(format!("`{name}` out of range: {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DeviceState::apply ──

    #[test]
    fn apply_full_snapshot() {
        let mut state = DeviceState::default();
        let snap = DeviceSnapshot {
            on: Some(true),
            color: Some(0x00FF00),
            hue: Some(120),
            saturation: Some(50),
            brightness: Some(200),
            pattern: Some(2),
            status: Some("ready".into()),
        };
        assert_eq!(state.apply(&snap), 7);
        assert!(state.on);
        assert_eq!(state.color, Rgb::new(0, 0xFF, 0));
        assert_eq!(state.hue, 120);
        assert_eq!(state.saturation, 50);
        assert_eq!(state.brightness, 200);
        assert_eq!(state.pattern, 2);
        assert_eq!(state.status.as_deref(), Some("ready"));
    }

    #[test]
    fn missing_fields_leave_state_unchanged() {
        let mut state = DeviceState {
            brightness: 99,
            ..Default::default()
        };
        let before = state.clone();
        let snap = DeviceSnapshot {
            on: Some(true),
            ..Default::default()
        };
        assert_eq!(state.apply(&snap), 1);
        assert!(state.on);
        assert_eq!(state.brightness, before.brightness);
        assert_eq!(state.color, before.color);
    }

    #[test]
    fn empty_snapshot_changes_nothing() {
        let mut state = DeviceState::default();
        assert_eq!(state.apply(&DeviceSnapshot::default()), 0);
        assert_eq!(state, DeviceState::default());
    }

    // ── active_color ──

    #[test]
    fn active_color_rgb_mode_uses_picker() {
        let state = DeviceState {
            color: Rgb::new(1, 2, 3),
            ..Default::default()
        };
        assert_eq!(
            state.active_color(ColorMode::Rgb),
            ColorValue::Rgb(Rgb::new(1, 2, 3))
        );
    }

    #[test]
    fn active_color_hsl_mode_caps_lightness() {
        let state = DeviceState {
            hue: 200,
            saturation: 80,
            brightness: 255,
            ..Default::default()
        };
        assert_eq!(
            state.active_color(ColorMode::Hsl),
            ColorValue::Hsl(Hsl::new(200, 80, 100))
        );
    }

    // ── Pattern ──

    #[test]
    fn pattern_indices() {
        for (i, p) in Pattern::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(p.index()), i);
            assert_eq!(Pattern::from_index(p.index()), Some(p));
        }
        assert_eq!(Pattern::from_index(4), None);
    }

    #[test]
    fn pattern_parse_name_or_index() {
        assert_eq!(Pattern::parse("confetti").unwrap(), Pattern::Confetti);
        assert_eq!(Pattern::parse("Color_Fade").unwrap(), Pattern::ColorFade);
        assert_eq!(Pattern::parse("3").unwrap(), Pattern::Grid);
        assert!(Pattern::parse("9").is_err());
        assert!(Pattern::parse("sparkle").is_err());
    }

    #[test]
    fn pattern_name_of_unknown_index() {
        let state = DeviceState {
            pattern: 7,
            ..Default::default()
        };
        assert_eq!(state.pattern_name(), None);
    }

    // ── Control ──

    #[test]
    fn control_parse() {
        assert_eq!(Control::parse("on", None).unwrap(), Control::On(true));
        assert_eq!(Control::parse("off", None).unwrap(), Control::On(false));
        assert_eq!(
            Control::parse("color", Some("#00ff00")).unwrap(),
            Control::Color(Rgb::new(0, 0xFF, 0))
        );
        assert_eq!(
            Control::parse("brightness", Some("128")).unwrap(),
            Control::Brightness(128)
        );
        assert_eq!(Control::parse("hue", Some("360")).unwrap(), Control::Hue(360));
        assert_eq!(
            Control::parse("pattern", Some("grid")).unwrap(),
            Control::Pattern(3)
        );
    }

    #[test]
    fn control_parse_rejects_out_of_range() {
        assert!(Control::parse("brightness", Some("256")).is_err());
        assert!(Control::parse("saturation", Some("101")).is_err());
        assert!(Control::parse("hue", Some("-1")).is_err());
    }

    #[test]
    fn control_parse_requires_value() {
        let err = Control::parse("color", None).unwrap_err();
        assert!(err.to_string().contains("needs a color value"));
    }

    #[test]
    fn control_parse_unknown() {
        assert!(Control::parse("speed", Some("1")).is_err());
    }

    #[test]
    fn control_updates_state_and_maps_to_command() {
        let mut state = DeviceState::default();
        let control = Control::Saturation(42);
        control.apply_to(&mut state);
        assert_eq!(state.saturation, 42);
        assert_eq!(control.command(), Command::Saturation(42));
    }
}
