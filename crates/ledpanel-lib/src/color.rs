//! Color model — hex strings, decimal integers, and HSL triples.
//!
//! The device speaks 24-bit RGB integers (`0xRRGGBB`). The panel shows colors
//! as `#rrggbb` strings and can also paint with hue/saturation/lightness.

use std::fmt;

use crate::error::{PanelError, Result};

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Build from the device integer format `0xRRGGBB`. Bits above 24 are ignored.
    pub const fn from_u32(value: u32) -> Self {
        Rgb {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// The device integer format `0xRRGGBB`.
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        decimal_to_hex(self.to_u32())
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub const fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Hsl {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_rgb(self) -> Rgb {
        Rgb::from(hsl_channels(
            f64::from(self.hue),
            f64::from(self.saturation),
            f64::from(self.lightness),
        ))
    }
}

/// A cell or brush color in whichever representation the panel paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorValue {
    Rgb(Rgb),
    Hsl(Hsl),
}

impl ColorValue {
    /// Resolve to the RGB color that is drawn and sent to the device.
    pub fn resolve(self) -> Rgb {
        match self {
            ColorValue::Rgb(c) => c,
            ColorValue::Hsl(hsl) => hsl.to_rgb(),
        }
    }
}

impl From<Rgb> for ColorValue {
    fn from(c: Rgb) -> Self {
        ColorValue::Rgb(c)
    }
}

impl From<Hsl> for ColorValue {
    fn from(c: Hsl) -> Self {
        ColorValue::Hsl(c)
    }
}

/// Parse a `#rrggbb` string as a base-16 integer.
///
/// The leading `#` is optional. Anything other than exactly six hex digits
/// is a `Color` error.
pub fn hex_to_decimal(hex: &str) -> Result<u32> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PanelError::Color(format!("Invalid hex color: {hex}")));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| PanelError::Color(format!("Invalid hex color: {hex}")))
}

/// Format an integer as `#` followed by exactly six lowercase hex digits.
///
/// Only the low 24 bits are kept.
pub fn decimal_to_hex(value: u32) -> String {
    format!("#{:06x}", value & 0x00FF_FFFF)
}

/// Convert hue (degrees), saturation and lightness (percent) to `#rrggbb`.
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let [r, g, b] = hsl_channels(hue, saturation, lightness);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn percent(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        (v / 100.0).clamp(0.0, 1.0)
    }
}

fn hsl_channels(hue: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let h = if hue.is_finite() {
        hue.rem_euclid(360.0)
    } else {
        0.0
    };
    let s = percent(saturation);
    let l = percent(lightness);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [byte(r), byte(g), byte(b)]
}

/// Parse user input (CLI, config) into a color.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`, `"black"`
pub fn parse_color(s: &str) -> Result<Rgb> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Rgb::new(0xFF, 0x00, 0x00)),
        "green" => return Ok(Rgb::new(0x00, 0xFF, 0x00)),
        "blue" => return Ok(Rgb::new(0x00, 0x00, 0xFF)),
        "white" => return Ok(Rgb::WHITE),
        "orange" => return Ok(Rgb::new(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Rgb::new(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Rgb::new(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Rgb::new(0x00, 0xFF, 0xFF)),
        "off" | "black" => return Ok(Rgb::BLACK),
        _ => {}
    }

    hex_to_decimal(s)
        .map(Rgb::from_u32)
        .map_err(|_| PanelError::Color(format!("Invalid color: {s} (use #RRGGBB or a color name)")))
}
