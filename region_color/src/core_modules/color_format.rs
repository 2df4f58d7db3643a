// Text renderings of a computed color, for pasting into CSS, hex fields or
// Blender color sockets. Channels are 0-255 floats on input; every format can
// optionally convert from sRGB to linear light first.

use crate::core_modules::results::Color;
use std::fmt;
use std::str::FromStr;

const SRGB_LINEAR_THRESHOLD: f64 = 0.0404482362771082;

/// Converts a normalized (0-1) sRGB channel to linear light.
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= SRGB_LINEAR_THRESHOLD {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// How a whole color is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RgbFormat {
    /// `#rrggbb`
    #[default]
    Hex,
    /// `rgb(r g b)`
    Css,
    /// `[r, g, b, 1]` with normalized channels.
    Blender,
}

/// How a single channel is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChannelFormat {
    /// Rounded 0-255 integer.
    #[default]
    Int,
    /// Normalized 0-1 float.
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for RgbFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(RgbFormat::Hex),
            "css" => Ok(RgbFormat::Css),
            "blender" => Ok(RgbFormat::Blender),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl FromStr for ChannelFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(ChannelFormat::Int),
            "float" => Ok(ChannelFormat::Float),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RgbFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RgbFormat::Hex => "hex",
            RgbFormat::Css => "css",
            RgbFormat::Blender => "blender",
        })
    }
}

/// Normalizes a 0-255 channel, optionally converting it to linear light.
fn normalized(c: f64, linear: bool) -> f64 {
    let c = c / 255.0;
    if linear { srgb_to_linear(c) } else { c }
}

fn to_byte(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Renders the whole color.
pub fn format_rgb(color: &Color, format: RgbFormat, linear: bool) -> String {
    let channels = color.channels().map(|c| normalized(c, linear));
    match format {
        RgbFormat::Hex => {
            let [r, g, b] = channels.map(to_byte);
            format!("#{r:02x}{g:02x}{b:02x}")
        }
        RgbFormat::Css => {
            let [r, g, b] = channels.map(to_byte);
            format!("rgb({r} {g} {b})")
        }
        RgbFormat::Blender => {
            let [r, g, b] = channels;
            format!("[{r}, {g}, {b}, 1]")
        }
    }
}

/// Renders one 0-255 channel value.
pub fn format_channel(c: f64, format: ChannelFormat, linear: bool) -> String {
    let c = normalized(c, linear);
    match format {
        ChannelFormat::Int => to_byte(c).to_string(),
        ChannelFormat::Float => c.to_string(),
    }
}
