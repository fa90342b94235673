//! Color converter between HEX, RGB and HSL notations

use serde::Serialize;

use super::{ToolError, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorInfo {
    pub hex: String,
    pub rgb: Rgb,
    pub hsl: Hsl,
    /// `rgb(r, g, b)`
    pub rgb_css: String,
    /// `hsl(h, s%, l%)`
    pub hsl_css: String,
}

impl From<Rgb> for ColorInfo {
    fn from(rgb: Rgb) -> Self {
        let hsl = rgb_to_hsl(rgb);
        Self {
            hex: format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b),
            rgb_css: format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b),
            hsl_css: format!("hsl({}, {}%, {}%)", hsl.h, hsl.s, hsl.l),
            rgb,
            hsl,
        }
    }
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `hsl(h, s%, l%)`
pub fn parse(text: &str) -> ToolResult<ColorInfo> {
    let text = text.trim().to_ascii_lowercase();

    let rgb = if let Some(hex) = text.strip_prefix('#') {
        parse_hex(hex)?
    } else if let Some(args) = function_args(&text, "rgb") {
        let parts = split_args(args, 3)?;
        Rgb {
            r: parse_channel(parts[0])?,
            g: parse_channel(parts[1])?,
            b: parse_channel(parts[2])?,
        }
    } else if let Some(args) = function_args(&text, "hsl") {
        let parts = split_args(args, 3)?;
        let h = parse_number(parts[0].trim_end_matches("deg"))?;
        let s = parse_percent(parts[1])?;
        let l = parse_percent(parts[2])?;
        hsl_to_rgb(Hsl { h, s, l })
    } else if text.len() == 3 || text.len() == 6 {
        parse_hex(&text)?
    } else {
        return Err(ToolError::invalid_input(format!("unrecognised color '{}'", text)));
    };

    Ok(rgb.into())
}

fn function_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str, expected: usize) -> ToolResult<Vec<&str>> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != expected {
        return Err(ToolError::invalid_input(format!(
            "expected {} components, got {}",
            expected,
            parts.len()
        )));
    }
    Ok(parts)
}

fn parse_number(text: &str) -> ToolResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ToolError::invalid_input(format!("'{}' is not a number", text.trim())))
}

fn parse_channel(text: &str) -> ToolResult<u8> {
    let value = parse_number(text)?;
    if !(0.0..=255.0).contains(&value) {
        return Err(ToolError::out_of_range(format!("channel {} is not in 0..=255", value)));
    }
    Ok(value.round() as u8)
}

fn parse_percent(text: &str) -> ToolResult<f64> {
    let value = parse_number(text.trim().trim_end_matches('%'))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ToolError::out_of_range(format!("{}% is not in 0..=100", value)));
    }
    Ok(value)
}

fn parse_hex(hex: &str) -> ToolResult<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ToolError::invalid_input(format!("'#{}' is not a hex color", hex)));
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(ToolError::invalid_input("hex colors have 3 or 6 digits")),
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map_err(|e| ToolError::invalid_input(e.to_string()))
    };
    Ok(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;

    if delta == 0.0 {
        return Hsl { h: 0.0, s: 0.0, l: round1(l * 100.0) };
    }

    let s = delta / (1.0 - (2.0 * l - 1.0).abs());
    let h = if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    Hsl {
        h: round1(h) % 360.0,
        s: round1(s * 100.0),
        l: round1(l * 100.0),
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let s = hsl.s / 100.0;
    let l = hsl.l / 100.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: to_u8(r),
        g: to_u8(g),
        b: to_u8(b),
    }
}
