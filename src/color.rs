//! Hex color parsing for paper backgrounds.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use crate::consts::DEFAULT_PAPER_COLOR;

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = channel(&hex[0..1].repeat(2))?;
            let g = channel(&hex[1..2].repeat(2))?;
            let b = channel(&hex[2..3].repeat(2))?;
            Some((r, g, b))
        }
        6 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            Some((r, g, b))
        }
        _ => None,
    }
}

fn channel(digits: &str) -> Option<u8> {
    u8::from_str_radix(digits, 16).ok()
}

/// Paper background for a region color string, falling back to white.
#[must_use]
pub fn paper_rgb(raw: &str) -> (u8, u8, u8) {
    parse_hex_rgb(raw)
        .or_else(|| parse_hex_rgb(DEFAULT_PAPER_COLOR))
        .unwrap_or((255, 255, 255))
}

/// Normalize a color to canonical lowercase `#rrggbb`, using the paper default when unparsable.
#[must_use]
pub fn normalize_hex_color(value: &str) -> String {
    let (r, g, b) = paper_rgb(value);
    format!("#{r:02x}{g:02x}{b:02x}")
}
