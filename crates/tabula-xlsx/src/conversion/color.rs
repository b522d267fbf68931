//! SpreadsheetML colors (`rgb`, `indexed`, `theme` + `tint`) to `#RRGGBB` and back.

use tabula_model::normalize_color;

use crate::extraction::records::{XlsxColor, XlsxTheme};

/// Legacy indexed palette (ECMA-376 §18.8.27).
pub const INDEXED_COLORS: [&str; 64] = [
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "800000", "008000", "000080", "808000", "800080", "008080", "C0C0C0", "808080", //
    "9999FF", "993366", "FFFFCC", "CCFFFF", "660066", "FF8080", "0066CC", "CCCCFF", //
    "000080", "FF00FF", "FFFF00", "00FFFF", "800080", "800000", "008080", "0000FF", //
    "00CCFF", "CCFFFF", "CCFFCC", "FFFF99", "99CCFF", "FF99CC", "CC99FF", "FFCC99", //
    "3366FF", "33CCCC", "99CC00", "FFCC00", "FF9900", "FF6600", "666699", "969696", //
    "003366", "339966", "003300", "333300", "993300", "993366", "333399", "333333", //
];

/// Scheme slot referenced by a `theme` attribute. Slots 2 and 3 are swapped.
pub fn theme_slot(index: u32) -> usize {
    match index {
        2 => 3,
        3 => 2,
        other => other as usize,
    }
}

/// Resolve a color to `#RRGGBB`. `auto` colors resolve to `None` (the renderer's default).
pub fn convert_color(color: &XlsxColor, theme: &XlsxTheme) -> Option<String> {
    let base = if let Some(rgb) = &color.rgb {
        normalize_color(rgb)
    } else if let Some(index) = color.indexed {
        match index {
            64 => Some("#000000".to_string()),
            65 => Some("#FFFFFF".to_string()),
            i => INDEXED_COLORS
                .get(i as usize)
                .and_then(|c| normalize_color(c)),
        }
    } else if let Some(index) = color.theme {
        theme
            .colors
            .get(theme_slot(index))
            .and_then(|c| normalize_color(c))
    } else {
        None
    }?;
    match color.tint {
        Some(tint) if tint != 0.0 => Some(apply_tint(&base, tint)),
        _ => Some(base),
    }
}

/// Lighten (`tint > 0`) or darken (`tint < 0`) a `#RRGGBB` color.
pub fn apply_tint(rgb: &str, tint: f64) -> String {
    let tint = tint.clamp(-1.0, 1.0);
    let hex = rgb.trim_start_matches('#');
    let channel = |i: usize| {
        let c = hex
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0) as f64;
        let adjusted = if tint < 0.0 {
            c * (1.0 + tint)
        } else {
            c * (1.0 - tint) + 255.0 * tint
        };
        adjusted.round().clamp(0.0, 255.0) as u8
    };
    format!("#{:02X}{:02X}{:02X}", channel(0), channel(2), channel(4))
}

/// `#RRGGBB` to the `AARRGGBB` form used by SpreadsheetML.
pub fn to_argb(color: &str) -> String {
    match normalize_color(color) {
        Some(c) => format!("FF{}", &c[1..]),
        None => "FF000000".to_string(),
    }
}

/// `#RRGGBB` to the bare `RRGGBB` form used by DrawingML.
pub fn to_rgb(color: &str) -> String {
    match normalize_color(color) {
        Some(c) => c[1..].to_string(),
        None => "000000".to_string(),
    }
}
