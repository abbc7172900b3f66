//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use gemtui::engine::GemKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark gem colours and UI colours, optionally loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Gem colours in `GemKind` order: red, green, blue, yellow, purple, orange, white.
    pub gems: [Color; 7],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (controls help, empty combo).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const ONEDARK_GEMS: [u32; 7] = [
    0xE06C75, // red
    0x98C379, // green
    0x61AFEF, // blue
    0xE5C07B, // yellow
    0xC678DD, // purple
    0xD19A66, // orange
    0xDCDFE4, // white
];

const HIGH_CONTRAST_GEMS: [u32; 7] = [
    0xFF0000, 0x00FF00, 0x0088FF, 0xFFFF00, 0xFF00FF, 0xFF8800, 0xFFFFFF,
];

/// Paul Tol's vivid scheme plus grey: distinguishable without relying on red/green.
const COLORBLIND_GEMS: [u32; 7] = [
    0xCC3311, 0x009988, 0x0077BB, 0xEE7733, 0xEE3377, 0x33BBEE, 0xBBBBBB,
];

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            gems: ONEDARK_GEMS.map(Color::from_u32),
            bg: Color::from_u32(0x31353F),       // meter_bg
            div_line: Color::from_u32(0x3F444F), // div_line
            main_fg: Color::from_u32(0xABB2BF),
            title: Color::from_u32(0xE5C07B),
            inactive_fg: Color::from_u32(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn default_for_palette(palette: Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override gem colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.gems = HIGH_CONTRAST_GEMS.map(Color::from_u32),
            Palette::Colorblind => self.gems = COLORBLIND_GEMS.map(Color::from_u32),
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let fallback = |i: usize| Color::from_u32(ONEDARK_GEMS[i]);
        // Keys match onedark.theme.
        Self {
            gems: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(fallback(0)),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(fallback(1)),
                get("cpu_box").unwrap_or(fallback(2)),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(fallback(3)),
                get("net_box").unwrap_or(fallback(4)),
                get("used_mid").or_else(|| get("temp_mid")).unwrap_or(fallback(5)),
                get("selected_fg").or_else(|| get("hi_fg")).unwrap_or(fallback(6)),
            ],
            bg: get("meter_bg").unwrap_or(Color::from_u32(0x31353F)),
            div_line: get("div_line").unwrap_or(Color::from_u32(0x3F444F)),
            main_fg: get("main_fg").unwrap_or(Color::from_u32(0xABB2BF)),
            title: get("title").unwrap_or(Color::from_u32(0xE5C07B)),
            inactive_fg: get("inactive_fg").unwrap_or(Color::from_u32(0x5C6370)),
        }
    }

    #[inline]
    pub fn gem_color(&self, kind: GemKind) -> Color {
        self.gems[kind.index() as usize % self.gems.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_gem() {
        let map = parse_theme_file(
            r##"
            # comment
            theme[cpu_end]="#112233"
            theme[net_box]='#445566'
            "##,
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.gem_color(GemKind::Red), Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.gem_color(GemKind::Purple), Color::Rgb(0x44, 0x55, 0x66));
        assert_eq!(theme.gem_color(GemKind::Blue), Color::from_u32(0x61AFEF));
    }

    #[test]
    fn test_palettes_keep_gems_distinct() {
        for palette in [Palette::Normal, Palette::HighContrast, Palette::Colorblind] {
            let theme = Theme::default_for_palette(palette);
            for (i, a) in theme.gems.iter().enumerate() {
                assert!(!theme.gems[i + 1..].contains(a), "{palette:?} repeats a colour");
            }
        }
    }
}
