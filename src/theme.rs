//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board, piece and UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Filled board cells and tray pieces.
    pub block: Color,
    /// Snap preview.
    pub ghost: Color,
    /// Preview at a spot where the piece does not fit (keyboard cursor).
    pub ghost_blocked: Color,
    /// Empty board cells.
    pub empty: Color,
    /// Background behind everything.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, help).
    pub main_fg: Color,
    /// Titles and selected tray slot.
    pub title: Color,
    /// Used tray slots.
    pub inactive_fg: Color,
    /// Game-over banner.
    pub danger: Color,
    /// Cleared cells at the start of the fade.
    pub flash: Color,
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
        Self::slate_default()
    }
}

impl Theme {
    /// Slate background with sky-blue blocks.
    pub fn slate_default() -> Self {
        Self {
            block: Color::Rgb(0x38, 0xBD, 0xF8),
            ghost: Color::Rgb(0x0C, 0x4A, 0x6E),
            ghost_blocked: Color::Rgb(0x7F, 0x1D, 0x1D),
            empty: Color::Rgb(0x0F, 0x17, 0x2A),
            bg: Color::Rgb(0x02, 0x06, 0x17),
            div_line: Color::Rgb(0x33, 0x41, 0x55),
            main_fg: Color::Rgb(0xF1, 0xF5, 0xF9),
            title: Color::Rgb(0x38, 0xBD, 0xF8),
            inactive_fg: Color::Rgb(0x47, 0x55, 0x69),
            danger: Color::Rgb(0xB9, 0x1C, 0x1C),
            flash: Color::White,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to defaults if path is None or the file is missing; unknown or bad keys keep their default.
    /// `palette` then overrides the block colours.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
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

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::slate_default();
        t.apply_palette(palette);
        t
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.block = Color::Rgb(0xFF, 0xFF, 0x00);
                self.ghost = Color::Rgb(0x00, 0x88, 0xFF);
                self.ghost_blocked = Color::Rgb(0xFF, 0x00, 0x00);
                self.empty = Color::Rgb(0x20, 0x20, 0x20);
                self.bg = Color::Black;
                self.main_fg = Color::White;
                self.title = Color::Rgb(0xFF, 0xFF, 0x00);
            }
            crate::Palette::Colorblind => {
                // Blue/orange pairs stay distinct for red-green deficiency.
                self.block = Color::Rgb(0x00, 0x77, 0xBB);
                self.ghost = Color::Rgb(0x33, 0xBB, 0xEE);
                self.ghost_blocked = Color::Rgb(0xEE, 0x77, 0x33);
                self.danger = Color::Rgb(0xEE, 0x77, 0x33);
                self.title = Color::Rgb(0x33, 0xBB, 0xEE);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::slate_default();
        Self {
            block: get("hi_fg").or_else(|| get("cpu_box")).unwrap_or(d.block),
            ghost: get("selected_bg").unwrap_or(d.ghost),
            ghost_blocked: get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.ghost_blocked),
            empty: get("meter_bg").unwrap_or(d.empty),
            bg: get("main_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
            danger: get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.danger),
            flash: get("selected_fg").unwrap_or(d.flash),
        }
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
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#38BDF8").unwrap();
        assert!(matches!(c, Color::Rgb(0x38, 0xBD, 0xF8)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("#é1").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_keys_override_defaults() {
        let map = parse_theme_file("# comment\ntheme[hi_fg]='#00FF00'\ntheme[main_bg]=\"bogus\"\n");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.block, Color::Rgb(0, 255, 0));
        assert_eq!(theme.bg, Theme::default().bg);
    }

    #[test]
    fn test_missing_file_uses_palette_default() {
        let theme = Theme::load(
            Some(Path::new("/nonexistent/izzyblock.theme")),
            crate::Palette::HighContrast,
        )
        .unwrap();
        assert_eq!(theme.bg, Color::Black);
    }
}
