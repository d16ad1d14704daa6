//! Colour palettes and their CSS rendering.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const DEFAULT_PALETTE: &str = "default";

/// Foreground used on top of primary and accent surfaces in every palette.
const CONTRAST_FOREGROUND: &str = "210 40% 98%";

/// Six HSL tokens (`"217 91% 60%"`) for one colour mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColors {
    pub background: String,
    pub foreground: String,
    pub card: String,
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub name: String,
    pub light: PaletteColors,
    pub dark: PaletteColors,
}

lazy_static::lazy_static! {
    static ref CATALOG: Vec<ThemePalette> =
        serde_json::from_str(include_str!("../../assets/themes.json"))
            .expect("bundled theme catalog is valid JSON");
}

/// Every built-in palette, `default` first.
pub fn palettes() -> &'static [ThemePalette] {
    &CATALOG
}

pub fn find_palette(name: &str) -> Option<&'static ThemePalette> {
    CATALOG.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

pub fn default_palette() -> &'static ThemePalette {
    find_palette(DEFAULT_PALETTE).unwrap_or(&CATALOG[0])
}

fn write_block(css: &mut String, selector: &str, colors: &PaletteColors) {
    let vars = [
        ("background", colors.background.as_str()),
        ("foreground", colors.foreground.as_str()),
        ("card", colors.card.as_str()),
        ("primary", colors.primary.as_str()),
        ("primary-foreground", CONTRAST_FOREGROUND),
        ("secondary", colors.secondary.as_str()),
        ("secondary-foreground", colors.foreground.as_str()),
        ("accent", colors.accent.as_str()),
        ("accent-foreground", CONTRAST_FOREGROUND),
        ("border", colors.secondary.as_str()),
        ("input", colors.secondary.as_str()),
        ("ring", colors.primary.as_str()),
    ];

    let _ = writeln!(css, "{selector} {{");
    for (name, value) in vars {
        let _ = writeln!(css, "    --{name}: {value};");
    }
    css.push_str("}\n");
}

impl ThemePalette {
    /// CSS custom properties: light values on `:root`, dark values on `.dark`.
    pub fn to_css(&self) -> String {
        let mut css = String::with_capacity(1024);
        write_block(&mut css, ":root", &self.light);
        write_block(&mut css, ".dark", &self.dark);
        css
    }
}
