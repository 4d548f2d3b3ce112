//! The design-token palette.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use console::{Color, Style};
use serde::{Deserialize, Serialize};

use super::color::Rgb;
use super::pattern::BackgroundPattern;
use crate::error::ThemeError;
use crate::mode::ColorMode;

/// A color role in the palette. Every role has a light and a dark value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Pastel,
    Text,
    Background,
    Primary,
    Accent,
    Border,
    Surface,
}

impl ColorRole {
    pub const ALL: [ColorRole; 7] = [
        ColorRole::Pastel,
        ColorRole::Text,
        ColorRole::Background,
        ColorRole::Primary,
        ColorRole::Accent,
        ColorRole::Border,
        ColorRole::Surface,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorRole::Pastel => "pastel",
            ColorRole::Text => "text",
            ColorRole::Background => "background",
            ColorRole::Primary => "primary",
            ColorRole::Accent => "accent",
            ColorRole::Border => "border",
            ColorRole::Surface => "surface",
        }
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorRole {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ThemeError::UnknownRole(s.to_string()))
    }
}

/// The light and dark values of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub light: Rgb,
    pub dark: Rgb,
}

impl TokenPair {
    pub const fn new(light: Rgb, dark: Rgb) -> Self {
        Self { light, dark }
    }

    pub fn get(&self, mode: ColorMode) -> Rgb {
        match mode {
            ColorMode::Light => self.light,
            ColorMode::Dark => self.dark,
        }
    }
}

const DEFAULT_COLORS: [(ColorRole, TokenPair); 7] = [
    (
        ColorRole::Pastel,
        TokenPair::new(Rgb(0xff, 0xf5, 0x82), Rgb(0x8a, 0x7f, 0x2e)),
    ),
    (
        ColorRole::Text,
        TokenPair::new(Rgb(0x33, 0x33, 0x33), Rgb(0xe8, 0xe6, 0xe1)),
    ),
    (
        ColorRole::Background,
        TokenPair::new(Rgb(0xf9, 0xf9, 0xf6), Rgb(0x1c, 0x1c, 0x1a)),
    ),
    (
        ColorRole::Primary,
        TokenPair::new(Rgb(0x3f, 0x6c, 0x51), Rgb(0x9c, 0xc5, 0xa1)),
    ),
    (
        ColorRole::Accent,
        TokenPair::new(Rgb(0xf3, 0xee, 0xd9), Rgb(0x4a, 0x5a, 0x3f)),
    ),
    (
        ColorRole::Border,
        TokenPair::new(Rgb(0xe2, 0xde, 0xd0), Rgb(0x3a, 0x3a, 0x36)),
    ),
    (
        ColorRole::Surface,
        TokenPair::new(Rgb(0xff, 0xff, 0xff), Rgb(0x26, 0x26, 0x24)),
    ),
];

// Mode-independent named shades.
const DEFAULT_EXTRAS: [(&str, Rgb); 6] = [
    ("pastel-yellow", Rgb(0xff, 0xf5, 0x82)),
    ("pastel-white", Rgb(0xf9, 0xf9, 0xf6)),
    ("text-light", Rgb(0x6b, 0x6b, 0x6b)),
    ("text-dark", Rgb(0x33, 0x33, 0x33)),
    ("accent-beige", Rgb(0xf3, 0xee, 0xd9)),
    ("accent-sage", Rgb(0xdc, 0xe5, 0xd1)),
];

/// The full token table: role pairs, named extras and the background pattern.
///
/// Loading from YAML merges onto the defaults, so a file only lists what it
/// changes:
///
/// ```rust
/// use umbra::tokens::{ColorRole, Palette, Rgb};
/// use umbra::ColorMode;
///
/// let palette = Palette::from_yaml(r##"
/// colors:
///   primary:
///     dark: "#88c0d0"
/// extras:
///   brand-ink: "#1b1f3b"
/// pattern:
///   spacing: 24
/// "##).unwrap();
///
/// assert_eq!(palette.color(ColorRole::Primary, ColorMode::Dark), Rgb(0x88, 0xc0, 0xd0));
/// assert_eq!(palette.color(ColorRole::Primary, ColorMode::Light), Rgb(0x3f, 0x6c, 0x51));
/// assert_eq!(palette.pattern().spacing, 24);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: Option<String>,
    colors: BTreeMap<ColorRole, TokenPair>,
    extras: BTreeMap<String, Rgb>,
    pattern: BackgroundPattern,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PaletteOverrides {
    name: Option<String>,
    colors: BTreeMap<String, PairOverride>,
    extras: BTreeMap<String, Rgb>,
    pattern: Option<BackgroundPattern>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PairOverride {
    light: Option<Rgb>,
    dark: Option<Rgb>,
}

#[derive(Serialize)]
struct PaletteDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    colors: &'a BTreeMap<ColorRole, TokenPair>,
    extras: &'a BTreeMap<String, Rgb>,
    pattern: &'a BackgroundPattern,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: None,
            colors: DEFAULT_COLORS.into_iter().collect(),
            extras: DEFAULT_EXTRAS
                .into_iter()
                .map(|(name, rgb)| (name.to_string(), rgb))
                .collect(),
            pattern: BackgroundPattern::default(),
        }
    }
}

impl Palette {
    /// Parses YAML overrides and merges them onto the default palette.
    pub fn from_yaml(yaml: &str) -> Result<Self, ThemeError> {
        let mut palette = Self::default();
        if yaml.trim().is_empty() {
            return Ok(palette);
        }
        let overrides: PaletteOverrides = serde_yaml::from_str(yaml)?;
        palette.merge(overrides)?;
        Ok(palette)
    }

    /// Loads overrides from a YAML file.
    ///
    /// Unless the file sets `name`, the palette is named after the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ThemeError::io(path, e))?;
        let mut palette = Self::from_yaml(&content)?;
        if palette.name.is_none() {
            palette.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string());
        }
        Ok(palette)
    }

    fn merge(&mut self, overrides: PaletteOverrides) -> Result<(), ThemeError> {
        if overrides.name.is_some() {
            self.name = overrides.name;
        }

        for (name, pair) in overrides.colors {
            let role: ColorRole = name.parse()?;
            let entry = self
                .colors
                .get_mut(&role)
                .ok_or_else(|| ThemeError::UnknownRole(name.clone()))?;
            if let Some(light) = pair.light {
                entry.light = light;
            }
            if let Some(dark) = pair.dark {
                entry.dark = dark;
            }
        }

        for (name, rgb) in overrides.extras {
            validate_token_name(&name)?;
            self.extras.insert(name, rgb);
        }

        if let Some(pattern) = overrides.pattern {
            pattern.validate()?;
            self.pattern = pattern;
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pair(&self, role: ColorRole) -> TokenPair {
        // Every role is populated at construction and merge never removes one.
        self.colors
            .get(&role)
            .copied()
            .unwrap_or_else(|| default_pair(role))
    }

    pub fn color(&self, role: ColorRole, mode: ColorMode) -> Rgb {
        self.pair(role).get(mode)
    }

    pub fn extras(&self) -> &BTreeMap<String, Rgb> {
        &self.extras
    }

    pub fn extra(&self, name: &str) -> Option<Rgb> {
        self.extras.get(name).copied()
    }

    pub fn pattern(&self) -> &BackgroundPattern {
        &self.pattern
    }

    /// The pattern's CSS value in the given mode.
    pub fn pattern_css(&self, mode: ColorMode) -> String {
        self.pattern.css_value(self.color(self.pattern.role, mode))
    }

    /// Every role's color for one mode.
    pub fn resolve(&self, mode: ColorMode) -> ResolvedPalette {
        ResolvedPalette {
            mode,
            colors: ColorRole::ALL
                .into_iter()
                .map(|role| (role, self.color(role, mode)))
                .collect(),
            pattern: self.pattern_css(mode),
        }
    }

    /// CSS custom properties: light values and extras on `:root`, dark
    /// values under `.<dark_class>`.
    pub fn to_css(&self, dark_class: &str) -> String {
        let mut css = String::from(":root {\n");
        for role in ColorRole::ALL {
            push_property(&mut css, &format!("color-{}", role), &self.color(role, ColorMode::Light).to_hex());
        }
        for (name, rgb) in &self.extras {
            push_property(&mut css, &format!("color-{}", name), &rgb.to_hex());
        }
        push_property(&mut css, "pattern-background", &self.pattern_css(ColorMode::Light));
        css.push_str("}\n\n");

        css.push_str(&format!(".{} {{\n", dark_class));
        for role in ColorRole::ALL {
            push_property(&mut css, &format!("color-{}", role), &self.color(role, ColorMode::Dark).to_hex());
        }
        push_property(&mut css, "pattern-background", &self.pattern_css(ColorMode::Dark));
        css.push_str("}\n");
        css
    }

    pub fn to_json(&self) -> Result<String, ThemeError> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    pub fn to_yaml(&self) -> Result<String, ThemeError> {
        Ok(serde_yaml::to_string(&self.document())?)
    }

    /// A terminal swatch: the role color as background, with black or white
    /// text, whichever reads better.
    pub fn style(&self, role: ColorRole, mode: ColorMode) -> Style {
        let rgb = self.color(role, mode);
        let fg = if rgb.luminance() > 0.35 {
            Color::Black
        } else {
            Color::White
        };
        Style::new().bg(rgb.to_console_color()).fg(fg)
    }

    fn document(&self) -> PaletteDocument<'_> {
        PaletteDocument {
            name: self.name.as_deref(),
            colors: &self.colors,
            extras: &self.extras,
            pattern: &self.pattern,
        }
    }
}

/// A palette flattened to one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPalette {
    pub mode: ColorMode,
    pub colors: BTreeMap<ColorRole, Rgb>,
    pub pattern: String,
}

impl ResolvedPalette {
    pub fn get(&self, role: ColorRole) -> Option<Rgb> {
        self.colors.get(&role).copied()
    }
}

fn default_pair(role: ColorRole) -> TokenPair {
    DEFAULT_COLORS
        .into_iter()
        .find(|(r, _)| *r == role)
        .map(|(_, pair)| pair)
        .unwrap_or(TokenPair::new(Rgb(0, 0, 0), Rgb(0xff, 0xff, 0xff)))
}

fn push_property(css: &mut String, name: &str, value: &str) {
    css.push_str("  --");
    css.push_str(name);
    css.push_str(": ");
    css.push_str(value);
    css.push_str(";\n");
}

fn validate_token_name(name: &str) -> Result<(), ThemeError> {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    if starts_ok && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        Ok(())
    } else {
        Err(ThemeError::Config(format!(
            "token name '{}' must be lowercase letters, digits and hyphens",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_has_every_role() {
        let palette = Palette::default();
        for role in ColorRole::ALL {
            let pair = palette.pair(role);
            assert_ne!(pair.light, pair.dark, "{} should differ between modes", role);
        }
    }

    #[test]
    fn default_carries_named_shades() {
        let palette = Palette::default();
        assert_eq!(palette.extra("pastel-yellow"), Some(Rgb(0xff, 0xf5, 0x82)));
        assert_eq!(palette.extra("accent-sage"), Some(Rgb(0xdc, 0xe5, 0xd1)));
        assert_eq!(palette.extra("missing"), None);
    }

    #[test]
    fn role_parse() {
        assert_eq!("surface".parse::<ColorRole>().unwrap(), ColorRole::Surface);
        assert!(matches!(
            "shadow".parse::<ColorRole>(),
            Err(ThemeError::UnknownRole(_))
        ));
    }

    #[test]
    fn yaml_overrides_merge() {
        let palette = Palette::from_yaml(
            r##"
name: forest
colors:
  background:
    light: "#fafaf0"
  text:
    dark: "#fff"
"##,
        )
        .unwrap();

        assert_eq!(palette.name(), Some("forest"));
        assert_eq!(palette.color(ColorRole::Background, ColorMode::Light), Rgb(0xfa, 0xfa, 0xf0));
        assert_eq!(palette.color(ColorRole::Background, ColorMode::Dark), Rgb(0x1c, 0x1c, 0x1a));
        assert_eq!(palette.color(ColorRole::Text, ColorMode::Dark), Rgb(255, 255, 255));
    }

    #[test]
    fn yaml_unknown_role_rejected() {
        let err = Palette::from_yaml("colors:\n  shadow:\n    light: \"#000\"\n").unwrap_err();
        assert!(matches!(err, ThemeError::UnknownRole(name) if name == "shadow"));
    }

    #[test]
    fn yaml_bad_color_rejected() {
        assert!(Palette::from_yaml("colors:\n  text:\n    light: navy\n").is_err());
    }

    #[test]
    fn yaml_bad_extra_name_rejected() {
        assert!(Palette::from_yaml("extras:\n  Brand Ink: \"#000\"\n").is_err());
    }

    #[test]
    fn yaml_bad_pattern_rejected() {
        assert!(Palette::from_yaml("pattern:\n  spacing: 2\n  radius: 4\n").is_err());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Palette::from_yaml("  \n").unwrap(), Palette::default());
    }

    #[test]
    fn from_file_names_after_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meadow.yaml");
        fs::write(&path, "extras:\n  moss: \"#4a5d23\"\n").unwrap();

        let palette = Palette::from_file(&path).unwrap();
        assert_eq!(palette.name(), Some("meadow"));
        assert_eq!(palette.extra("moss"), Some(Rgb(0x4a, 0x5d, 0x23)));
    }

    #[test]
    fn resolve_picks_mode() {
        let palette = Palette::default();
        let dark = palette.resolve(ColorMode::Dark);
        assert_eq!(dark.get(ColorRole::Background), Some(Rgb(0x1c, 0x1c, 0x1a)));
        assert_eq!(dark.colors.len(), ColorRole::ALL.len());
        assert!(dark.pattern.contains("%233a3a36"));
    }

    #[test]
    fn css_has_root_and_dark_blocks() {
        let css = Palette::default().to_css("dark");

        assert!(css.starts_with(":root {\n  --color-pastel: #fff582;\n"));
        assert!(css.contains("\n.dark {\n  --color-pastel: #8a7f2e;\n"));
        assert!(css.contains("  --color-accent-beige: #f3eed9;\n"));
        assert_eq!(css.matches("--pattern-background").count(), 2);
        assert_eq!(css.matches("--color-text-light").count(), 1);
        assert!(css.ends_with("}\n"));
    }

    #[test]
    fn css_uses_custom_dark_class() {
        let css = Palette::default().to_css("theme-dark");
        assert!(css.contains(".theme-dark {"));
        assert!(!css.contains(".dark {"));
    }

    #[test]
    fn json_document_shape() {
        let json = Palette::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["colors"]["primary"]["light"], "#3f6c51");
        assert_eq!(value["colors"]["primary"]["dark"], "#9cc5a1");
        assert_eq!(value["extras"]["text-light"], "#6b6b6b");
        assert_eq!(value["pattern"]["role"], "border");
        assert!(value.get("name").is_none());
    }

    #[test]
    fn yaml_output_reloads_to_same_palette() {
        let original = Palette::from_yaml("name: dusk\nextras:\n  ink: \"#101820\"\n").unwrap();
        let reloaded = Palette::from_yaml(&original.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn swatch_text_contrasts() {
        let palette = Palette::default();
        let light_bg = palette.style(ColorRole::Background, ColorMode::Light);
        let dark_bg = palette.style(ColorRole::Background, ColorMode::Dark);
        let render = |style: Style| style.force_styling(true).apply_to("x").to_string();

        assert!(render(light_bg).contains("\x1b[30m"));
        assert!(render(dark_bg).contains("\x1b[37m"));
    }
}
