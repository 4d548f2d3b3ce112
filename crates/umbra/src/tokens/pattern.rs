//! Generated background pattern.

use serde::{Deserialize, Serialize};

use super::color::Rgb;
use super::palette::ColorRole;
use crate::error::ThemeError;

/// A tiled dot grid, drawn in one of the palette's role colors.
///
/// Each tile is a `spacing`×`spacing` SVG with one centered dot of `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundPattern {
    pub spacing: u16,
    pub radius: f64,
    pub role: ColorRole,
}

impl Default for BackgroundPattern {
    fn default() -> Self {
        Self {
            spacing: 16,
            radius: 1.0,
            role: ColorRole::Border,
        }
    }
}

impl BackgroundPattern {
    pub fn validate(&self) -> Result<(), ThemeError> {
        if self.spacing == 0 {
            return Err(ThemeError::Config("pattern spacing must be positive".into()));
        }
        if self.radius.is_nan() || self.radius <= 0.0 || self.radius * 2.0 > self.spacing as f64 {
            return Err(ThemeError::Config(format!(
                "pattern radius {} must be positive and fit a {}px tile",
                self.radius, self.spacing
            )));
        }
        Ok(())
    }

    /// One SVG tile, using single quotes so it can sit inside a CSS `url("...")`.
    pub fn to_svg(&self, color: Rgb) -> String {
        let center = self.spacing as f64 / 2.0;
        format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='{s}' height='{s}'>\
             <circle cx='{c}' cy='{c}' r='{r}' fill='{fill}'/></svg>",
            s = self.spacing,
            c = center,
            r = self.radius,
            fill = color.to_hex(),
        )
    }

    /// CSS `background-image` value with the tile inlined as a data URI.
    pub fn css_value(&self, color: Rgb) -> String {
        format!(
            "url(\"data:image/svg+xml,{}\")",
            encode_data_uri(&self.to_svg(color))
        )
    }
}

fn encode_data_uri(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len() + 16);
    for c in svg.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '"' => out.push('\''),
            _ => out.push(c),
        }
    }
    out
}
