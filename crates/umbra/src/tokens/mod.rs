//! Design tokens for the utility-class styling pipeline.
//!
//! A [`Palette`] holds one [`TokenPair`] per [`ColorRole`], a set of
//! mode-independent named shades, and a generated [`BackgroundPattern`].
//! It is declarative data: the only logic here is parsing, merging user
//! overrides and emitting the table in a form the build pipeline consumes.
//!
//! The CSS output follows the class-based dark-mode strategy: light values
//! live on `:root`, dark values under the same class the preference holder
//! toggles on the document root.
//!
//! ```rust
//! use umbra::tokens::Palette;
//!
//! let css = Palette::default().to_css("dark");
//! assert!(css.contains(":root {"));
//! assert!(css.contains(".dark {"));
//! ```

mod color;
mod palette;
mod pattern;

pub use color::Rgb;
pub use palette::{ColorRole, Palette, ResolvedPalette, TokenPair};
pub use pattern::BackgroundPattern;
