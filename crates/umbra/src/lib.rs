//! # Umbra - Persisted Light/Dark Theme Preference
//!
//! `umbra` decides whether an application should render in light or dark
//! mode, remembers that choice, and keeps the presentation layer in sync.
//!
//! ## Core Concepts
//!
//! - [`ColorMode`]: `light` or `dark`, nothing else
//! - [`ThemePreference`]: the observable holder of the current mode
//! - [`Environment`](env::Environment): storage, OS query and document root
//!   behind small traits, or a headless no-op
//! - [`Palette`](tokens::Palette): design tokens with light and dark values
//! - [`Config`]: storage key, class name, default mode and file locations
//!
//! ## Quick Start
//!
//! ```rust
//! use umbra::env::{ClassList, DisplayEnvironment, Environment, FixedScheme, MemoryStore, RootElement};
//! use umbra::{ColorMode, ModeSource, PreferenceOptions, ThemePreference};
//!
//! let store = MemoryStore::new().with_value("theme", "dark");
//! let root = ClassList::new();
//! let env = Environment::display(DisplayEnvironment::new(
//!     store.clone(),
//!     FixedScheme::light(),
//!     root.clone(),
//! ));
//!
//! let theme = ThemePreference::initialize(env, PreferenceOptions::default());
//! assert_eq!(theme.get(), ColorMode::Dark);
//! assert_eq!(theme.source(), ModeSource::Persisted);
//!
//! theme.subscribe(|mode| println!("now {}", mode));
//! theme.toggle();
//! assert_eq!(store.get("theme").as_deref(), Some("light"));
//! assert!(!root.has_class("dark"));
//! ```
//!
//! ## Outside a display
//!
//! A headless environment never reads or writes anything; the holder starts
//! at the configured default and still notifies listeners.
//!
//! ```rust
//! use umbra::env::Environment;
//! use umbra::{ColorMode, PreferenceOptions, ThemePreference};
//!
//! let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
//! assert_eq!(theme.get(), ColorMode::Light);
//! ```

pub mod config;
pub mod env;
mod error;
mod mode;
pub mod preference;
pub mod tokens;

pub use config::Config;
pub use error::ThemeError;
pub use mode::ColorMode;
pub use preference::{
    resolve_initial, ModeSource, PreferenceOptions, ResolvedMode, SubscriptionId, ThemePreference,
};
