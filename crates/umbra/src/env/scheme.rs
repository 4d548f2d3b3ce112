//! OS color-scheme detection.

use std::cell::Cell;
use std::rc::Rc;

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};

use super::SchemeDetector;

/// Queries the OS for its color scheme through `dark-light`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSchemeDetector;

impl SchemeDetector for OsSchemeDetector {
    fn prefers_dark(&self) -> bool {
        match detect_os_theme() {
            Ok(OsThemeMode::Dark) => true,
            Ok(OsThemeMode::Light) | Ok(OsThemeMode::Unspecified) => false,
            Err(err) => {
                tracing::debug!(error = %err, "OS color scheme query failed");
                false
            }
        }
    }
}

/// A scheme detector with a fixed answer. Counts how often it is asked.
#[derive(Debug, Clone, Default)]
pub struct FixedScheme {
    prefers_dark: bool,
    queries: Rc<Cell<usize>>,
}

impl FixedScheme {
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            prefers_dark,
            queries: Rc::new(Cell::new(0)),
        }
    }

    pub fn dark() -> Self {
        Self::new(true)
    }

    pub fn light() -> Self {
        Self::new(false)
    }

    /// Number of `prefers_dark` calls across all clones.
    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl SchemeDetector for FixedScheme {
    fn prefers_dark(&self) -> bool {
        self.queries.set(self.queries.get() + 1);
        self.prefers_dark
    }
}
