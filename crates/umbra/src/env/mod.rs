//! Capability interfaces over the host display environment.
//!
//! The preference holder never talks to the filesystem, the OS or the
//! document root directly. It goes through three small traits:
//!
//! - [`PreferenceStore`]: durable key-value storage for the chosen mode
//! - [`SchemeDetector`]: the OS-level "prefers dark" signal
//! - [`RootElement`]: the presentation classes on the document root
//!
//! An [`Environment`] is either [`Headless`](Environment::Headless), in which
//! case nothing is read or written, or [`Display`](Environment::Display),
//! bundling one implementation of each capability. The choice is made once,
//! at construction time:
//!
//! ```text
//! Environment
//! ├── Headless                  → no reads, no writes
//! └── Display(DisplayEnvironment)
//!     ├── store:  FileStore | MemoryStore | ...
//!     ├── scheme: OsSchemeDetector | FixedScheme | ...
//!     └── root:   ClassList | ...
//! ```
//!
//! Every trait has an in-memory implementation whose clones share state, so
//! tests can hand one copy to the holder and inspect the other.
//!
//! All of this is single-threaded; none of the traits require `Send` or `Sync`.

mod root;
mod scheme;
mod store;
mod vars;

use std::fmt;

pub use root::ClassList;
pub use scheme::{FixedScheme, OsSchemeDetector};
pub use store::{FileStore, MemoryStore};
pub use vars::{EnvReader, MockEnv, RealEnv};

use crate::config::Config;
use crate::error::ThemeError;

/// Durable key-value storage for the persisted preference.
pub trait PreferenceStore {
    /// Returns the stored value for `key`, if any.
    ///
    /// Unreadable storage reads as absent.
    fn load(&self, key: &str) -> Option<String>;

    /// Writes `value` under `key`, keeping any other entries.
    fn store(&self, key: &str, value: &str) -> Result<(), ThemeError>;
}

/// The host's color-scheme preference.
pub trait SchemeDetector {
    /// Returns `true` if the host reports a dark color-scheme preference.
    ///
    /// An unknown answer is `false`.
    fn prefers_dark(&self) -> bool;
}

/// The root element whose classes drive class-based dark-mode styling.
pub trait RootElement {
    /// Adds `class` when `present` is true, removes it otherwise.
    fn set_class(&self, class: &str, present: bool);

    fn has_class(&self, class: &str) -> bool;

    /// All classes currently on the root, sorted.
    fn classes(&self) -> Vec<String>;
}

/// The capabilities available when a display environment exists.
pub struct DisplayEnvironment {
    store: Box<dyn PreferenceStore>,
    scheme: Box<dyn SchemeDetector>,
    root: Box<dyn RootElement>,
}

impl DisplayEnvironment {
    pub fn new(
        store: impl PreferenceStore + 'static,
        scheme: impl SchemeDetector + 'static,
        root: impl RootElement + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            scheme: Box::new(scheme),
            root: Box::new(root),
        }
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub fn scheme(&self) -> &dyn SchemeDetector {
        self.scheme.as_ref()
    }

    pub fn root(&self) -> &dyn RootElement {
        self.root.as_ref()
    }
}

impl fmt::Debug for DisplayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayEnvironment")
            .field("root_classes", &self.root.classes())
            .finish_non_exhaustive()
    }
}

/// Where the preference holder runs.
#[derive(Debug)]
pub enum Environment {
    /// No display environment: every capability is a no-op.
    Headless,
    /// A display environment with storage, OS query and a document root.
    Display(DisplayEnvironment),
}

impl Environment {
    pub fn headless() -> Self {
        Environment::Headless
    }

    pub fn display(display: DisplayEnvironment) -> Self {
        Environment::Display(display)
    }

    /// Picks the display environment only when `is_display` holds.
    ///
    /// When it does not, `display` is dropped without any of its
    /// capabilities being touched.
    pub fn select(is_display: bool, display: DisplayEnvironment) -> Self {
        if is_display {
            Environment::Display(display)
        } else {
            Environment::Headless
        }
    }

    /// Builds the environment for the current process.
    ///
    /// A display environment needs a resolvable storage location; `headless`
    /// turns it off regardless. The supplied `root` becomes the document root
    /// so the caller keeps a handle on it.
    pub fn detect(config: &Config, vars: &dyn EnvReader, headless: bool, root: ClassList) -> Self {
        if headless {
            tracing::debug!("headless requested");
            return Environment::Headless;
        }

        match config.resolve_store_path(vars) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using display environment");
                Environment::Display(DisplayEnvironment::new(
                    FileStore::new(path),
                    OsSchemeDetector,
                    root,
                ))
            }
            None => {
                tracing::debug!("no storage location resolved; using headless environment");
                Environment::Headless
            }
        }
    }

    pub fn is_headless(&self) -> bool {
        matches!(self, Environment::Headless)
    }

    pub fn as_display(&self) -> Option<&DisplayEnvironment> {
        match self {
            Environment::Display(display) => Some(display),
            Environment::Headless => None,
        }
    }
}
