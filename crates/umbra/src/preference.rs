//! The observable theme-preference holder.
//!
//! [`ThemePreference`] owns the current [`ColorMode`], the [`Environment`] it
//! syncs with, and a list of listeners. It is built once at application start
//! and handed to consumers by reference.
//!
//! # Resolution
//!
//! The starting mode comes from the first rule that answers:
//!
//! ```text
//! resolve_initial
//! ├── Persisted  → stored value, if present and a valid mode
//! ├── System     → OS prefers-dark signal
//! └── Default    → configured static default (light)
//! ```
//!
//! A headless environment skips straight to the default.
//!
//! # Side effect
//!
//! On construction and on every `set`, the holder puts the dark class on the
//! document root iff the mode is dark, and writes the mode's string form to
//! the store. Listeners run after that, synchronously, in subscription order.
//! A `set` made from inside a listener is queued behind the deliveries already
//! pending, so every listener sees changes in the order they happened and its
//! last value is the holder's current one.
//!
//! ```rust
//! use umbra::env::{ClassList, DisplayEnvironment, Environment, FixedScheme, MemoryStore, RootElement};
//! use umbra::{ColorMode, PreferenceOptions, ThemePreference};
//!
//! let store = MemoryStore::new();
//! let root = ClassList::new();
//! let env = Environment::display(DisplayEnvironment::new(
//!     store.clone(),
//!     FixedScheme::dark(),
//!     root.clone(),
//! ));
//!
//! let theme = ThemePreference::initialize(env, PreferenceOptions::default());
//! assert_eq!(theme.get(), ColorMode::Dark);
//! assert!(root.has_class("dark"));
//!
//! theme.set(ColorMode::Light);
//! assert_eq!(store.get("theme").as_deref(), Some("light"));
//! assert!(!root.has_class("dark"));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::env::{DisplayEnvironment, Environment};
use crate::mode::ColorMode;

/// Which rule produced the initial mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSource {
    /// A valid value was found in the preference store.
    Persisted,
    /// The OS color-scheme preference decided.
    System,
    /// Nothing else applied.
    Default,
}

/// The initial mode along with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMode {
    pub mode: ColorMode,
    pub source: ModeSource,
}

/// Keys and defaults the holder works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceOptions {
    pub storage_key: String,
    pub dark_class: String,
    pub default_mode: ColorMode,
}

impl Default for PreferenceOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PreferenceOptions {
    fn from(config: &Config) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            dark_class: config.dark_class.clone(),
            default_mode: config.default_mode,
        }
    }
}

/// Handle returned by [`ThemePreference::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(ColorMode)>;

/// Shared, observable light/dark mode.
///
/// All methods take `&self`; the holder is single-threaded and uses interior
/// mutability. No borrow is held while listeners run, so a listener may call
/// back into the holder, including `set` and `subscribe`.
pub struct ThemePreference {
    mode: Cell<ColorMode>,
    source: ModeSource,
    options: PreferenceOptions,
    environment: Environment,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
    pending: RefCell<VecDeque<(Listener, ColorMode)>>,
    draining: Cell<bool>,
}

impl ThemePreference {
    /// Resolves the starting mode and applies it to the environment once.
    pub fn initialize(environment: Environment, options: PreferenceOptions) -> Self {
        let resolved = resolve_initial(&environment, &options);
        tracing::debug!(mode = %resolved.mode, source = ?resolved.source, "resolved initial theme");

        let theme = Self {
            mode: Cell::new(resolved.mode),
            source: resolved.source,
            options,
            environment,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
        };
        theme.apply(resolved.mode);
        theme
    }

    /// Current mode.
    pub fn get(&self) -> ColorMode {
        self.mode.get()
    }

    /// Which rule produced the initial mode.
    pub fn source(&self) -> ModeSource {
        self.source
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Sets the mode, applies it, then notifies every listener.
    ///
    /// Setting the current value again still applies and notifies.
    pub fn set(&self, mode: ColorMode) {
        self.mode.set(mode);
        self.apply(mode);
        self.notify(mode);
    }

    /// Sets the mode from a string; anything other than `dark` means light.
    pub fn set_str(&self, value: &str) {
        let mode = ColorMode::coerce(value);
        if mode == ColorMode::Light && !value.trim().eq_ignore_ascii_case("light") {
            tracing::warn!(value, "unrecognized theme value; using light");
        }
        self.set(mode);
    }

    /// Sets the mode to `f(current)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(ColorMode) -> ColorMode,
    {
        self.set(f(self.get()));
    }

    /// Flips the mode and returns the new value.
    pub fn toggle(&self) -> ColorMode {
        let next = self.get().toggled();
        self.set(next);
        next
    }

    /// Registers a listener and calls it right away with the current mode.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(ColorMode) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let listener: Listener = Rc::new(listener);
        self.listeners.borrow_mut().push((id, Rc::clone(&listener)));
        self.pending.borrow_mut().push_back((listener, self.get()));
        self.drain();
        id
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn apply(&self, mode: ColorMode) {
        let Some(display) = self.environment.as_display() else {
            return;
        };

        display
            .root()
            .set_class(&self.options.dark_class, mode.is_dark());

        if let Err(err) = display.store().store(&self.options.storage_key, mode.as_str()) {
            tracing::warn!(error = %err, "failed to persist theme preference");
        }
    }

    fn notify(&self, mode: ColorMode) {
        {
            let listeners = self.listeners.borrow();
            let mut pending = self.pending.borrow_mut();
            for (_, listener) in listeners.iter() {
                pending.push_back((Rc::clone(listener), mode));
            }
        }
        self.drain();
    }

    /// Runs queued deliveries in order. A nested call returns at once and
    /// leaves its work to the outermost one.
    fn drain(&self) {
        if self.draining.replace(true) {
            return;
        }
        let _guard = DrainGuard(self);

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some((listener, mode)) = next else {
                break;
            };
            listener(mode);
        }
    }
}

/// Resets the drain state even if a listener panics.
struct DrainGuard<'a>(&'a ThemePreference);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.pending.borrow_mut().clear();
        self.0.draining.set(false);
    }
}

impl fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemePreference")
            .field("mode", &self.mode.get())
            .field("source", &self.source)
            .field("options", &self.options)
            .field("environment", &self.environment)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Works out the starting mode without writing anything.
pub fn resolve_initial(environment: &Environment, options: &PreferenceOptions) -> ResolvedMode {
    let Some(display) = environment.as_display() else {
        return ResolvedMode {
            mode: options.default_mode,
            source: ModeSource::Default,
        };
    };

    if let Some(mode) = persisted_mode(display, &options.storage_key) {
        return ResolvedMode {
            mode,
            source: ModeSource::Persisted,
        };
    }

    ResolvedMode {
        mode: ColorMode::from_prefers_dark(display.scheme().prefers_dark()),
        source: ModeSource::System,
    }
}

fn persisted_mode(display: &DisplayEnvironment, key: &str) -> Option<ColorMode> {
    let raw = display.store().load(key)?;
    // Only the exact forms written by `apply` count as a saved preference.
    match raw.as_str() {
        "light" => Some(ColorMode::Light),
        "dark" => Some(ColorMode::Dark),
        _ => {
            tracing::debug!(value = %raw, "ignoring invalid persisted theme");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ClassList, FixedScheme, MemoryStore, RootElement};

    struct Fixture {
        store: MemoryStore,
        scheme: FixedScheme,
        root: ClassList,
    }

    impl Fixture {
        fn new(store: MemoryStore, scheme: FixedScheme) -> Self {
            Self {
                store,
                scheme,
                root: ClassList::new(),
            }
        }

        fn environment(&self) -> Environment {
            Environment::display(DisplayEnvironment::new(
                self.store.clone(),
                self.scheme.clone(),
                self.root.clone(),
            ))
        }

        fn theme(&self) -> ThemePreference {
            ThemePreference::initialize(self.environment(), PreferenceOptions::default())
        }
    }

    #[test]
    fn persisted_dark_wins_over_light_system() {
        let fx = Fixture::new(
            MemoryStore::new().with_value("theme", "dark"),
            FixedScheme::light(),
        );
        let theme = fx.theme();
        assert_eq!(theme.get(), ColorMode::Dark);
        assert_eq!(theme.source(), ModeSource::Persisted);
        assert_eq!(fx.scheme.queries(), 0);
    }

    #[test]
    fn persisted_light_wins_over_dark_system() {
        let fx = Fixture::new(
            MemoryStore::new().with_value("theme", "light"),
            FixedScheme::dark(),
        );
        assert_eq!(fx.theme().get(), ColorMode::Light);
    }

    #[test]
    fn system_dark_when_nothing_persisted() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::dark());
        let theme = fx.theme();
        assert_eq!(theme.get(), ColorMode::Dark);
        assert_eq!(theme.source(), ModeSource::System);
    }

    #[test]
    fn system_light_when_nothing_persisted() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        assert_eq!(fx.theme().get(), ColorMode::Light);
    }

    #[test]
    fn invalid_persisted_value_falls_through_to_system() {
        let fx = Fixture::new(
            MemoryStore::new().with_value("theme", "sepia"),
            FixedScheme::dark(),
        );
        let theme = fx.theme();
        assert_eq!(theme.get(), ColorMode::Dark);
        assert_eq!(theme.source(), ModeSource::System);
        assert_eq!(fx.store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn persisted_value_must_match_exactly() {
        for raw in ["DARK", " dark", "Light"] {
            let fx = Fixture::new(MemoryStore::new().with_value("theme", raw), FixedScheme::light());
            let theme = fx.theme();
            assert_eq!(theme.get(), ColorMode::Light, "stored {raw:?}");
            assert_eq!(theme.source(), ModeSource::System, "stored {raw:?}");
        }
    }

    #[test]
    fn headless_uses_default() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        assert_eq!(theme.get(), ColorMode::Light);
        assert_eq!(theme.source(), ModeSource::Default);
    }

    #[test]
    fn headless_respects_configured_default() {
        let options = PreferenceOptions {
            default_mode: ColorMode::Dark,
            ..PreferenceOptions::default()
        };
        let theme = ThemePreference::initialize(Environment::headless(), options);
        assert_eq!(theme.get(), ColorMode::Dark);
    }

    #[test]
    fn initialize_applies_side_effect_once() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::dark());
        let _theme = fx.theme();

        assert!(fx.root.has_class("dark"));
        assert_eq!(fx.store.get("theme").as_deref(), Some("dark"));
        assert_eq!(fx.store.writes(), 1);
        assert_eq!(fx.root.mutations(), 1);
    }

    #[test]
    fn set_dark_then_light() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        let theme = fx.theme();

        theme.set(ColorMode::Dark);
        assert_eq!(theme.get(), ColorMode::Dark);
        assert_eq!(fx.store.get("theme").as_deref(), Some("dark"));
        assert!(fx.root.has_class("dark"));

        theme.set(ColorMode::Light);
        assert_eq!(fx.store.get("theme").as_deref(), Some("light"));
        assert!(!fx.root.has_class("dark"));
    }

    #[test]
    fn set_twice_same_end_state_and_notifies_twice() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        let theme = fx.theme();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        theme.subscribe(move |mode| sink.borrow_mut().push(mode));

        theme.set(ColorMode::Dark);
        let classes_once = fx.root.classes();
        theme.set(ColorMode::Dark);

        assert_eq!(fx.root.classes(), classes_once);
        assert_eq!(fx.store.get("theme").as_deref(), Some("dark"));
        assert_eq!(
            *seen.borrow(),
            vec![ColorMode::Light, ColorMode::Dark, ColorMode::Dark]
        );
    }

    #[test]
    fn set_str_coerces() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        let theme = fx.theme();

        theme.set_str("DARK");
        assert_eq!(theme.get(), ColorMode::Dark);

        theme.set_str("purple");
        assert_eq!(theme.get(), ColorMode::Light);
        assert_eq!(fx.store.get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        let theme = fx.theme();

        assert_eq!(theme.toggle(), ColorMode::Dark);
        assert_eq!(fx.store.get("theme").as_deref(), Some("dark"));
        assert_eq!(theme.toggle(), ColorMode::Light);
        assert!(!fx.root.has_class("dark"));
    }

    #[test]
    fn update_uses_current_value() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        theme.update(|mode| mode.toggled());
        assert_eq!(theme.get(), ColorMode::Dark);
    }

    #[test]
    fn subscribe_delivers_current_value_immediately() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        theme.subscribe(move |mode| sink.set(Some(mode)));
        assert_eq!(seen.get(), Some(ColorMode::Light));
    }

    #[test]
    fn listeners_notified_in_subscription_order() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            theme.subscribe(move |mode| order.borrow_mut().push((tag, mode)));
        }
        order.borrow_mut().clear();

        theme.set(ColorMode::Dark);
        assert_eq!(
            *order.borrow(),
            vec![
                ("first", ColorMode::Dark),
                ("second", ColorMode::Dark),
                ("third", ColorMode::Dark),
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let id = theme.subscribe(move |_| sink.set(sink.get() + 1));

        assert!(theme.unsubscribe(id));
        assert!(!theme.unsubscribe(id));
        theme.set(ColorMode::Dark);

        assert_eq!(count.get(), 1);
        assert_eq!(theme.listener_count(), 0);
    }

    #[test]
    fn listener_can_reenter() {
        let theme = Rc::new(ThemePreference::initialize(
            Environment::headless(),
            PreferenceOptions::default(),
        ));
        let inner = Rc::downgrade(&theme);
        theme.subscribe(move |mode| {
            if let Some(theme) = inner.upgrade() {
                let _ = theme.get();
                if mode == ColorMode::Dark {
                    theme.subscribe(|_| {});
                }
            }
        });

        theme.set(ColorMode::Dark);
        assert_eq!(theme.listener_count(), 2);
    }

    #[test]
    fn nested_set_reaches_every_listener_in_order() {
        let theme = Rc::new(ThemePreference::initialize(
            Environment::headless(),
            PreferenceOptions::default(),
        ));
        let inner = Rc::downgrade(&theme);
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&first);
        theme.subscribe(move |mode| {
            sink.borrow_mut().push(mode);
            if mode == ColorMode::Dark {
                if let Some(theme) = inner.upgrade() {
                    theme.set(ColorMode::Light);
                }
            }
        });
        let sink = Rc::clone(&second);
        theme.subscribe(move |mode| sink.borrow_mut().push(mode));

        theme.set(ColorMode::Dark);

        assert_eq!(theme.get(), ColorMode::Light);
        assert_eq!(
            *first.borrow(),
            vec![ColorMode::Light, ColorMode::Dark, ColorMode::Light]
        );
        assert_eq!(
            *second.borrow(),
            vec![ColorMode::Light, ColorMode::Dark, ColorMode::Light]
        );
        assert_eq!(first.borrow().last().copied(), Some(theme.get()));
        assert_eq!(second.borrow().last().copied(), Some(theme.get()));
    }

    #[test]
    fn subscribe_inside_listener_is_delivered_after_current_round() {
        let theme = Rc::new(ThemePreference::initialize(
            Environment::headless(),
            PreferenceOptions::default(),
        ));
        let inner = Rc::downgrade(&theme);
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&order);
        theme.subscribe(move |mode| {
            log.borrow_mut().push(("outer", mode));
            if mode == ColorMode::Dark {
                if let Some(theme) = inner.upgrade() {
                    let log = Rc::clone(&log);
                    theme.subscribe(move |mode| log.borrow_mut().push(("late", mode)));
                }
            }
        });
        let log = Rc::clone(&order);
        theme.subscribe(move |mode| log.borrow_mut().push(("next", mode)));
        order.borrow_mut().clear();

        theme.set(ColorMode::Dark);
        assert_eq!(
            *order.borrow(),
            vec![
                ("outer", ColorMode::Dark),
                ("next", ColorMode::Dark),
                ("late", ColorMode::Dark),
            ]
        );
    }

    #[test]
    fn panicking_listener_does_not_wedge_delivery() {
        let theme = ThemePreference::initialize(Environment::headless(), PreferenceOptions::default());
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        theme.subscribe(move |mode| {
            if mode == ColorMode::Dark {
                panic!("listener failed");
            }
            sink.set(sink.get() + 1);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            theme.set(ColorMode::Dark)
        }));
        assert!(result.is_err());

        theme.set(ColorMode::Light);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn write_failure_is_swallowed() {
        let fx = Fixture::new(MemoryStore::read_only(), FixedScheme::dark());
        let theme = fx.theme();

        theme.set(ColorMode::Light);
        assert_eq!(theme.get(), ColorMode::Light);
        assert!(!fx.root.has_class("dark"));
        assert_eq!(fx.store.writes(), 2);
    }

    #[test]
    fn custom_key_and_class() {
        let fx = Fixture::new(MemoryStore::new(), FixedScheme::light());
        let options = PreferenceOptions {
            storage_key: "ui.mode".to_string(),
            dark_class: "theme-dark".to_string(),
            default_mode: ColorMode::Light,
        };
        let theme = ThemePreference::initialize(fx.environment(), options);

        theme.set(ColorMode::Dark);
        assert_eq!(fx.store.get("ui.mode").as_deref(), Some("dark"));
        assert_eq!(fx.store.get("theme"), None);
        assert!(fx.root.has_class("theme-dark"));
        assert!(!fx.root.has_class("dark"));
    }
}
