//! In-process document root.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::RootElement;

/// A shared set of presentation classes.
///
/// Clones share the same set, so the holder can own one copy while renderers
/// and tests read another.
#[derive(Debug, Clone, Default)]
pub struct ClassList {
    inner: Rc<RefCell<ClassListState>>,
}

#[derive(Debug, Default)]
struct ClassListState {
    classes: BTreeSet<String>,
    mutations: usize,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given classes already present.
    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = Self::new();
        list.inner
            .borrow_mut()
            .classes
            .extend(classes.into_iter().map(Into::into));
        list
    }

    /// Number of `set_class` calls across all clones.
    pub fn mutations(&self) -> usize {
        self.inner.borrow().mutations
    }
}

impl RootElement for ClassList {
    fn set_class(&self, class: &str, present: bool) {
        let mut state = self.inner.borrow_mut();
        state.mutations += 1;
        if present {
            state.classes.insert(class.to_string());
        } else {
            state.classes.remove(class);
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.inner.borrow().classes.contains(class)
    }

    fn classes(&self) -> Vec<String> {
        self.inner.borrow().classes.iter().cloned().collect()
    }
}
