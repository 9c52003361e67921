use crate::runtime::ErasedValue;
use indexmap::IndexMap;
use std::fmt;

/// Values returned by an atomic accessor, keyed by selected field name.
///
/// Keys keep selector order. A key that named no known field is present
/// but undefined: [`is_defined`](Selected::is_defined) is `false` and
/// [`get`](Selected::get) returns `None`.
#[derive(Clone, Default)]
pub struct Selected {
    entries: IndexMap<String, Option<ErasedValue>>,
}

impl Selected {
    pub(crate) fn bind(&mut self, key: impl Into<String>, value: Option<ErasedValue>) {
        self.entries.insert(key.into(), value);
    }

    /// Typed value of a selected field.
    ///
    /// `None` if the key was not selected, is undefined, or holds a value
    /// of another type. The last case is logged.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.as_ref()?;
        let typed = value.downcast_ref::<T>().cloned();
        if typed.is_none() {
            tracing::warn!(
                key,
                requested = std::any::type_name::<T>(),
                "selected field holds a different type"
            );
        }
        typed
    }

    /// Untyped value of a selected field.
    pub fn get_erased(&self, key: &str) -> Option<&ErasedValue> {
        self.entries.get(key)?.as_ref()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` was selected and bound to a published value.
    pub fn is_defined(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Some(_)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Selected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| {
                let state = if value.is_some() { "defined" } else { "undefined" };
                (key, state)
            }))
            .finish()
    }
}
