use std::cell::OnceCell;
use std::fmt;

/// Memoized derived value: filled on first read, cleared on write.
///
/// Equality ignores the cached value so nodes holding a cache can derive
/// `PartialEq` over their structural fields only.
pub struct Cache<T>(OnceCell<T>);

impl<T> Cache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(OnceCell::new())
    }

    /// Returns the cached value, computing it with `init` if absent.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(init)
    }

    /// Drops the cached value.
    pub fn invalidate(&mut self) {
        self.0.take();
    }

    /// Returns `true` if a value is currently cached.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.get().is_some()
    }
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Cache<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("valid", &self.is_valid())
            .finish()
    }
}
