//! Session-scoped cached values
//!
//! Holds a value for the lifetime of a dashboard session. Nothing expires on
//! its own; `invalidate` is the only way to drop a cached value. Failed
//! initialisations are not cached.

use crate::error::Result;

#[derive(Debug)]
pub struct SessionCache<T> {
    value: Option<T>,
    loads: usize,
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SessionCache<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            loads: 0,
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_cached(&self) -> bool {
        self.value.is_some()
    }

    /// Number of times a value was stored
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Store `value`, replacing any cached one
    pub fn set(&mut self, value: T) -> &mut T {
        self.loads += 1;
        self.value.insert(value)
    }

    /// Cached value, initialising it with `init` when empty
    pub fn get_or_try_init<F>(&mut self, init: F) -> Result<&mut T>
    where
        F: FnOnce() -> Result<T>,
    {
        let value = match self.value.take() {
            Some(value) => value,
            None => {
                let value = init()?;
                self.loads += 1;
                value
            }
        };
        Ok(self.value.insert(value))
    }

    /// Drop the cached value; the next access initialises again
    pub fn invalidate(&mut self) -> Option<T> {
        self.value.take()
    }
}
