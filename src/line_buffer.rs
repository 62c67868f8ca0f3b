//! In-progress input line
//!
//! Shared between the session's input loop (writer) and the outbound relay,
//! which snapshots it to re-render the prompt after each delivered message.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default initial capacity in bytes
const DEFAULT_CAPACITY: usize = 128;

/// Concurrency-safe text accumulator for one input line
#[derive(Debug)]
pub struct LineBuffer {
    data: RwLock<String>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: RwLock::new(String::with_capacity(capacity)),
        }
    }

    pub fn append(&self, c: char) {
        self.write().push(c);
    }

    /// Remove the last character, if any
    pub fn trim_last(&self) {
        self.write().pop();
    }

    pub fn reset(&self) {
        self.write().clear();
    }

    /// Take the whole line, leaving the buffer empty
    pub fn drain(&self) -> String {
        std::mem::take(&mut *self.write())
    }

    pub fn snapshot(&self) -> String {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, String> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, String> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
