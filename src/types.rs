//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: sequence-based participant identifier
//! - `Color`: ANSI display color token

use std::fmt;

/// Unique participant identifier (newtype pattern)
///
/// Wraps the value of the room's sequence counter. Ids are handed out in
/// strictly increasing order and never reused for the lifetime of a room.
/// Displays as a fixed-width user id, e.g. `user-007`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{:03}", self.0)
    }
}

/// Display color token
///
/// An ANSI foreground escape sequence such as `"\x1b[32m"`. An empty token
/// means the name is rendered without color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Color(pub String);

impl Color {
    /// A token that renders names uncolored
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Color {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}
