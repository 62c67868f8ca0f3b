//! Chat line formatting
//!
//! Messages are never stored: they are formatted once and fanned out as
//! plain strings. User lines look like `[ts] name: text`, system notices
//! like `[ts] [system] text`.

use crate::types::Color;

/// Resets the terminal foreground color after a colored name
pub const COLOR_RESET: &str = "\x1b[0m";

/// A user message line
pub fn format_user_message(timestamp: &str, label: &str, text: &str) -> String {
    format!("[{}] {}: {}", timestamp, label, text)
}

/// A system notice line
pub fn format_system_message(timestamp: &str, text: &str) -> String {
    format!("[{}] [system] {}", timestamp, text)
}

/// Wrap a name in its display color
///
/// Returns the bare name when the color token is empty.
pub fn colorize(color: &Color, name: &str) -> String {
    if color.is_none() {
        name.to_string()
    } else {
        format!("{}{}{}", color.as_str(), name, COLOR_RESET)
    }
}

pub fn join_notice(username: &str) -> String {
    format!("{} joined the chat", username)
}

pub fn leave_notice(username: &str) -> String {
    format!("{} left the chat", username)
}
