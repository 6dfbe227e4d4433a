//! Formatting utilities for CLI output.
//!
//! Provides styled help tables, result lines and timestamped
//! notification lines for the interactive client.

use chrono::{DateTime, Local};

use crate::services::umms::PlayerEvent;

use super::{registry::MethodRegistry, types::Shortcut};

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Dim text
    pub const DIM: &'static str = "\x1b[2m";

    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Green color
    pub const GREEN: &'static str = "\x1b[32m";
    /// Yellow color
    pub const YELLOW: &'static str = "\x1b[33m";
    /// Magenta color
    pub const MAGENTA: &'static str = "\x1b[35m";
    /// Cyan color
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Formats section headers with styling
pub fn format_header(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::CYAN, text, Colors::RESET)
}

/// Formats command ids and letters with styling
pub fn format_command(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::GREEN, text, Colors::RESET)
}

/// Formats descriptions with muted styling
pub fn format_description(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats prompts with styling
pub fn format_prompt(text: &str) -> String {
    format!("{}{}{}", Colors::YELLOW, text, Colors::RESET)
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// The command table: shortcuts first, then every method with its id.
pub fn format_help(registry: &MethodRegistry) -> String {
    let mut lines = vec![format_header("Shortcuts:")];
    for shortcut in Shortcut::ALL {
        lines.push(format!(
            "  {}  {}",
            format_command(&shortcut.letter().to_string()),
            format_description(shortcut.description())
        ));
    }

    lines.push(format_header(&format!(
        "Methods ({} protocol):",
        registry.version()
    )));
    for (id, name) in registry.list() {
        lines.push(format!("  {}  {name}", format_command(&format!("{id:>2}"))));
    }

    lines.join("\n")
}

/// A notification line prefixed with its arrival time.
pub fn format_event(event: &PlayerEvent, at: DateTime<Local>) -> String {
    let stamp = at.format("%H:%M:%S%.3f");
    let text = event.to_string();

    match event {
        PlayerEvent::LivenessFailed { .. } | PlayerEvent::Undecodable { .. } => {
            format!("{} {}", format_description(&stamp.to_string()), format_error(&text))
        }
        _ => format!(
            "{} {}{}{}",
            format_description(&stamp.to_string()),
            Colors::MAGENTA,
            text,
            Colors::RESET
        ),
    }
}
