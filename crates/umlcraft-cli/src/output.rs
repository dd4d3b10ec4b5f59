//! Terminal formatting for progress lines and tables
//!
//! Colors are applied with crossterm; column alignment uses display width so
//! wide characters in titles line up.

use crossterm::style::{Color, Stylize};
use unicode_width::UnicodeWidthStr;

use umlcraft::{GenerationState, Transition};

/// One stderr line describing a state transition
///
/// In-progress states are cyan, success is green and failure red.
pub fn format_transition(transition: &Transition, colored: bool) -> String {
    let name = transition.state.name();
    let detail = match &transition.state {
        GenerationState::Failed { kind, message } => format!(" {}: {}", kind, message),
        GenerationState::Succeeded { artifact, .. } => match artifact.kind {
            Some(kind) => format!(" ({} {}, {} bytes)", kind.as_str(), artifact.format, artifact.document.len()),
            None => format!(" ({}, {} bytes)", artifact.format, artifact.document.len()),
        },
        _ => String::new(),
    };

    if !colored {
        return format!("[{}] {}{}", transition.attempt, name, detail);
    }

    let color = match &transition.state {
        GenerationState::Succeeded { .. } => Color::Green,
        GenerationState::Failed { .. } => Color::Red,
        _ => Color::Cyan,
    };
    format!(
        "{} {}{}",
        format!("[{}]", transition.attempt).with(Color::DarkGrey),
        name.with(color),
        detail
    )
}

/// Pad `text` with spaces to `width` display columns
pub fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

/// Two-column layout: keys padded to the widest key
pub fn aligned_rows(rows: &[(String, String)], separator: &str) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| UnicodeWidthStr::width(key.as_str()))
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(key, value)| format!("  {}{}{}", pad(key, width), separator, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether stderr should carry ANSI colors
pub fn stderr_is_colorful() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    crossterm::tty::IsTty::is_tty(&std::io::stderr())
}
