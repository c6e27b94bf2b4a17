//! Event handling.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Result of event handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    /// Continue processing.
    Continue,
    /// Exit application.
    Exit,
    /// Event was consumed.
    Consumed,
}

/// Action bound to a key on the avatar screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Load the next URL.
    Next,
    /// Load the previous URL.
    Previous,
    /// Drop every cached avatar.
    ClearCache,
    /// Leave the application.
    Quit,
}

/// Maps a key press to its action. Releases and repeats are ignored.
#[must_use]
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(KeyAction::Quit),
        (KeyCode::Char('q') | KeyCode::Esc, _) => Some(KeyAction::Quit),
        (KeyCode::Char('n' | ' ') | KeyCode::Right, _) => Some(KeyAction::Next),
        (KeyCode::Char('p') | KeyCode::Left, _) => Some(KeyAction::Previous),
        (KeyCode::Char('x'), _) => Some(KeyAction::ClearCache),
        _ => None,
    }
}
