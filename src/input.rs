//! Key bindings: arrows or WASD for the cursor, Enter/Space to pick a gem.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Select,
    Hint,
    Restart,
    Pause,
    Quit,
    None,
}

/// Map key event to an action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('h' | 'H' | '?') => Action::Hint,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Up | KeyCode::Char('w' | 'W') => Action::Up,
        KeyCode::Down | KeyCode::Char('s' | 'S') => Action::Down,
        KeyCode::Left | KeyCode::Char('a' | 'A') => Action::Left,
        KeyCode::Right | KeyCode::Char('d' | 'D') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        _ => Action::None,
    }
}
