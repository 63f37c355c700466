//! Key bindings: rotation, slot selection, keyboard cursor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RotateLeft,
    RotateRight,
    Select(usize),
    SelectNext,
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    Place,
    Reset,
    Quit,
    None,
}

/// Map key event to game action. Arrows and hjkl both move the cursor.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char('q' | 'Q' | 'z') => Action::RotateLeft,
        KeyCode::Char('e' | 'E' | 'x') => Action::RotateRight,
        KeyCode::Char(c @ '1'..='3') => Action::Select(c as usize - '1' as usize),
        KeyCode::Tab => Action::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Place,
        KeyCode::Char('r' | 'R') => Action::Reset,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn rotation_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Action::RotateLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('e'))), Action::RotateRight);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT)),
            Action::RotateRight
        );
    }

    #[test]
    fn digits_select_slots() {
        assert_eq!(key_to_action(key(KeyCode::Char('1'))), Action::Select(0));
        assert_eq!(key_to_action(key(KeyCode::Char('3'))), Action::Select(2));
        assert_eq!(key_to_action(key(KeyCode::Char('4'))), Action::None);
    }

    #[test]
    fn quit_keys() {
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Action::None
        );
    }

    #[test]
    fn cursor_and_place() {
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::CursorLeft);
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::CursorDown);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Place);
        assert_eq!(key_to_action(key(KeyCode::Char('r'))), Action::Reset);
    }
}
