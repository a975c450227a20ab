//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    /// Open the selected item.
    Open,
    /// Go to the enclosing screen.
    Back,
    NextTab,
    PrevTab,
    NextPage,
    PrevPage,
    /// Drop every cached page and refetch.
    Reload,
    CycleInterval,
    OpenHelp,
    Cancel,
    /// Create an item in the list on screen.
    NewItem,
    /// Rename the room on screen or selected.
    EditItem,
    DeleteItem,
    /// Toggle the selected member between user and admin.
    ChangeRole,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Reload),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::OpenHelp),
        KeyCode::Char('r') => Some(Action::Reload),
        KeyCode::Char('i') => Some(Action::CycleInterval),
        KeyCode::Char('a') => Some(Action::NewItem),
        KeyCode::Char('e') => Some(Action::EditItem),
        KeyCode::Char('d') => Some(Action::DeleteItem),
        KeyCode::Char('c') => Some(Action::ChangeRole),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Some(Action::Open),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => Some(Action::Back),
        KeyCode::Tab => Some(Action::NextTab),
        KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::PageDown | KeyCode::Char('n') => Some(Action::NextPage),
        KeyCode::PageUp | KeyCode::Char('p') => Some(Action::PrevPage),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_vim_and_arrow_keys_agree() {
        assert_eq!(map_key(key(KeyCode::Char('j'))), map_key(key(KeyCode::Down)));
        assert_eq!(map_key(key(KeyCode::Char('k'))), map_key(key(KeyCode::Up)));
        assert_eq!(map_key(key(KeyCode::Char('h'))), Some(Action::Back));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(Action::Open));
    }

    #[test]
    fn test_management_keys() {
        assert_eq!(map_key(key(KeyCode::Char('a'))), Some(Action::NewItem));
        assert_eq!(map_key(key(KeyCode::Char('e'))), Some(Action::EditItem));
        assert_eq!(map_key(key(KeyCode::Char('d'))), Some(Action::DeleteItem));
        assert_eq!(map_key(key(KeyCode::Char('c'))), Some(Action::ChangeRole));
    }

    #[test]
    fn test_control_bindings() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c), Some(Action::Quit));
        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_x), None);
    }
}
