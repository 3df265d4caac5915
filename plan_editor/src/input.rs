use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use plan_core::GridKey;

/// Translate a terminal key press into a grid key.
///
/// `?` toggles the legend only while no cell is being edited; during an
/// edit it is ordinary text.
pub fn grid_key(key: KeyEvent, editing: bool) -> Option<GridKey> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(GridKey::Copy),
            KeyCode::Char('v') => Some(GridKey::Paste),
            _ => None,
        };
    }

    let grid_key = match key.code {
        KeyCode::Up => GridKey::Up,
        KeyCode::Down => GridKey::Down,
        KeyCode::Left => GridKey::Left,
        KeyCode::Right => GridKey::Right,
        KeyCode::Home => GridKey::Home,
        KeyCode::End => GridKey::End,
        KeyCode::Enter => GridKey::Enter,
        KeyCode::F(1) => GridKey::ToggleHelp,
        KeyCode::F(2) => GridKey::F2,
        KeyCode::Delete => GridKey::Delete,
        KeyCode::Backspace => GridKey::Backspace,
        KeyCode::Esc => GridKey::Escape,
        KeyCode::Char('?') if !editing => GridKey::ToggleHelp,
        KeyCode::Char(c) => GridKey::Char(c),
        _ => return None,
    };
    Some(grid_key)
}

/// Keys the application handles itself while the grid is not editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKey {
    NextDay,
    PrevDay,
    Day(usize),
    Quit,
}

pub fn app_key(key: KeyEvent) -> Option<AppKey> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Tab => Some(AppKey::NextDay),
        KeyCode::BackTab => Some(AppKey::PrevDay),
        KeyCode::Char('q') => Some(AppKey::Quit),
        KeyCode::Char(c @ '1'..='7') => c.to_digit(10).map(|d| AppKey::Day(d as usize - 1)),
        _ => None,
    }
}
