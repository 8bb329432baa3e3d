//! Input handling for the TUI.
//!
//! Processes keyboard events and updates application state.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{AppMode, Intent};
use crate::settings::SettingEdit;
use crate::App;

/// Handle keyboard events.
pub fn handle_events(key: KeyEvent, app: &mut App) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        AppMode::Normal => handle_normal_mode(key, app),
        AppMode::EditingToken => handle_token_mode(key, app),
        AppMode::EditingField => handle_field_mode(key, app),
        AppMode::Search => handle_search_mode(key, app),
        AppMode::ConfirmReset => handle_confirm_reset_mode(key, app),
        AppMode::Help => handle_help_mode(key, app),
    }
}

/// Handle bracketed paste.
pub fn handle_paste(text: &str, app: &mut App) {
    match app.mode {
        AppMode::EditingToken => app.paste_token(text.trim()),
        AppMode::EditingField => {
            app.paste_into_selected(text);
        }
        AppMode::Search => text.chars().for_each(|c| app.enter_search_char(c)),
        _ => {}
    }
}

fn handle_normal_mode(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => app.show_help(),

        // Tabs
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_tab(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.previous_tab(),

        // Settings
        KeyCode::Down | KeyCode::Char('j') => app.next_field(),
        KeyCode::Up | KeyCode::Char('k') => app.previous_field(),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_selected(),
        KeyCode::Char('r') => app.ask_reset(),

        // Service
        KeyCode::Char('s') => {
            app.toggle_service();
        }
        KeyCode::Char('t') => app.mode = AppMode::EditingToken,
        KeyCode::Char('p') => {
            app.dispatch(Intent::ListPlugins);
        }
        KeyCode::Char('u') => {
            app.dispatch(Intent::RescanPlugins);
        }

        // Console
        KeyCode::Char('/') => app.mode = AppMode::Search,
        KeyCode::Char('c') => app.console.clear(),

        _ => {}
    }
}

fn handle_token_mode(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => app.mode = AppMode::Normal,
        KeyCode::Enter => {
            app.mode = AppMode::Normal;
            app.toggle_service();
        }
        KeyCode::Backspace => app.delete_token_char(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.token_input.clear();
        }
        KeyCode::Char(c) => app.enter_token_char(c),
        _ => {}
    }
}

fn handle_field_mode(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.mode = AppMode::Normal,
        KeyCode::Down => {
            app.mode = AppMode::Normal;
            app.next_field();
        }
        KeyCode::Up => {
            app.mode = AppMode::Normal;
            app.previous_field();
        }
        KeyCode::Backspace => {
            app.edit_selected(SettingEdit::Backspace);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_selected(SettingEdit::Text(String::new()));
        }
        KeyCode::Char(c) => {
            app.edit_selected(SettingEdit::Append(c));
        }
        _ => {}
    }
}

fn handle_search_mode(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => {
            app.clear_search();
            app.mode = AppMode::Normal;
        }
        KeyCode::Enter => app.mode = AppMode::Normal,
        KeyCode::Backspace => app.delete_search_char(),
        KeyCode::Char(c) => app.enter_search_char(c),
        _ => {}
    }
}

fn handle_confirm_reset_mode(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => app.confirm_reset(),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => app.cancel_reset(),
        _ => {}
    }
}

fn handle_help_mode(key: KeyEvent, app: &mut App) {
    if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?' | 'q')) {
        app.dismiss_help();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceState;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    fn create_key_event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_events(create_key_event(code, KeyModifiers::NONE), app);
    }

    #[test]
    fn test_quit_on_escape() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_on_ctrl_c_while_typing() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        app.mode = AppMode::EditingToken;

        handle_events(create_key_event(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut app);
        assert!(app.should_quit);
    }

    #[test]
    fn test_token_typing_and_start() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.mode, AppMode::EditingToken);
        for c in "tok-123".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.token_input, "tok-12");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.state(), ServiceState::Running);

        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_text_field_typing() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_setting().map(|(k, _)| k).as_deref(), Some("response"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::EditingField);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.current_settings().str_or("response", ""), "Pong?");
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_paste_into_field_and_search() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        let host_tab = app.tabs.len() - 1;
        app.selected_tab = host_tab;
        app.mode = AppMode::EditingField;

        handle_paste("$\n", &mut app);
        assert_eq!(app.current_settings().str_or("default_prefix", ""), "!$");

        app.mode = AppMode::Search;
        handle_paste("Ping", &mut app);
        assert_eq!(app.search, "Ping");
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.current_settings().bool("enabled"), Some(false));

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.current_settings().bool("enabled"), Some(false));

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.current_settings().bool("enabled"), Some(true));
    }

    #[test]
    fn test_rescan_key_reports_outcome() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());

        press(&mut app, KeyCode::Char('u'));
        assert_eq!(
            app.status_message.as_ref().map(|o| o.message.as_str()),
            Some("No new controllers")
        );
    }

    #[test]
    fn test_help_toggle() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());

        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.should_quit);
    }
}
