//! Keyboard input handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use papshop_core::Route;

use crate::app::{App, AppResult, Field, StatusLevel};

/// Handle a key event
pub fn handle_key(app: &mut App, key: KeyEvent) -> AppResult {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return AppResult::Quit;
    }

    // Blocking notice from the route guard
    if app.nav.notice().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.nav.dismiss_notice();
        }
        return AppResult::Continue;
    }

    if app.confirm.is_some() {
        return handle_confirm(app, key);
    }

    if app.nav.current() == Route::Login {
        handle_login_screen(app, key)
    } else {
        handle_screen(app, key)
    }
}

/// Handle keys on the login form
fn handle_login_screen(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Esc => return AppResult::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.focus = match app.focus {
                Field::Identifier => Field::Password,
                Field::Password => Field::Identifier,
            };
        }
        // Submit control is disabled while a request is in flight
        _ if app.login.is_submitting() => {}
        KeyCode::Enter => {
            if app.focus == Field::Identifier && app.login.password.is_empty() {
                app.focus = Field::Password;
            } else {
                app.submit_login();
            }
        }
        KeyCode::Backspace => {
            focused_field(app).pop();
        }
        KeyCode::Char(c) => {
            focused_field(app).push(c);
        }
        _ => {}
    }

    AppResult::Continue
}

fn focused_field(app: &mut App) -> &mut String {
    match app.focus {
        Field::Identifier => &mut app.login.identifier,
        Field::Password => &mut app.login.password,
    }
}

/// Handle keys on the protected screens
fn handle_screen(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Char('q') => return AppResult::Quit,

        // Screen selection
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.go_to(Route::PROTECTED[index]);
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
            app.cycle_screen(false);
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
            app.cycle_screen(true);
        }

        // Row navigation
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char('g') => app.cursor = 0,
        KeyCode::Char('G') => app.cursor = app.rows.len().saturating_sub(1),

        // Actions
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.request_delete();
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('o') => app.logout(),

        KeyCode::Esc => app.clear_status(),
        KeyCode::Char('?') => {
            app.set_status(
                "1-6/h/l:screen j/k:move r:reload Ctrl-d:delete o:logout q:quit",
                StatusLevel::Info,
            );
        }

        _ => {}
    }

    AppResult::Continue
}

/// Handle keys in the delete confirmation prompt
fn handle_confirm(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm = None,
        _ => {}
    }

    AppResult::Continue
}
