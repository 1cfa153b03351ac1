//! Terminal UI rendering with ratatui

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use papshop_core::{login::LoginState, Route};

use crate::app::{App, Field, StatusLevel};

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Navigation bar
            Constraint::Min(1),    // Screen
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_nav_bar(f, app, chunks[0]);

    if app.nav.current() == Route::Login {
        draw_login(f, app, chunks[1]);
    } else {
        draw_listing(f, app, chunks[1]);
    }

    draw_status_bar(f, app, chunks[2]);

    if let Some(notice) = app.nav.notice() {
        draw_modal(f, "Thông báo", notice, "Enter: OK");
    } else if let Some(pending) = app.confirm {
        let message = format!("Delete {} #{}?", pending.resource, pending.id);
        draw_modal(f, "Xác nhận", &message, "y: yes  n: no");
    }
}

/// Draw the navigation bar; hidden while logged out
fn draw_nav_bar(f: &mut Frame, app: &App, area: Rect) {
    let bar_style = Style::default().bg(Color::DarkGray);

    if !app.is_logged_in() {
        let title = Paragraph::new(" PAP Shop Admin").style(bar_style.fg(Color::White));
        f.render_widget(title, area);
        return;
    }

    let mut spans = vec![Span::styled(
        " PAP Shop Admin │",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    for (i, route) in Route::PROTECTED.iter().enumerate() {
        let style = if *route == app.nav.current() {
            Style::default().fg(Color::White).bg(accent(app)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, route.title()), style));
    }

    if let Some(user) = app.session.username() {
        spans.push(Span::styled(format!("│ {} ", user), Style::default().fg(Color::Green)));
    }
    spans.push(Span::styled("│ o:Đăng xuất", Style::default().fg(Color::Yellow)));

    f.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), area);
}

/// Draw the login card
fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let card = centered_rect(50, 11, area);
    let block = Block::default()
        .title(" Đăng nhập Admin ")
        .borders(Borders::ALL);
    let inner = block.inner(card);
    f.render_widget(Clear, card);
    f.render_widget(block, card);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Identifier
            Constraint::Length(3), // Password
            Constraint::Length(1), // Error
            Constraint::Length(1), // Submit
        ])
        .split(inner);

    let masked = "•".repeat(app.login.password.chars().count());
    draw_field(
        f,
        rows[0],
        "Email/Số điện thoại/Tên đăng nhập",
        &app.login.identifier,
        app.focus == Field::Identifier,
    );
    draw_field(f, rows[1], "Mật khẩu", &masked, app.focus == Field::Password);

    if let Some(error) = app.login.error() {
        f.render_widget(
            Paragraph::new(error).style(Style::default().fg(Color::Red)),
            rows[2],
        );
    }

    let submit = match app.login.state() {
        LoginState::Submitting => Span::styled(
            "Đang đăng nhập...",
            Style::default().fg(Color::DarkGray),
        ),
        LoginState::Idle | LoginState::Succeeded => Span::styled(
            "[ Enter: Đăng nhập ]",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    };
    f.render_widget(Paragraph::new(Line::from(submit)), rows[3]);

    if !app.login.is_submitting() {
        let (row, len) = match app.focus {
            Field::Identifier => (rows[0], app.login.identifier.chars().count()),
            Field::Password => (rows[1], masked.chars().count()),
        };
        f.set_cursor_position((cursor_x(row, len), row.y.saturating_add(1)));
    }
}

/// Column just past `len` characters inside a bordered field, kept within the border
fn cursor_x(field: Rect, len: usize) -> u16 {
    let offset = u16::try_from(len).unwrap_or(u16::MAX);
    let last = field.right().saturating_sub(2).max(field.x);
    field.x.saturating_add(1).saturating_add(offset).min(last)
}

fn draw_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let field = Paragraph::new(value.to_string()).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(field, area);
}

/// Draw the current screen's listing
fn draw_listing(f: &mut Frame, app: &App, area: Rect) {
    let title = if app.loading {
        format!(" {} (đang tải...) ", app.nav.current().title())
    } else {
        format!(" {} ({}) ", app.nav.current().title(), app.rows.len())
    };

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let id = row.id.map(|id| format!("#{}", id)).unwrap_or_default();
            let line = format!("{:>6}  {:<40} {}", id, row.label, row.detail);

            let style = if i == app.cursor {
                Style::default()
                    .bg(accent(app))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(Span::styled(line, style)))
        })
        .collect();

    // Keep the cursor row on screen
    let visible = area.height.saturating_sub(2) as usize;
    let skip = (app.cursor + 1).saturating_sub(visible);
    let items: Vec<ListItem> = items.into_iter().skip(skip).collect();

    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

/// Draw the status bar
fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some((ref msg, ref level)) = app.status {
        let color = match level {
            StatusLevel::Info => Color::Blue,
            StatusLevel::Success => Color::Green,
            StatusLevel::Error => Color::Red,
        };
        (msg.clone(), Style::default().fg(color))
    } else {
        let hints = if app.nav.current() == Route::Login {
            "Tab:switch field │ Enter:submit │ Esc:quit"
        } else {
            "1-6:screen │ j↓ k↑ │ r:reload │ Ctrl-d:delete │ o:logout │ ?:help q:quit"
        };
        (hints.to_string(), Style::default().fg(Color::DarkGray))
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Draw a blocking dialog over the screen
fn draw_modal(f: &mut Frame, title: &str, message: &str, hint: &str) {
    let area = centered_rect(50, 5, f.area());
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray))),
    ];
    let dialog = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(dialog, area);
}

/// Selection colour, 24-bit when the terminal supports it
fn accent(app: &App) -> Color {
    accent_color(app.config.tui.true_color)
}

fn accent_color(true_color: bool) -> Color {
    if true_color {
        Color::Rgb(0x25, 0x63, 0xeb)
    } else {
        Color::Blue
    }
}

/// Rectangle of `width` x `height` centered in `area`, clamped to fit
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stays_inside_field() {
        let field = Rect::new(10, 4, 20, 3);
        assert_eq!(cursor_x(field, 0), 11);
        assert_eq!(cursor_x(field, 5), 16);
        assert_eq!(cursor_x(field, 500), 28);
        assert_eq!(cursor_x(field, 70_000), 28);

        let narrow = Rect::new(100, 0, 2, 3);
        assert_eq!(cursor_x(narrow, 3), 100);
    }

    #[test]
    fn test_accent_follows_true_color_setting() {
        assert!(matches!(accent_color(true), Color::Rgb(..)));
        assert_eq!(accent_color(false), Color::Blue);
    }
}
