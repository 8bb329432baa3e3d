//! UI rendering for the TUI.
//!
//! Handles layout and widget rendering using ratatui.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Tabs},
    Frame,
};

use super::Theme;
use crate::app::AppMode;
use crate::settings::SettingValue;
use crate::App;

const STATUS_HINTS: &str = "s start/stop • t token • ␣ toggle • r reset • / search • ? help";

/// Draw the main UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let theme = Theme::default();

    if app.mode == AppMode::Help {
        draw_help_screen(frame, &theme);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with state and token
            Constraint::Length(3), // Plugin tabs
            Constraint::Min(6),    // Settings + console
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);

    draw_header(frame, app, &theme, chunks[0]);
    draw_tabs(frame, app, &theme, chunks[1]);
    draw_settings_panel(frame, app, &theme, content_chunks[0]);
    draw_console(frame, app, &theme, content_chunks[1]);
    draw_status_bar(frame, app, &theme, chunks[3]);

    if app.mode == AppMode::ConfirmReset {
        draw_reset_overlay(frame, app, &theme);
    }
}

/// Service state, account, and the masked token field.
fn draw_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let state = app.state();
    let editing = app.mode == AppMode::EditingToken;

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.label()),
            Style::default()
                .bg(theme.state_color(state))
                .fg(theme.background)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    if let Some(user) = app.service.user() {
        spans.push(Span::styled(format!("{user} "), Style::default().fg(theme.text_dim)));
        spans.push(Span::styled("│ ", Style::default().fg(theme.border)));
    }

    let token = app.masked_token();
    spans.push(Span::styled("Token: ", Style::default().fg(theme.text_dim)));
    if token.is_empty() && !editing {
        spans.push(Span::styled("press t to enter", Style::default().fg(theme.text_muted)));
    } else {
        let style = if editing {
            Style::default().fg(theme.text).bg(theme.selected_bg)
        } else {
            Style::default().fg(theme.text)
        };
        spans.push(Span::styled(token.clone(), style));
    }

    let border = if editing { theme.primary } else { theme.border };
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" ctrlbot ")
            .title_style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
            .title_bottom(
                Line::from(format!(" {} controller(s) ", app.tabs.len().saturating_sub(1)))
                    .right_aligned(),
            ),
    );
    frame.render_widget(header, area);

    if editing {
        let offset = 1 + state.label().len() + 3 + "Token: ".len() + token.chars().count();
        let x = area.x + u16::try_from(offset).unwrap_or(area.width).min(area.width.saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let titles: Vec<Line> = app.tabs.iter().map(|t| Line::from(format!(" {t} "))).collect();
    let tabs = Tabs::new(titles)
        .select(app.selected_tab)
        .style(Style::default().fg(theme.text_dim))
        .highlight_style(
            Style::default().fg(theme.text).bg(theme.primary).add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled("│", Style::default().fg(theme.border)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(" Controllers "),
        );
    frame.render_widget(tabs, area);
}

/// Checkboxes for flags, text for everything else.
fn draw_settings_panel(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let settings = app.current_settings();
    let editing = app.mode == AppMode::EditingField;

    let items: Vec<ListItem> = settings
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let selected = i == app.selected_field;
            let line = match value {
                SettingValue::Bool(flag) => Line::from(vec![
                    Span::styled(
                        if *flag { "[x] " } else { "[ ] " },
                        Style::default().fg(if *flag { theme.secondary } else { theme.text_muted }),
                    ),
                    Span::styled(key.to_string(), Style::default().fg(theme.text)),
                ]),
                other => {
                    let mut spans = vec![
                        Span::styled(format!("{key}: "), Style::default().fg(theme.text_dim)),
                        Span::styled(other.as_text(), Style::default().fg(theme.text)),
                    ];
                    if selected && editing {
                        spans.push(Span::styled("▏", Style::default().fg(theme.primary)));
                    }
                    Line::from(spans)
                }
            };
            ListItem::new(line)
        })
        .collect();

    let title = app.current_tab().map(|t| format!(" {t} ")).unwrap_or_default();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if editing { theme.primary } else { theme.border }))
                .title(title)
                .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        )
        .highlight_style(Style::default().bg(theme.selected_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("▸ ");

    let mut state = ListState::default().with_selected(Some(app.selected_field));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Console, newest lines at the bottom.
fn draw_console(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let lines = app.visible_console();
    let height = usize::from(area.height.saturating_sub(2));
    let skip = lines.len().saturating_sub(height);

    let text: Vec<Line> = lines
        .iter()
        .skip(skip)
        .map(|line| {
            let color = if line.is_error { theme.error } else { theme.text };
            Line::from(vec![
                Span::styled(format!("{} ", line.timestamp), Style::default().fg(theme.text_muted)),
                Span::styled(line.text.as_str(), Style::default().fg(color)),
            ])
        })
        .collect();

    let searching = app.mode == AppMode::Search;
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if searching { theme.primary } else { theme.border }))
        .title(" Console ");
    if searching || !app.search.is_empty() {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" /{} ", app.search),
                Style::default().fg(theme.highlight),
            ))
            .right_aligned(),
        );
    }

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let line = match &app.status_message {
        Some(outcome) => {
            let (badge, color) =
                if outcome.success { (" OK ", theme.success) } else { (" ERR ", theme.error) };
            Line::from(vec![
                Span::styled(
                    badge,
                    Style::default().bg(color).fg(theme.background).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", outcome.message), Style::default().fg(theme.text_dim)),
            ])
        }
        None => Line::from(Span::styled(STATUS_HINTS, Style::default().fg(theme.text_muted))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_reset_overlay(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5;
    let popup_area = Rect::new(
        (area.width.saturating_sub(popup_width)) / 2,
        (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);

    let plugin = app.current_tab().unwrap_or_default();
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Restore {plugin} to its defaults? "),
            Style::default().fg(theme.text),
        )),
        Line::from(vec![
            Span::styled(" [y] Yes  ", Style::default().fg(theme.success)),
            Span::styled("[n] No", Style::default().fg(theme.text_muted)),
        ]),
    ];

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.warning))
            .title(" Reset Settings ")
            .title_style(Style::default().fg(theme.warning).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(theme.background)),
    );
    frame.render_widget(popup, popup_area);
}

fn draw_help_screen(frame: &mut Frame, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(2)])
        .split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled(
        " Keyboard Shortcuts ",
        Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.primary)));
    frame.render_widget(title, chunks[0]);

    let section = |name: &'static str| {
        Line::from(Span::styled(name, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
    };

    let lines = vec![
        section("Service"),
        Line::from(""),
        help_line("s", "Start or stop the bot", theme),
        help_line("t", "Edit the token (Enter starts)", theme),
        help_line("p", "List controllers", theme),
        help_line("u", "Rescan controller units", theme),
        Line::from(""),
        section("Settings"),
        Line::from(""),
        help_line("Tab / ← →", "Switch controller", theme),
        help_line("↑ / ↓", "Select setting", theme),
        help_line("Enter / Space", "Toggle flag or edit value", theme),
        help_line("Ctrl+U", "Clear the field being edited", theme),
        help_line("r", "Reset controller to defaults", theme),
        Line::from(""),
        section("Console"),
        Line::from(""),
        help_line("/", "Filter console lines", theme),
        help_line("c", "Clear console", theme),
        Line::from(""),
        section("General"),
        Line::from(""),
        help_line("?", "Show this help", theme),
        help_line("q / Esc", "Quit (stops the bot)", theme),
        help_line("Ctrl+C", "Quit", theme),
    ];

    let content = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .padding(Padding::horizontal(2)),
    );
    frame.render_widget(content, chunks[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" Press ", Style::default().fg(theme.text_dim)),
        Span::styled(
            "Esc",
            Style::default().fg(theme.text).bg(theme.selected_bg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" to close ", Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[2]);
}

fn help_line<'a>(key: &'a str, description: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {:16}", key),
            Style::default().fg(theme.secondary).add_modifier(Modifier::BOLD),
        ),
        Span::styled(description, Style::default().fg(theme.text)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    fn render(app: &App) -> String {
        let (width, height) = (100, 30);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();
        for y in 0..height {
            let mut line = String::new();
            for x in 0..width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    #[test]
    fn test_main_screen_shows_tabs_and_settings() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        app.next_tab();

        let screen = render(&app);
        assert!(screen.contains("ControllerAdmin"));
        assert!(screen.contains("ControllerBot"));
        assert!(screen.contains("[x] enabled"));
        assert!(screen.contains("response: Pong!"));
        assert!(screen.contains("Stopped"));
    }

    #[test]
    fn test_token_is_masked() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());
        app.token_input = "secret-token".to_string();

        let screen = render(&app);
        assert!(!screen.contains("secret-token"));
        assert!(screen.contains("************"));
    }

    #[test]
    fn test_reset_overlay_and_help() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = App::new_test(dir.path(), rt.handle().clone());

        app.ask_reset();
        assert!(render(&app).contains("Restore ControllerAdmin to its defaults?"));

        app.cancel_reset();
        app.show_help();
        assert!(render(&app).contains("Keyboard Shortcuts"));
    }
}
