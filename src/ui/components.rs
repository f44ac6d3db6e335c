//! Shared UI components (status bar, pagination, modal helpers).
//!
//! Contains small building blocks reused by the users screen.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, ModalState};
use crate::model::UserField;
use crate::query::{SortField, page_window};
use std::collections::{BTreeMap, BTreeSet};

/// Render the bottom status bar with mode, activity and active query.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let mut spans = vec![Span::raw(format!(" mode: {mode}"))];
    if app.store.loading() {
        spans.push(Span::raw("  loading users..."));
    }
    let action = app.store.action();
    if !action.is_idle() {
        spans.push(Span::styled(
            format!("  {}", action.label()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    let chips: Vec<String> = app
        .query
        .filters
        .active()
        .into_iter()
        .map(|(field, value)| format!("{}={}", field.key(), value))
        .collect();
    if !chips.is_empty() {
        spans.push(Span::raw(format!("  filters:[{}]", chips.join(","))));
    }
    if !app.query.search_term.is_empty() {
        spans.push(Span::raw(format!("  search:\"{}\"", app.query.search_term)));
    }
    if let Some(err) = app.store.error() {
        spans.push(Span::styled(
            format!("  error: {err} (r to retry)"),
            Style::default().fg(app.theme.error),
        ));
    }
    let p = Paragraph::new(Line::from(spans)).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Render "Showing X to Y of Z", the page window and the page size.
pub fn render_pagination_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let view = &app.view;
    let mut spans: Vec<Span> = Vec::new();
    if view.total_count == 0 {
        spans.push(Span::raw(" No users"));
    } else {
        let (start, end) = view.range();
        spans.push(Span::raw(format!(
            " Showing {start} to {end} of {}   ",
            view.total_count
        )));
        let muted = Style::default().fg(app.theme.muted);
        spans.push(Span::styled("‹ ", if view.page > 1 { Style::default() } else { muted }));
        for n in page_window(view.page, view.total_pages) {
            if n == view.page {
                spans.push(Span::styled(
                    format!("[{n}]"),
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(format!(" {n} ")));
            }
        }
        spans.push(Span::styled(
            " ›",
            if view.page < view.total_pages {
                Style::default()
            } else {
                muted
            },
        ));
    }
    spans.push(Span::raw(format!("   rows/page: {}", app.query.page_size.get())));
    let p = Paragraph::new(Line::from(spans)).style(Style::default().fg(app.theme.text));
    f.render_widget(p, area);
}

fn action_label(action: KeyAction) -> Option<(&'static str, &'static str)> {
    let entry = match action {
        KeyAction::Quit => ("General", "Quit"),
        KeyAction::OpenFilterMenu => ("General", "Filter"),
        KeyAction::StartSearch => ("General", "Search"),
        KeyAction::OpenHelp => ("General", "Help"),
        KeyAction::Refresh => ("General", "Refresh"),
        KeyAction::ToggleKeybindsPane => ("General", "Toggle keybindings"),
        KeyAction::NewUser => ("Users", "New user"),
        KeyAction::EditSelection => ("Users", "Edit user"),
        KeyAction::DeleteSelection => ("Users", "Delete user"),
        KeyAction::SortBy(SortField::Id) => ("Sorting", "By id"),
        KeyAction::SortBy(SortField::FirstName) => ("Sorting", "By first name"),
        KeyAction::SortBy(SortField::LastName) => ("Sorting", "By last name"),
        KeyAction::SortBy(SortField::Email) => ("Sorting", "By email"),
        KeyAction::SortBy(SortField::Department) => ("Sorting", "By department"),
        KeyAction::MoveUp => ("Navigation", "Move up"),
        KeyAction::MoveDown => ("Navigation", "Move down"),
        KeyAction::PrevPage => ("Navigation", "Previous page"),
        KeyAction::NextPage => ("Navigation", "Next page"),
        KeyAction::FirstPage => ("Navigation", "First page"),
        KeyAction::LastPage => ("Navigation", "Last page"),
        KeyAction::CyclePageSize => ("Navigation", "Rows per page"),
        KeyAction::Ignore => return None,
    };
    Some(entry)
}

/// Render the right-side keybinds viewer with grouped sections.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let mut sections: BTreeMap<&'static str, BTreeMap<&'static str, BTreeSet<String>>> =
        BTreeMap::new();
    for ((mods, code), action) in app.keymap.all_bindings() {
        if let Some((section, label)) = action_label(action) {
            sections
                .entry(section)
                .or_default()
                .entry(label)
                .or_default()
                .insert(Keymap::format_key(mods, code));
        }
    }

    let col1_w = sections
        .values()
        .flat_map(|m| m.keys())
        .map(|k| k.len())
        .max()
        .unwrap_or(0)
        .max("Cancel / Close".len())
        .min((inner.width as usize).saturating_sub(11));

    let row = |label: &str, value: String| -> Line<'static> {
        let lbl: String = label.chars().take(col1_w).collect();
        Line::from(vec![
            Span::raw(format!("  {:>width$} │ ", lbl, width = col1_w)),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    };

    let mut lines: Vec<Line> = Vec::new();
    for (section, entries) in &sections {
        lines.push(Line::from(Span::styled(
            format!("{section}:"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (label, keys) in entries {
            lines.push(row(*label, keys.iter().cloned().collect::<Vec<_>>().join(", ")));
        }
        lines.push(Line::raw(""));
    }
    lines.push(Line::from(Span::styled(
        "Dialogs:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (label, value) in [
        ("Cancel / Close", "Esc"),
        ("Next field", "Tab, Down"),
        ("Confirm / Apply", "Enter"),
        ("Reset filters", "Ctrl+r"),
    ] {
        lines.push(row(label, value.to_string()));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Width and height for an info dialog; long text wraps and is capped by `area`.
fn info_modal_size(message: &str, area: Rect) -> (u16, u16) {
    let max_w = area.width.saturating_sub(6).max(30);
    let width = 50u16.min(max_w);
    let len = u16::try_from(message.len()).unwrap_or(u16::MAX);
    let approx_lines = (len / width.saturating_sub(4).max(10)).max(1);
    let max_h = area.height.saturating_sub(6).max(5);
    let height = approx_lines.saturating_add(4).min(max_h).max(5);
    (width, height)
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, message: &str) {
    let (width, height) = info_modal_size(message, area);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Info")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

fn help_line(label: &str, keys: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
    ])
}

/// Render the help modal; key names come from the active keymap.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(50);
    let height = 22u16.min(area.height.saturating_sub(4)).max(12);
    let rect = centered_rect(width, height, area);
    let keys = |action: KeyAction| app.keymap.keys_for(action).join(" / ");

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            format!("Users of {}", app.base_url),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        help_line("Move", format!("{} / {}", keys(KeyAction::MoveUp), keys(KeyAction::MoveDown))),
        help_line(
            "Pages",
            format!(
                "{} / {}, first {}, last {}",
                keys(KeyAction::PrevPage),
                keys(KeyAction::NextPage),
                keys(KeyAction::FirstPage),
                keys(KeyAction::LastPage)
            ),
        ),
        help_line("Rows per page (10/25/50/100)", keys(KeyAction::CyclePageSize)),
        help_line("Search (applies while typing; Esc clears)", keys(KeyAction::StartSearch)),
        help_line("Filter by column", keys(KeyAction::OpenFilterMenu)),
        Line::raw(""),
        Line::from(Span::styled(
            "Sorting",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for field in SortField::ALL {
        lines.push(help_line(field.header(), keys(KeyAction::SortBy(field))));
    }
    lines.push(Line::raw("Pressing the same column again flips the order."));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Users",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(help_line("Create user", keys(KeyAction::NewUser)));
    lines.push(help_line("Edit user", keys(KeyAction::EditSelection)));
    lines.push(help_line("Delete user", keys(KeyAction::DeleteSelection)));
    lines.push(help_line("Reload from server", keys(KeyAction::Refresh)));
    lines.push(Line::raw(
        "Rows marked local-N were never confirmed by the server and change locally only.",
    ));
    lines.push(Line::raw(""));
    lines.push(help_line("Keybindings panel", keys(KeyAction::ToggleKeybindsPane)));
    lines.push(help_line("Quit", keys(KeyAction::Quit)));
    lines.push(help_line("Close help", "Esc / Enter".to_string()));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Render the column filter dialog.
pub fn render_filter_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::FilterMenu { filters, focus } = state {
        let width = 56u16.min(area.width.saturating_sub(4)).max(40);
        let height = 10u16;
        let rect = centered_rect(width, height, area);
        let mut lines: Vec<Line> = UserField::ALL
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let marker = if idx == *focus { "▶" } else { " " };
                let text = format!("{marker} {:<12} {}", field.label(), filters.get(*field));
                if idx == *focus {
                    Line::styled(text, Style::default().fg(app.theme.highlight_fg))
                } else {
                    Line::raw(text)
                }
            })
            .collect();
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Enter apply  Ctrl+r reset  Esc cancel",
            Style::default().fg(app.theme.muted),
        ));
        let p = Paragraph::new(lines).block(
            Block::default()
                .title("Filter users")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
