use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::AppState;
use crate::model::{UserField, UserId, UserInput};
use crate::query::SortField;
use crate::ui::components::centered_rect;

/// Render the current page of users; header arrows show the active sort.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let header_cells = SortField::ALL.iter().map(|field| {
        let mut label = field.header().to_string();
        if app.query.sort_field == Some(*field) {
            label.push(' ');
            label.push_str(app.query.sort_order.arrow());
        }
        Cell::from(label)
    });
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let rows = app.view.items.iter().map(|u| {
        let style = if u.id.is_pending() {
            Style::default()
                .fg(app.theme.muted)
                .add_modifier(Modifier::ITALIC)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.first_name.clone()),
            Cell::from(u.last_name.clone()),
            Cell::from(u.email.clone()),
            Cell::from(u.department.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(9),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Percentage(40),
        Constraint::Percentage(30),
    ];

    let title = if app.store.loading() && app.store.users().is_empty() {
        "Users (loading...)".to_string()
    } else {
        format!("Users ({})", app.view.total_count)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .column_spacing(1);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

pub fn render_user_details(f: &mut Frame, area: Rect, app: &AppState) {
    let text = match app.selected_user() {
        Some(u) => {
            let origin = match u.id {
                UserId::Remote(_) => "server",
                UserId::Pending(_) => "local only (not confirmed by the server)",
            };
            format!(
                "ID: {}\nFirst name: {}\nLast name: {}\nEmail: {}\nDepartment: {}\nOrigin: {origin}",
                u.id, u.first_name, u.last_name, u.email, u.department
            )
        }
        None => "No user selected".to_string(),
    };
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

/// Add/edit form. Required fields are marked with `*`; errors sit under their field.
pub fn render_user_form(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    editing: Option<UserId>,
    input: &UserInput,
    focus: usize,
    errors: &[(UserField, String)],
) {
    let height = (UserField::ALL.len() as u16) + errors.len() as u16 + 6;
    let rect = centered_rect(60, height, area);
    let title = match editing {
        Some(id) => format!("Edit user {id}"),
        None => "New user".to_string(),
    };

    let mut lines: Vec<Line> = Vec::new();
    for (idx, field) in UserField::ALL.iter().enumerate() {
        let required = matches!(field, UserField::FirstName | UserField::Email);
        let label = format!(
            "{} {:<11}{} ",
            if idx == focus { "▶" } else { " " },
            field.label(),
            if required { "*" } else { " " }
        );
        let mut value = input.field(*field).to_string();
        if idx == focus {
            value.push('_');
        }
        let value_style = if idx == focus {
            Style::default().fg(app.theme.highlight_fg)
        } else {
            Style::default().fg(app.theme.text)
        };
        lines.push(Line::from(vec![Span::raw(label), Span::styled(value, value_style)]));
        for (_, message) in errors.iter().filter(|(err_field, _)| err_field == field) {
            lines.push(Line::styled(
                format!("               {message}"),
                Style::default().fg(app.theme.error),
            ));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Tab/Down next  Up previous  Enter save  Esc cancel",
        Style::default().fg(app.theme.muted),
    ));

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_delete_confirm(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    id: UserId,
    name: &str,
    selected: usize,
) {
    let rect = centered_rect(50, if id.is_pending() { 9 } else { 7 }, area);
    let yes = if selected == 0 { "[Yes]" } else { " Yes " };
    let no = if selected == 1 { "[No]" } else { " No  " };
    let mut body = format!("Delete user '{name}' (id {id})?\n\n  {yes}    {no}");
    if id.is_pending() {
        body.push_str("\n\nLocal record, the server is not contacted.");
    }
    let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
