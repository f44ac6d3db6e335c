pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());
    let columns = if app.show_keybinds {
        vec![
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
        ]
    } else {
        vec![Constraint::Percentage(70), Constraint::Percentage(30)]
    };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(root[1]);

    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.search_input),
        _ if !app.query.search_term.is_empty() => format!("  Search: {}", app.query.search_term),
        _ => String::new(),
    };
    let p = Paragraph::new(format!(
        "{}{prompt}  | /: search  f: filter  n: new  e: edit  d: delete  1-5: sort  ?: help  q: quit",
        app.base_url
    ))
    .block(
        Block::default()
            .title("usrdir-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    users::render_users_table(f, body[0], app);
    users::render_user_details(f, body[1], app);
    if app.show_keybinds {
        components::render_keybinds_panel(f, body[2], app);
    }

    components::render_pagination_bar(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    if app.modal.is_some() {
        let area = f.area();
        render_modal(f, area, app);
    }
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = app.modal.as_ref() else {
        return;
    };
    match state {
        ModalState::UserForm {
            editing,
            input,
            focus,
            errors,
        } => users::render_user_form(f, area, app, *editing, input, *focus, errors),
        ModalState::DeleteConfirm { id, name, selected } => {
            users::render_delete_confirm(f, area, app, *id, name, *selected)
        }
        ModalState::FilterMenu { .. } => components::render_filter_modal(f, area, app, state),
        ModalState::Info { message } => components::render_info_modal(f, area, app, message),
        ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
    }
}
