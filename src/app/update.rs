//! Event loop and key handling.
//!
//! Keys are translated into store/query changes. Remote calls go out over the
//! bridge and come back as [`RemoteEvent`]s, which are drained at the top of
//! every frame by [`apply_remote_event`].
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};
use crate::bridge::{Bridge, RemoteCommand, RemoteEvent};
use crate::error::{Error, RemoteError};
use crate::model::{UserField, UserId, UserInput};
use crate::store::ActionTag;
use crate::ui;
use crate::validate;

/// Whether the loop keeps going after a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    bridge: &Bridge,
) -> Result<()> {
    request_fetch(app, &bridge.commands);

    loop {
        drain_events(app, &bridge.events);

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && handle_key(app, key, &bridge.commands) == Flow::Quit
        {
            break;
        }
    }

    Ok(())
}

pub fn handle_key(app: &mut AppState, key: KeyEvent, commands: &Sender<RemoteCommand>) -> Flow {
    match app.input_mode {
        InputMode::Normal => return handle_normal_key(app, key, commands),
        InputMode::Search => handle_search_key(app, key),
        InputMode::Modal => handle_modal_key(app, key, commands),
    }
    Flow::Continue
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent, commands: &Sender<RemoteCommand>) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::Ignore => {}
        KeyAction::OpenFilterMenu => app.open_modal(ModalState::FilterMenu {
            filters: app.query.filters.clone(),
            focus: 0,
        }),
        KeyAction::OpenHelp => app.open_modal(ModalState::Help { scroll: 0 }),
        KeyAction::StartSearch => {
            app.search_input = app.query.search_term.clone();
            app.input_mode = InputMode::Search;
        }
        KeyAction::NewUser => {
            if ensure_idle(app) {
                app.open_modal(ModalState::UserForm {
                    editing: None,
                    input: UserInput::default(),
                    focus: 0,
                    errors: Vec::new(),
                });
            }
        }
        KeyAction::EditSelection => {
            if let Some(user) = app.selected_user().cloned()
                && ensure_idle(app)
            {
                app.open_modal(ModalState::UserForm {
                    editing: Some(user.id),
                    input: user.to_input(),
                    focus: 0,
                    errors: Vec::new(),
                });
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(user) = app.selected_user().cloned()
                && ensure_idle(app)
            {
                let name = format!("{} {}", user.first_name, user.last_name)
                    .trim()
                    .to_string();
                app.open_modal(ModalState::DeleteConfirm {
                    id: user.id,
                    name,
                    selected: 1,
                });
            }
        }
        KeyAction::Refresh => request_fetch(app, commands),
        KeyAction::SortBy(field) => app.sort_by(field),
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::MoveUp => app.move_up(),
        KeyAction::MoveDown => app.move_down(),
        KeyAction::PrevPage => app.prev_page(),
        KeyAction::NextPage => app.next_page(),
        KeyAction::FirstPage => app.go_to_page(1),
        KeyAction::LastPage => app.last_page(),
        KeyAction::CyclePageSize => app.cycle_page_size(),
    }
    Flow::Continue
}

/// The search term is applied on every keystroke.
fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.search_input.clear();
            app.apply_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.apply_search();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_input.push(c);
            app.apply_search();
        }
        _ => {}
    }
}

fn is_text(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

fn next_focus(focus: usize, code: KeyCode) -> Option<usize> {
    let n = UserField::ALL.len();
    match code {
        KeyCode::Tab | KeyCode::Down => Some((focus + 1) % n),
        KeyCode::BackTab | KeyCode::Up => Some((focus + n - 1) % n),
        _ => None,
    }
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent, commands: &Sender<RemoteCommand>) {
    let Some(modal) = app.modal.take() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::UserForm {
            editing,
            mut input,
            mut focus,
            mut errors,
        } => {
            let field = UserField::ALL[focus % UserField::ALL.len()];
            match key.code {
                KeyCode::Esc => return app.close_modal(),
                KeyCode::Enter => return submit_form(app, editing, input, commands),
                KeyCode::Backspace => {
                    input.field_mut(field).pop();
                    errors.retain(|(f, _)| *f != field);
                }
                code => {
                    if let Some(next) = next_focus(focus, code) {
                        focus = next;
                    } else if let Some(c) = is_text(&key) {
                        input.field_mut(field).push(c);
                        errors.retain(|(f, _)| *f != field);
                    }
                }
            }
            app.modal = Some(ModalState::UserForm {
                editing,
                input,
                focus,
                errors,
            });
        }
        ModalState::FilterMenu {
            mut filters,
            mut focus,
        } => {
            let field = UserField::ALL[focus % UserField::ALL.len()];
            match key.code {
                KeyCode::Esc => return app.close_modal(),
                KeyCode::Enter => {
                    app.close_modal();
                    return app.apply_filters(filters);
                }
                KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.close_modal();
                    return app.clear_filters();
                }
                KeyCode::Backspace => {
                    let mut value = filters.get(field).to_string();
                    value.pop();
                    filters.set(field, value);
                }
                code => {
                    if let Some(next) = next_focus(focus, code) {
                        focus = next;
                    } else if let Some(c) = is_text(&key) {
                        let value = format!("{}{}", filters.get(field), c);
                        filters.set(field, value);
                    }
                }
            }
            app.modal = Some(ModalState::FilterMenu { filters, focus });
        }
        ModalState::DeleteConfirm { id, name, mut selected } => match key.code {
            KeyCode::Esc | KeyCode::Char('n') => app.close_modal(),
            KeyCode::Char('y') => {
                app.close_modal();
                start_delete(app, id, commands);
            }
            KeyCode::Enter => {
                app.close_modal();
                if selected == 0 {
                    start_delete(app, id, commands);
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                selected = 1 - selected.min(1);
                app.modal = Some(ModalState::DeleteConfirm { id, name, selected });
            }
            _ => app.modal = Some(ModalState::DeleteConfirm { id, name, selected }),
        },
        ModalState::Help { scroll } => {
            let scroll = match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
                    return app.close_modal();
                }
                KeyCode::Up | KeyCode::Char('k') => scroll.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => scroll.saturating_add(1),
                KeyCode::PageUp => scroll.saturating_sub(10),
                KeyCode::PageDown => scroll.saturating_add(10),
                _ => scroll,
            };
            app.modal = Some(ModalState::Help { scroll });
        }
        ModalState::Info { message } => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_modal(),
            _ => app.modal = Some(ModalState::Info { message }),
        },
    }
}

/// Show a busy notice unless no mutation is in flight.
fn ensure_idle(app: &mut AppState) -> bool {
    let action = app.store.action();
    if action.is_idle() {
        return true;
    }
    app.show_info(Error::Busy(action.label()).to_string());
    false
}

/// Validate the form; on failure keep it open with per-field messages.
fn submit_form(
    app: &mut AppState,
    editing: Option<UserId>,
    input: UserInput,
    commands: &Sender<RemoteCommand>,
) {
    match validate::validate_input(&input) {
        Ok(()) => {
            app.close_modal();
            match editing {
                None => start_create(app, input, commands),
                Some(id) => start_update(app, id, input, commands),
            }
        }
        Err(Error::ValidationFailed(errs)) => {
            let errors: Vec<(UserField, String)> = UserField::ALL
                .into_iter()
                .filter_map(|f| validate::field_message(&errs, f).map(|m| (f, m)))
                .collect();
            let focus = errors
                .first()
                .and_then(|(f, _)| UserField::ALL.iter().position(|x| x == f))
                .unwrap_or(0);
            app.open_modal(ModalState::UserForm {
                editing,
                input,
                focus,
                errors,
            });
        }
        Err(other) => app.show_info(other.to_string()),
    }
}

pub fn request_fetch(app: &mut AppState, commands: &Sender<RemoteCommand>) {
    if let Err(err) = app.store.begin_fetch() {
        debug!(error = %err, "refresh ignored");
        return;
    }
    dispatch(app, RemoteCommand::FetchAll, commands);
}

pub fn start_create(app: &mut AppState, input: UserInput, commands: &Sender<RemoteCommand>) {
    if let Err(err) = app.store.begin(ActionTag::Adding) {
        return app.show_info(err.to_string());
    }
    dispatch(app, RemoteCommand::Create { input }, commands);
}

/// Records without a remote id are updated locally.
pub fn start_update(
    app: &mut AppState,
    id: UserId,
    input: UserInput,
    commands: &Sender<RemoteCommand>,
) {
    if let Err(err) = app.store.begin(ActionTag::Editing) {
        return app.show_info(err.to_string());
    }
    let Some(remote_id) = id.remote() else {
        let outcome = app.store.finish_update(id, input, Ok(()));
        return settle(app, outcome);
    };
    dispatch(
        app,
        RemoteCommand::Update {
            id,
            remote_id,
            input,
        },
        commands,
    );
}

/// Records without a remote id are removed locally.
pub fn start_delete(app: &mut AppState, id: UserId, commands: &Sender<RemoteCommand>) {
    if let Err(err) = app.store.begin(ActionTag::Deleting) {
        return app.show_info(err.to_string());
    }
    let Some(remote_id) = id.remote() else {
        let outcome = app.store.finish_remove(id, Ok(()));
        return settle(app, outcome);
    };
    dispatch(app, RemoteCommand::Delete { id, remote_id }, commands);
}

/// Hand a begun command to the worker. Mutations are remembered until answered
/// so a dead worker can still be settled.
fn dispatch(app: &mut AppState, cmd: RemoteCommand, commands: &Sender<RemoteCommand>) {
    let tracked = match &cmd {
        RemoteCommand::FetchAll => None,
        mutation => Some(mutation.clone()),
    };
    match commands.send(cmd) {
        Ok(()) => {
            if tracked.is_some() {
                app.in_flight = tracked;
            }
        }
        Err(unsent) => fail_command(app, unsent.into_inner(), RemoteError::Disconnected),
    }
}

/// Run the finish step matching `cmd` with `err` as the remote result.
fn fail_command(app: &mut AppState, cmd: RemoteCommand, err: RemoteError) {
    let outcome = match cmd {
        RemoteCommand::FetchAll => app.store.finish_fetch(Err(err)).map(|_| ()),
        RemoteCommand::Create { input } => app.store.finish_create(input, Err(err)).map(|_| ()),
        RemoteCommand::Update { id, input, .. } => app.store.finish_update(id, input, Err(err)),
        RemoteCommand::Delete { id, .. } => app.store.finish_remove(id, Err(err)),
    };
    settle(app, outcome);
}

/// Settle everything still waiting on a worker that is gone.
fn abandon_in_flight(app: &mut AppState) {
    if app.store.loading() {
        fail_command(app, RemoteCommand::FetchAll, RemoteError::Disconnected);
    }
    if let Some(cmd) = app.in_flight.take() {
        fail_command(app, cmd, RemoteError::Disconnected);
    }
}

/// Apply every queued worker event. A disconnected channel means the worker
/// died and nothing sent to it will be answered.
pub fn drain_events(app: &mut AppState, events: &Receiver<RemoteEvent>) {
    loop {
        match events.try_recv() {
            Ok(ev) => apply_remote_event(app, ev),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                if app.store.loading() || app.in_flight.is_some() {
                    warn!("network worker exited with work outstanding");
                    abandon_in_flight(app);
                }
                break;
            }
        }
    }
}

/// Fold a worker result into the store and refresh the view.
pub fn apply_remote_event(app: &mut AppState, ev: RemoteEvent) {
    let outcome = match ev {
        RemoteEvent::Fetched(result) => app.store.finish_fetch(result).map(|_| ()),
        RemoteEvent::Created { input, result } => {
            app.in_flight = None;
            app.store.finish_create(input, result).map(|_| ())
        }
        RemoteEvent::Updated { id, input, result } => {
            app.in_flight = None;
            app.store.finish_update(id, input, result)
        }
        RemoteEvent::Deleted { id, result } => {
            app.in_flight = None;
            app.store.finish_remove(id, result)
        }
        RemoteEvent::WorkerFailed(message) => {
            abandon_in_flight(app);
            app.show_info(message);
            Ok(())
        }
    };
    settle(app, outcome);
}

/// Fetch failures stay in the status bar; other failures open a notice.
fn settle(app: &mut AppState, outcome: crate::error::Result<()>) {
    match outcome {
        Ok(()) | Err(Error::FetchFailed(_)) => {}
        Err(err) => app.show_info(err.to_string()),
    }
    app.refresh_view();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::model::RemoteUser;
    use crate::query::{Filters, PageSize};
    use crossbeam_channel::unbounded;

    fn app() -> AppState {
        AppState::new("http://test", PageSize::Ten, Theme::mocha(), Keymap::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AppState, text: &str, tx: &Sender<RemoteCommand>) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)), tx);
        }
    }

    #[test]
    fn invalid_form_stays_open_with_errors() {
        let (tx, rx) = unbounded();
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('n')), &tx);
        handle_key(&mut app, press(KeyCode::Enter), &tx);
        match &app.modal {
            Some(ModalState::UserForm { errors, .. }) => {
                assert!(errors.iter().any(|(f, _)| *f == UserField::FirstName));
                assert!(errors.iter().any(|(f, _)| *f == UserField::Email));
            }
            other => panic!("form should stay open, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert!(app.store.action().is_idle());
    }

    #[test]
    fn valid_form_sends_create_and_result_lands_first() {
        let (tx, rx) = unbounded();
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('n')), &tx);
        type_text(&mut app, "Ann", &tx);
        handle_key(&mut app, press(KeyCode::Tab), &tx);
        handle_key(&mut app, press(KeyCode::Tab), &tx);
        type_text(&mut app, "ann@example.com", &tx);
        handle_key(&mut app, press(KeyCode::Enter), &tx);

        assert_eq!(app.store.action(), ActionTag::Adding);
        let Ok(RemoteCommand::Create { input }) = rx.try_recv() else {
            panic!("expected a create command");
        };
        assert_eq!(input.email, "ann@example.com");

        apply_remote_event(
            &mut app,
            RemoteEvent::Created {
                input,
                result: Ok(RemoteUser {
                    id: Some(11),
                    ..Default::default()
                }),
            },
        );
        assert!(app.store.action().is_idle());
        assert_eq!(app.view.items[0].first_name, "Ann");
        assert!(app.modal.is_none());
    }

    #[test]
    fn search_applies_while_typing() {
        let (tx, _rx) = unbounded();
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('/')), &tx);
        type_text(&mut app, "ann", &tx);
        assert_eq!(app.input_mode, InputMode::Search);
        assert_eq!(app.query.search_term, "ann");
        handle_key(&mut app, press(KeyCode::Esc), &tx);
        assert_eq!(app.query.search_term, "");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn disconnected_worker_reports_and_clears_tag() {
        let (tx, rx) = unbounded::<RemoteCommand>();
        drop(rx);
        let mut app = app();
        start_create(&mut app, UserInput::new("A", "", "a@x.io", ""), &tx);
        assert!(app.store.action().is_idle());
        assert!(matches!(app.modal, Some(ModalState::Info { .. })));
        assert!(app.store.users().is_empty());
    }

    fn with_one_user(app: &mut AppState) {
        app.store.begin_fetch().unwrap();
        apply_remote_event(
            app,
            RemoteEvent::Fetched(Ok(vec![RemoteUser {
                id: Some(1),
                name: Some("Leanne Graham".into()),
                ..Default::default()
            }])),
        );
    }

    #[test]
    fn form_and_delete_refused_while_mutation_in_flight() {
        let (tx, rx) = unbounded();
        let mut app = app();
        with_one_user(&mut app);
        app.store.begin(ActionTag::Adding).unwrap();

        for key in ['n', 'd', 'e'] {
            handle_key(&mut app, press(KeyCode::Char(key)), &tx);
            assert!(
                matches!(app.modal, Some(ModalState::Info { .. })),
                "key {key} opened {:?}",
                app.modal
            );
            handle_key(&mut app, press(KeyCode::Esc), &tx);
            assert!(app.modal.is_none());
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(app.store.action(), ActionTag::Adding);
    }

    #[test]
    fn worker_failure_ends_loading_and_mutation() {
        let (tx, rx) = unbounded();
        let mut app = app();
        request_fetch(&mut app, &tx);
        start_create(&mut app, UserInput::new("A", "", "a@x.io", ""), &tx);
        assert_eq!(rx.try_iter().count(), 2);
        assert!(app.in_flight.is_some());

        apply_remote_event(&mut app, RemoteEvent::WorkerFailed("no runtime".into()));
        assert!(!app.store.loading());
        assert!(app.store.action().is_idle());
        assert!(app.in_flight.is_none());
        match &app.modal {
            Some(ModalState::Info { message }) => assert_eq!(message, "no runtime"),
            other => panic!("expected a notice, got {other:?}"),
        }
    }

    #[test]
    fn dropped_worker_settles_outstanding_delete() {
        let (tx, rx) = unbounded();
        let (ev_tx, ev_rx) = unbounded::<RemoteEvent>();
        let mut app = app();
        with_one_user(&mut app);
        start_delete(&mut app, UserId::Remote(1), &tx);
        assert_eq!(app.store.action(), ActionTag::Deleting);
        assert!(matches!(rx.try_recv(), Ok(RemoteCommand::Delete { .. })));

        drop(ev_tx);
        drain_events(&mut app, &ev_rx);
        assert!(app.store.action().is_idle());
        assert!(app.in_flight.is_none());
        assert!(app.store.get(UserId::Remote(1)).is_some());
        assert!(matches!(app.modal, Some(ModalState::Info { .. })));

        // Later frames see the same disconnect and leave the state alone.
        app.close_modal();
        drain_events(&mut app, &ev_rx);
        assert!(app.modal.is_none());
    }

    #[test]
    fn answered_mutation_is_forgotten() {
        let (tx, _rx) = unbounded();
        let mut app = app();
        with_one_user(&mut app);
        start_delete(&mut app, UserId::Remote(1), &tx);
        apply_remote_event(
            &mut app,
            RemoteEvent::Deleted {
                id: UserId::Remote(1),
                result: Ok(()),
            },
        );
        assert!(app.in_flight.is_none());
        assert!(app.store.users().is_empty());
    }

    #[test]
    fn filter_dialog_reset_clears_filters() {
        let (tx, _rx) = unbounded();
        let mut app = app();
        let mut filters = Filters::default();
        filters.set(UserField::Department, "Sales");
        app.apply_filters(filters);
        handle_key(&mut app, press(KeyCode::Char('f')), &tx);
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL),
            &tx,
        );
        assert!(app.query.filters.is_empty());
        assert!(app.modal.is_none());
    }
}
