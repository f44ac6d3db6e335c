//! Application state types and entry glue.
//!
//! Defines the TUI state: the user store, the query state and the derived
//! view, plus modal dialogs and theming. The event loop lives in `update`
//! (re-exported as `run`).
//!
pub mod keymap;
pub mod update;

use ratatui::style::Color;
use ratatui::widgets::TableState;

use crate::bridge::RemoteCommand;
use crate::model::{LocalUser, UserField, UserId, UserInput};
use crate::query::{Filters, PageSize, QueryState, SortField, ViewResult, compute_view};
use crate::store::UserStore;
use keymap::Keymap;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Theme {
    /// Dark default theme.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::Red,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    fn slots(&mut self) -> [(&'static str, &mut Color); 11] {
        [
            ("text", &mut self.text),
            ("muted", &mut self.muted),
            ("title", &mut self.title),
            ("border", &mut self.border),
            ("header_bg", &mut self.header_bg),
            ("header_fg", &mut self.header_fg),
            ("status_bg", &mut self.status_bg),
            ("status_fg", &mut self.status_fg),
            ("highlight_fg", &mut self.highlight_fg),
            ("highlight_bg", &mut self.highlight_bg),
            ("error", &mut self.error),
        ]
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut theme = Self::mocha();

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (key.trim(), val.trim());
            let Some(color) = Self::parse_color(val) else {
                continue;
            };
            for (name, slot) in theme.slots() {
                if name == key {
                    *slot = color;
                }
            }
        }

        Some(theme)
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(&lower);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
            Color::Reset => "reset".to_string(),
            Color::Black => "#000000".to_string(),
            Color::Red => "#FF0000".to_string(),
            Color::Yellow => "#FFFF00".to_string(),
            Color::Cyan => "#00FFFF".to_string(),
            Color::Gray => "#B3B3B3".to_string(),
            Color::DarkGray => "#4D4D4D".to_string(),
            Color::White => "#FFFFFF".to_string(),
            // Other named colors have no stable hex; write the safe default.
            _ => "reset".to_string(),
        }
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrdir-manager theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut copy = *self;
        for (name, color) in copy.slots() {
            let _ = writeln!(&mut buf, "{} = {}", name, Self::color_to_str(*color));
        }
        std::fs::write(path, buf)
    }

    /// Load the theme from `path` or the per-user config directory; write
    /// defaults to `path` when neither exists.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        if let Some(existing) = crate::config::config_file_read_path("theme.conf") {
            return Self::from_file(&existing).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(err) = t.write_file(path) {
            tracing::debug!(%path, error = %err, "could not write default theme");
        }
        t
    }
}

/// Modal dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    /// Add (`editing == None`) or edit form.
    UserForm {
        editing: Option<UserId>,
        input: UserInput,
        focus: usize,
        errors: Vec<(UserField, String)>,
    },
    FilterMenu {
        filters: Filters,
        focus: usize,
    },
    DeleteConfirm {
        id: UserId,
        name: String,
        selected: usize,
    },
    Info {
        message: String,
    },
    Help {
        scroll: u16,
    },
}

pub struct AppState {
    pub store: UserStore,
    pub query: QueryState,
    pub view: ViewResult,
    /// Row index within `view.items`.
    pub selected: usize,
    pub table_state: TableState,
    pub input_mode: InputMode,
    pub search_input: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub show_keybinds: bool,
    pub base_url: String,
    /// Mutation sent to the worker and not yet answered.
    pub in_flight: Option<RemoteCommand>,
}

impl AppState {
    pub fn new(base_url: impl Into<String>, page_size: PageSize, theme: Theme, keymap: Keymap) -> Self {
        Self {
            store: UserStore::new(),
            query: QueryState::with_page_size(page_size),
            view: ViewResult::default(),
            selected: 0,
            table_state: TableState::default(),
            input_mode: InputMode::Normal,
            search_input: String::new(),
            theme,
            keymap,
            modal: None,
            show_keybinds: false,
            base_url: base_url.into(),
            in_flight: None,
        }
    }

    /// Recompute the visible page from the store and query state.
    ///
    /// A page past the end (after deletes or a refresh) snaps to the last page.
    pub fn refresh_view(&mut self) {
        self.view = compute_view(self.store.users(), &self.query);
        if self.view.total_pages > 0 && self.query.page > self.view.total_pages {
            self.query.go_to_page(self.view.total_pages);
            self.view = compute_view(self.store.users(), &self.query);
        }
        self.selected = self.selected.min(self.view.items.len().saturating_sub(1));
        self.table_state.select(if self.view.items.is_empty() {
            None
        } else {
            Some(self.selected)
        });
    }

    pub fn selected_user(&self) -> Option<&LocalUser> {
        self.view.items.get(self.selected)
    }

    pub fn show_info(&mut self, message: impl Into<String>) {
        self.modal = Some(ModalState::Info {
            message: message.into(),
        });
        self.input_mode = InputMode::Modal;
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.refresh_view();
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.view.items.len() {
            self.selected += 1;
        }
        self.refresh_view();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.query.go_to_page(page);
        self.selected = 0;
        self.refresh_view();
    }

    pub fn next_page(&mut self) {
        if self.query.page < self.view.total_pages {
            self.go_to_page(self.query.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.query.page > 1 {
            self.go_to_page(self.query.page - 1);
        }
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.view.total_pages.max(1));
    }

    pub fn cycle_page_size(&mut self) {
        self.query.set_page_size(self.query.page_size.next());
        self.selected = 0;
        self.refresh_view();
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.query.sort_by(field);
        self.refresh_view();
    }

    pub fn apply_search(&mut self) {
        self.query.search(self.search_input.clone());
        self.selected = 0;
        self.refresh_view();
    }

    pub fn apply_filters(&mut self, filters: Filters) {
        let partial = UserField::ALL.map(|f| (f, filters.get(f).to_string()));
        self.query.set_filters(partial);
        self.selected = 0;
        self.refresh_view();
    }

    pub fn clear_filters(&mut self) {
        self.query.clear_filters();
        self.selected = 0;
        self.refresh_view();
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
