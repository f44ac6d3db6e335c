//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! This module manages keyboard shortcuts for the TUI. It supports:
//! - Loading custom keybindings from a config file (`keybinds.conf`)
//! - Providing defaults if no config is present
//! - Resolving key presses (with modifiers) to semantic actions
//! - Exporting the current keymap back to a file for reference or customization

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::query::SortField;

/// Semantic keyboard actions that can be bound to key combinations.
///
/// Several key combinations can map to the same action (both 'j' and Down
/// move down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Open the column filter dialog.
    OpenFilterMenu,
    /// Display the help modal.
    OpenHelp,
    /// Start typing a search term.
    StartSearch,
    /// Open the form for a new user.
    NewUser,
    /// Open the form for the selected user.
    EditSelection,
    /// Ask to delete the selected user.
    DeleteSelection,
    /// Re-fetch the whole user list.
    Refresh,
    /// Sort by a column; repeating flips the direction.
    SortBy(SortField),
    /// Toggle the keybindings panel on the right.
    ToggleKeybindsPane,
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    FirstPage,
    LastPage,
    /// Cycle rows per page through 10/25/50/100.
    CyclePageSize,
    /// Swallow the key.
    Ignore,
}

/// Keymap: maps (modifiers, key code) to actions.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

/// Stable, readable subset of the defaults written to a fresh config file.
const DEFAULT_DUMP: &[(&str, KeyAction)] = &[
    ("q", KeyAction::Quit),
    ("Ctrl+c", KeyAction::Quit),
    ("Esc", KeyAction::Ignore),
    ("f", KeyAction::OpenFilterMenu),
    ("/", KeyAction::StartSearch),
    ("n", KeyAction::NewUser),
    ("e", KeyAction::EditSelection),
    ("Enter", KeyAction::EditSelection),
    ("d", KeyAction::DeleteSelection),
    ("Delete", KeyAction::DeleteSelection),
    ("r", KeyAction::Refresh),
    ("?", KeyAction::OpenHelp),
    ("1", KeyAction::SortBy(SortField::Id)),
    ("2", KeyAction::SortBy(SortField::FirstName)),
    ("3", KeyAction::SortBy(SortField::LastName)),
    ("4", KeyAction::SortBy(SortField::Email)),
    ("5", KeyAction::SortBy(SortField::Department)),
    ("Up", KeyAction::MoveUp),
    ("Down", KeyAction::MoveDown),
    ("k", KeyAction::MoveUp),
    ("j", KeyAction::MoveDown),
    ("Left", KeyAction::PrevPage),
    ("Right", KeyAction::NextPage),
    ("h", KeyAction::PrevPage),
    ("l", KeyAction::NextPage),
    ("PageUp", KeyAction::PrevPage),
    ("PageDown", KeyAction::NextPage),
    ("Home", KeyAction::FirstPage),
    ("End", KeyAction::LastPage),
    ("p", KeyAction::CyclePageSize),
    ("K", KeyAction::ToggleKeybindsPane),
];

impl Keymap {
    /// Create a keymap with default keybindings.
    pub fn new_defaults() -> Self {
        let mut bindings = HashMap::new();
        for (spec, action) in DEFAULT_DUMP {
            if let Some(key) = parse_key(spec) {
                bindings.insert(key, *action);
            }
        }
        // Terminals disagree on whether Shift is reported with uppercase letters.
        bindings.insert(
            (KeyModifiers::SHIFT, KeyCode::Char('K')),
            KeyAction::ToggleKeybindsPane,
        );
        bindings.insert(
            (KeyModifiers::SHIFT, KeyCode::Char('?')),
            KeyAction::OpenHelp,
        );
        Self { bindings }
    }

    /// Load a keymap from `path` or the per-user config directory; write the
    /// defaults to `path` when neither exists.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = crate::config::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(err) = km.write_file(path) {
            tracing::debug!(%path, error = %err, "could not write default keybinds");
        }
        km
    }

    /// Load a keymap from a configuration file.
    ///
    /// Lines have the form `<Action> = <KeySpec>`. Bindings from the file are
    /// layered over the defaults; malformed lines are skipped.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse keymap text on top of the defaults.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    /// Write the default bindings to a configuration file.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrdir-manager keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Home, End, Delete, /, 1\n");
        buf.push_str("# Actions: Quit, OpenFilterMenu, OpenHelp, StartSearch, NewUser, EditSelection, DeleteSelection, Refresh, SortById, SortByFirstName, SortByLastName, SortByEmail, SortByDepartment, ToggleKeybindsPane, MoveUp, MoveDown, PrevPage, NextPage, FirstPage, LastPage, CyclePageSize, Ignore\n\n");

        for (k, a) in DEFAULT_DUMP {
            let _ = writeln!(&mut buf, "{} = {}", format_action(*a), k);
        }

        std::fs::write(path, buf)
    }

    /// Resolve a key event to its action, if any.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Snapshot of all bindings as ((modifiers, code), action) pairs.
    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Keys bound to `action`, formatted and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Format a key (modifiers + code) into a spec like "Ctrl+q" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let action = match s.trim() {
        "Quit" => KeyAction::Quit,
        "OpenFilterMenu" => KeyAction::OpenFilterMenu,
        "OpenHelp" => KeyAction::OpenHelp,
        "StartSearch" => KeyAction::StartSearch,
        "NewUser" => KeyAction::NewUser,
        "EditSelection" => KeyAction::EditSelection,
        "DeleteSelection" => KeyAction::DeleteSelection,
        "Refresh" => KeyAction::Refresh,
        "SortById" => KeyAction::SortBy(SortField::Id),
        "SortByFirstName" => KeyAction::SortBy(SortField::FirstName),
        "SortByLastName" => KeyAction::SortBy(SortField::LastName),
        "SortByEmail" => KeyAction::SortBy(SortField::Email),
        "SortByDepartment" => KeyAction::SortBy(SortField::Department),
        "ToggleKeybindsPane" => KeyAction::ToggleKeybindsPane,
        "MoveUp" => KeyAction::MoveUp,
        "MoveDown" => KeyAction::MoveDown,
        "PrevPage" => KeyAction::PrevPage,
        "NextPage" => KeyAction::NextPage,
        "FirstPage" => KeyAction::FirstPage,
        "LastPage" => KeyAction::LastPage,
        "CyclePageSize" => KeyAction::CyclePageSize,
        "Ignore" => KeyAction::Ignore,
        _ => return None,
    };
    Some(action)
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::OpenFilterMenu => "OpenFilterMenu",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::NewUser => "NewUser",
        KeyAction::EditSelection => "EditSelection",
        KeyAction::DeleteSelection => "DeleteSelection",
        KeyAction::Refresh => "Refresh",
        KeyAction::SortBy(SortField::Id) => "SortById",
        KeyAction::SortBy(SortField::FirstName) => "SortByFirstName",
        KeyAction::SortBy(SortField::LastName) => "SortByLastName",
        KeyAction::SortBy(SortField::Email) => "SortByEmail",
        KeyAction::SortBy(SortField::Department) => "SortByDepartment",
        KeyAction::ToggleKeybindsPane => "ToggleKeybindsPane",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PrevPage => "PrevPage",
        KeyAction::NextPage => "NextPage",
        KeyAction::FirstPage => "FirstPage",
        KeyAction::LastPage => "LastPage",
        KeyAction::CyclePageSize => "CyclePageSize",
        KeyAction::Ignore => "Ignore",
    }
}
