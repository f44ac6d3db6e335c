//! Command line options and config file lookup.
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::query::PageSize;
use crate::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

const APP_DIR: &str = "usrdir-manager";

#[derive(Debug, Clone, Parser)]
#[command(name = "usrdir-manager", version, about = "Browse and edit the users of a REST API")]
pub struct Cli {
    /// Base URL of the users API.
    #[arg(long, env = "USRDIR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Connect and response timeout in seconds.
    #[arg(long, env = "USRDIR_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Initial rows per page (10, 25, 50 or 100).
    #[arg(long, env = "USRDIR_PAGE_SIZE", default_value = "10", value_parser = parse_page_size)]
    pub page_size: PageSize,

    /// Log file; the terminal itself is owned by the UI.
    #[arg(long, env = "USRDIR_LOG_FILE", default_value = "usrdir-manager.log")]
    pub log_file: PathBuf,

    /// Theme file (key = #RRGGBB).
    #[arg(long, default_value = "theme.conf")]
    pub theme: String,

    /// Keybindings file (Action = KeySpec).
    #[arg(long, default_value = "keybinds.conf")]
    pub keybinds: String,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn parse_page_size(raw: &str) -> Result<PageSize, String> {
    let n: usize = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid page size '{raw}': {e}"))?;
    PageSize::try_from(n)
}

/// Find an existing config file named `name` in the per-user config directory.
///
/// Checks `$XDG_CONFIG_HOME/usrdir-manager/` then `~/.config/usrdir-manager/`.
pub fn config_file_read_path(name: &str) -> Option<String> {
    let mut candidates = Vec::new();
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        candidates.push(PathBuf::from(xdg).join(APP_DIR).join(name));
    }
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(home).join(".config").join(APP_DIR).join(name));
    }
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .map(|p| p.to_string_lossy().into_owned())
}
