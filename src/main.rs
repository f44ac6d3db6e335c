//! usrdir-manager binary entry point.
//!
//! Parses options, sets up file logging, starts the network worker,
//! initializes the terminal in raw mode, runs the TUI event loop,
//! and restores the terminal state on exit.
//!
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usrdir_manager::app::keymap::Keymap;
use usrdir_manager::app::{self, AppState, Theme};
use usrdir_manager::bridge::Bridge;
use usrdir_manager::config::Cli;
use usrdir_manager::remote::HttpUserApi;

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` overrides the level.
fn init_logging(cli: &Cli) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("open log file {}", cli.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let api = HttpUserApi::new(&cli.base_url, cli.timeout())
        .context("build http client")?;
    info!(base_url = %api.base_url(), "starting");
    let bridge = Bridge::launch(Arc::new(api));

    let theme = Theme::load_or_init(&cli.theme);
    let keymap = Keymap::load_or_init(&cli.keybinds);
    let mut state = AppState::new(cli.base_url.clone(), cli.page_size, theme, keymap);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state, &bridge);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err:#}");
    }
    info!("bye");
    Ok(())
}
