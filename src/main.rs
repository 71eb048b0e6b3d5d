#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::fs::{self, File};
use std::io::{self, stdout};
use std::sync::Mutex;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roamlog::api::HttpApi;
use roamlog::config::ClientConfig;
use roamlog::storage::SessionStore;
use roamlog::tui::{App, Services};

#[cfg_attr(coverage_nightly, coverage(off))]
#[mutants::skip]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env()?;
    init_logging(&config)?;
    info!(base_url = %config.api_base_url, "starting roamlog");

    let services = Services::shared(HttpApi::new(&config)?);
    let session = SessionStore::new(config.session_path());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = runtime.block_on(async {
        let (mut app, events) = App::new(services, session);
        app.run(&mut terminal, events).await
    });

    let restore_result = restore_terminal();
    match result {
        Err(e) => Err(e.into()),
        Ok(()) => restore_result.map_err(Into::into),
    }
}

/// Sends tracing output to the log file; the terminal belongs to the UI.
#[cfg_attr(coverage_nightly, coverage(off))]
#[mutants::skip]
fn init_logging(config: &ClientConfig) -> Result<(), io::Error> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("ROAMLOG_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[mutants::skip]
fn restore_terminal() -> Result<(), io::Error> {
    let raw_result = disable_raw_mode();
    let screen_result = execute!(stdout(), LeaveAlternateScreen);
    raw_result.and(screen_result)
}
