use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::engine::RodioEngine;
use crate::player::PlayerHandle;

mod event_loop;
mod logging;
mod settings;
mod source;

pub use source::CatalogSource;

pub fn run() -> anyhow::Result<()> {
    let settings = settings::load_settings();
    logging::init(&settings.log);

    let source = CatalogSource::resolve(env::args_os().nth(1).map(PathBuf::from), &settings.catalog);
    let catalog = source
        .load(&settings.catalog)
        .with_context(|| format!("loading catalog from {source}"))?;
    tracing::info!(%source, tracks = catalog.len(), "catalog ready");

    let player_settings = settings.player.clone();
    let player = PlayerHandle::spawn(
        move || RodioEngine::new(&player_settings),
        catalog.clone(),
        Duration::from_millis(settings.player.poll_interval_ms),
    )
    .context("starting playback thread")?;

    let mut app = App::new(catalog);
    app.follow_playback = settings.ui.follow_playback;
    app.screen = settings.ui.start_screen.into();
    app.source = Some(source.to_string());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &player);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    player.shutdown();
    run_result
}
