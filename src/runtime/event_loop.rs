use std::io::Stdout;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::error::PlayerError;
use crate::player::{Intent, PlayerHandle};
use crate::ui;

/// What a key press asks for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
    PlaySelected,
    Toggle,
    Next,
    Previous,
    ScrubForward,
    ScrubBack,
    SwitchScreen,
    ShowPlaylist,
    Quit,
}

/// Map a key press to an action. Unbound keys map to `None`.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Char('g') | KeyCode::Home => Action::SelectFirst,
        KeyCode::Char('G') | KeyCode::End => Action::SelectLast,
        KeyCode::Enter => Action::PlaySelected,
        KeyCode::Char('p') | KeyCode::Char(' ') => Action::Toggle,
        KeyCode::Char('l') => Action::Next,
        KeyCode::Char('h') => Action::Previous,
        KeyCode::Char('L') => Action::ScrubForward,
        KeyCode::Char('H') => Action::ScrubBack,
        KeyCode::Tab => Action::SwitchScreen,
        KeyCode::Esc => Action::ShowPlaylist,
        _ => return None,
    };
    Some(action)
}

/// Main terminal event loop: draws, syncs with the playback thread and
/// handles input. Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerHandle,
) -> anyhow::Result<()> {
    loop {
        app.sync_playback(player.snapshot());

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let Some(action) = action_for_key(key) else {
                    continue;
                };
                if action == Action::Quit {
                    break;
                }
                apply(action, settings, app, player);
            }
        }
    }

    Ok(())
}

/// Scrub step in milliseconds, saturating instead of wrapping negative.
fn scrub_delta_ms(scrub_seconds: u64) -> i64 {
    i64::try_from(scrub_seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// Apply an action to the UI model and, for transport actions, the player.
fn apply(action: Action, settings: &config::Settings, app: &mut App, player: &PlayerHandle) {
    let scrub_ms = scrub_delta_ms(settings.controls.scrub_seconds);

    let intent = match action {
        Action::SelectNext => {
            app.select_next();
            None
        }
        Action::SelectPrev => {
            app.select_prev();
            None
        }
        Action::SelectFirst => {
            app.select_first();
            None
        }
        Action::SelectLast => {
            app.select_last();
            None
        }
        Action::SwitchScreen => {
            app.toggle_screen();
            None
        }
        Action::ShowPlaylist => {
            app.show_playlist();
            app.follow_current();
            None
        }
        Action::PlaySelected => app.has_tracks().then_some(Intent::Play(app.selected)),
        Action::Toggle => Some(Intent::Toggle),
        Action::Next => Some(Intent::Next),
        Action::Previous => Some(Intent::Previous),
        Action::ScrubForward => app.seek_target(scrub_ms).map(Intent::Seek),
        Action::ScrubBack => app.seek_target(-scrub_ms).map(Intent::Seek),
        Action::Quit => None,
    };

    let Some(intent) = intent else {
        return;
    };

    // Loads go through `send` so a slow decoder never stalls input; pause and
    // seek are waited for so the next frame already shows their effect.
    let result = match intent {
        Intent::Toggle | Intent::Seek(_) => player.request(intent),
        _ => player.send(intent),
    };
    match result {
        Ok(()) => {}
        Err(PlayerError::Disconnected) => {
            tracing::warn!(?intent, "playback thread unavailable");
        }
        Err(e) => tracing::debug!(?intent, error = %e, "intent rejected"),
    }
}
