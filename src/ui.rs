//! UI rendering for the terminal user interface.
//!
//! Two screens share one frame layout: a body that depends on
//! [`Screen`] and a controls footer.

mod button;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, Screen};
use crate::config::{ControlsSettings, UiSettings};
use crate::player::format_time;

pub use button::{ButtonSize, ICON_NEXT, ICON_PAUSE, ICON_PLAY, ICON_PREV, TransportButton};

const ACCENT: Color = Color::Cyan;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("g/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected song".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("tab".to_string(), "switch screen".to_string());
    map.insert("esc".to_string(), "playlist".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = ["j/k", "h/l", "H/L", "enter", "space/p", "g/G", "tab", "esc", "q"];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Window of `total` rows that fits `height` and keeps `selected` centred
/// when possible. Returns `(start, end, selected_in_window)`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

fn play_glyph(playing: bool) -> &'static str {
    if playing { ICON_PAUSE } else { ICON_PLAY }
}

fn left_padded() -> Block<'static> {
    Block::default().borders(Borders::ALL).padding(Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    })
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)])
        .split(frame.area());

    match app.screen {
        Screen::Playlist => draw_playlist(frame, app, ui_settings, chunks[0]),
        Screen::NowPlaying => draw_now_playing(frame, app, chunks[0]),
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(left_padded().title(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[1]);
}

fn draw_playlist(frame: &mut Frame, app: &App, ui_settings: &UiSettings, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    // Header
    let mut header_block = Block::default()
        .borders(Borders::ALL)
        .title(" encore ")
        .title_alignment(Alignment::Center);
    if let Some(src) = &app.source {
        header_block = header_block.title_bottom(Line::from(format!(" {src} ")).right_aligned());
    }
    let header = Paragraph::new(app.header_title(&ui_settings.header_text))
        .alignment(Alignment::Center)
        .bold()
        .block(header_block);
    frame.render_widget(header, chunks[0]);

    // Track list
    {
        let total = app.catalog.len();
        // Borders take two rows.
        let list_height = chunks[1].height.saturating_sub(2) as usize;
        let (start, end, selected_in_window) = visible_window(total, list_height, app.selected);

        let items: Vec<ListItem> = app.catalog.tracks()[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let index = start + offset;
                if app.is_current(index) {
                    let glyph = play_glyph(app.playback.is_playing);
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{glyph} "), Style::default().fg(ACCENT)),
                        Span::styled(track.title.clone(), Style::default().fg(ACCENT).bold()),
                        Span::raw(format!("  {}", track.artist)),
                    ]))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::raw("  "),
                        Span::raw(track.title.clone()),
                        Span::styled(format!("  {}", track.artist), Style::default().dim()),
                    ]))
                }
            })
            .collect();

        let title = if total == 0 {
            " tracks (empty) ".to_string()
        } else {
            format!(" tracks ({total}) ")
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(selected_in_window));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    frame.render_widget(mini_player(app), chunks[2]);
}

/// Bottom bar of the playlist: what is loaded, and the last error if any.
fn mini_player(app: &App) -> Paragraph<'_> {
    let line = match (&app.playback.last_error, app.current_track()) {
        (Some(err), _) => Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))),
        (None, Some(track)) => Line::from(vec![
            Span::styled(
                format!("{} ", play_glyph(app.playback.is_playing)),
                Style::default().fg(ACCENT),
            ),
            Span::raw(track.title.clone()).bold(),
            Span::raw(format!(" - {}", track.artist)),
            Span::styled(
                format!(
                    "  {}/{}",
                    format_time(app.playback.position_ms),
                    format_time(app.playback.duration_ms)
                ),
                Style::default().dim(),
            ),
        ]),
        (None, None) => Line::from("Nothing playing".dim()),
    };
    Paragraph::new(line).block(left_padded().title(" now playing "))
}

fn draw_now_playing(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(5),
        ])
        .split(area);

    let header = Paragraph::new("PLAYING NOW")
        .alignment(Alignment::Center)
        .bold()
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let track = app.current_track();

    // Artwork is shown by locator only.
    let artwork = match track.map(|t| t.artwork.as_str()) {
        Some(a) if !a.is_empty() => a.to_string(),
        Some(_) => "(no artwork)".to_string(),
        None => String::new(),
    };
    let artwork = Paragraph::new(artwork)
        .alignment(Alignment::Center)
        .dim()
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" artwork "));
    frame.render_widget(artwork, chunks[1]);

    let info = match track {
        Some(t) => vec![
            Line::from(t.title.clone().bold()),
            Line::from(t.artist.clone().fg(ACCENT)),
        ],
        None => vec![Line::from("Nothing playing".dim())],
    };
    let mut info_lines = info;
    if let Some(err) = &app.playback.last_error {
        info_lines.push(Line::from(err.clone().fg(Color::Red)));
    }
    let info = Paragraph::new(info_lines)
        .alignment(Alignment::Center)
        .block(Block::default().padding(Padding::vertical(1)));
    frame.render_widget(info, chunks[2]);

    let label = format!(
        "{} / {}",
        format_time(app.playback.position_ms),
        format_time(app.playback.duration_ms)
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(ACCENT))
        .ratio(app.progress_ratio())
        .label(label);
    frame.render_widget(gauge, chunks[3]);

    draw_transport(frame, app, chunks[4]);
}

fn draw_transport(frame: &mut Frame, app: &App, area: Rect) {
    let prev = TransportButton::new(ICON_PREV).accent(ACCENT);
    let play = TransportButton::new(play_glyph(app.playback.is_playing))
        .size(ButtonSize::Large)
        .accent(ACCENT)
        .highlighted(app.has_loaded_track());
    let next = TransportButton::new(ICON_NEXT).accent(ACCENT);

    let cells = Layout::horizontal([
        Constraint::Length(prev.width()),
        Constraint::Length(2),
        Constraint::Length(play.width()),
        Constraint::Length(2),
        Constraint::Length(next.width()),
    ])
    .flex(Flex::Center)
    .split(area);

    frame.render_widget(prev, cells[0]);
    frame.render_widget(play, cells[2]);
    frame.render_widget(next, cells[4]);
}
