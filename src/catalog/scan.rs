use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::tag::Accessor;
use walkdir::WalkDir;

use crate::config::CatalogSettings;

use super::model::Track;

pub(crate) const UNKNOWN_ARTIST: &str = "Unknown Artist";

const ARTWORK_STEMS: [&str; 2] = ["cover", "folder"];
const ARTWORK_EXTS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_audio_file(path: &Path, settings: &CatalogSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Look for `cover.*` / `folder.*` next to the audio file.
fn find_artwork(dir: &Path) -> String {
    for stem in ARTWORK_STEMS {
        for ext in ARTWORK_EXTS {
            let candidate = dir.join(format!("{stem}.{ext}"));
            if candidate.is_file() {
                return candidate.to_string_lossy().into_owned();
            }
        }
    }
    String::new()
}

fn sort_key(t: &Track) -> String {
    format!("{} - {}", t.artist, t.title).to_lowercase()
}

/// Build catalog entries from the audio files under `dir`.
///
/// Titles and artists come from tags when present, otherwise from the file
/// stem and a placeholder artist. Entries are sorted by "artist - title",
/// ignoring case.
pub fn scan(dir: &Path, settings: &CatalogSettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist = UNKNOWN_ARTIST.to_string();

        if let Ok(tagged) = lofty::read_from_path(path) {
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title() {
                    if !v.trim().is_empty() {
                        title = v.trim().to_string();
                    }
                }
                if let Some(v) = tag.artist() {
                    if !v.trim().is_empty() {
                        artist = v.trim().to_string();
                    }
                }
            }
        }

        let id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let artwork = path.parent().map(find_artwork).unwrap_or_default();

        tracks.push(Track {
            id,
            title,
            artist,
            url: path.to_string_lossy().into_owned(),
            artwork,
        });
    }

    tracks.sort_by_key(sort_key);
    tracing::info!(dir = %dir.display(), tracks = tracks.len(), "scanned music directory");
    tracks
}
