//! Helpers for turning a track locator into a paused `rodio` sink.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::file::AudioFile;
use rodio::{Decoder, Sink, Source, mixer::Mixer};

use crate::error::EngineError;

/// Map a locator to a local path. Only plain paths and `file://` URLs are
/// playable.
pub fn local_path(url: &str) -> Result<PathBuf, EngineError> {
    let url = url.trim();
    if let Some(rest) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if url.is_empty() || url.contains("://") {
        return Err(EngineError::Unsupported(url.to_string()));
    }
    Ok(PathBuf::from(url))
}

/// Read the length from the container when the decoder cannot tell.
fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|d| !d.is_zero())
}

/// Create a paused `Sink` for `url` on `mixer`, returning it with the
/// track length when known.
pub(super) fn open_sink(
    mixer: &Mixer,
    url: &str,
    volume: f32,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let path = local_path(url)?;
    let file = File::open(&path).map_err(|source| EngineError::Unreachable {
        url: url.to_string(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let duration = source.total_duration().or_else(|| probe_duration(&path));

    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.set_volume(volume);
    sink.append(source);
    Ok((sink, duration))
}
