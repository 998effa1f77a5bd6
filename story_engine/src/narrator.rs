//! Narrator - the hand-off from resolved audio references to playable media.
//!
//! The engine never fetches audio. A playback host implements [`Narrator`]
//! on top of its asset store or CDN.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use story_graph::AudioRef;

use crate::resolver::Resolution;

/// Where to fetch a track from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioLocation {
    pub url: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarratorError {
    #[error("unknown track: {0}")]
    UnknownTrack(String),

    #[error("narrator unavailable: {0}")]
    Unavailable(String),
}

/// Turns audio references into playable locations.
pub trait Narrator: Send + Sync {
    fn locate(&self, audio: &AudioRef) -> Result<AudioLocation, NarratorError>;

    /// Locate the audio of a resolution, if it has any.
    fn locate_resolution(
        &self,
        resolution: &Resolution,
    ) -> Result<Option<AudioLocation>, NarratorError> {
        resolution.audio.as_ref().map(|a| self.locate(a)).transpose()
    }
}

/// In-memory narrator: explicit track URLs, with an optional base URL fallback.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    base_url: Option<String>,
    tracks: HashMap<String, String>,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve unlisted tracks as `{base_url}/{track}`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Map a track key to an explicit URL.
    pub fn with_track(mut self, track: impl Into<String>, url: impl Into<String>) -> Self {
        self.tracks.insert(track.into(), url.into());
        self
    }
}

impl Narrator for TrackTable {
    fn locate(&self, audio: &AudioRef) -> Result<AudioLocation, NarratorError> {
        let url = match (self.tracks.get(&audio.track), &self.base_url) {
            (Some(url), _) => url.clone(),
            (None, Some(base)) => format!("{}/{}", base, audio.track),
            (None, None) => return Err(NarratorError::UnknownTrack(audio.track.clone())),
        };

        Ok(AudioLocation {
            url,
            duration: audio.duration(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_track_wins() {
        let table = TrackTable::new()
            .with_base_url("https://cdn.example.com/cards/crypt/")
            .with_track("57W.mp3", "https://mirror.example.com/57W.mp3");

        let explicit = table.locate(&AudioRef::new("57W.mp3", 579)).unwrap();
        assert_eq!(explicit.url, "https://mirror.example.com/57W.mp3");
        assert_eq!(explicit.duration, Duration::from_secs(579));

        let fallback = table.locate(&AudioRef::new("57F.mp3", 272)).unwrap();
        assert_eq!(fallback.url, "https://cdn.example.com/cards/crypt/57F.mp3");
    }

    #[test]
    fn test_unknown_track() {
        let table = TrackTable::new();
        let err = table.locate(&AudioRef::new("01.mp3", 40)).unwrap_err();
        assert_eq!(err, NarratorError::UnknownTrack("01.mp3".into()));
    }
}
