use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::error::MelodyError;
use crate::melody::Fingerprint;

pub const INSUFFICIENT_NOTES_MESSAGE: &str = "Not enough valid notes were found to compute intervals.";

#[derive(Debug, Serialize, PartialEq)]
pub struct Song {
    pub song_id: i64,
    pub title: String,
    pub audio_url: String,
}

impl From<CatalogEntry> for Song {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            song_id: entry.id,
            title: entry.title,
            audio_url: entry.audio_url,
        }
    }
}

/// The single terminal payload of a recognition session.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Matched {
        success: bool,
        tone_intervals: Vec<f64>,
        songs: Vec<Song>,
    },
    Insufficient {
        success: bool,
        message: String,
        tone_intervals: Vec<f64>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl Response {
    pub fn matched(fingerprint: &Fingerprint, entries: Vec<CatalogEntry>) -> Self {
        Response::Matched {
            success: true,
            tone_intervals: fingerprint.tone_values(),
            songs: entries.into_iter().map(Song::from).collect(),
        }
    }

    pub fn insufficient() -> Self {
        Response::Insufficient {
            success: true,
            message: INSUFFICIENT_NOTES_MESSAGE.to_string(),
            tone_intervals: Vec::new(),
        }
    }

    pub fn failure(err: &MelodyError) -> Self {
        Response::Failure {
            success: false,
            error: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Failure { .. })
    }
}
