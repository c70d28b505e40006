use std::path::Path;

use crate::audio::{self, Clip};
use crate::catalog::{self, Catalog, JsonCatalog};
use crate::config::{Config, PipelineConfig};
use crate::error::Result;
use crate::matching::{MatchEngine, RetryPolicy};
use crate::melody::{self, Encoding, Transcription};
use crate::response::Response;

/// Where a session takes its clip from.
#[derive(Clone, Copy, Debug)]
pub enum ClipSource<'a> {
    File(&'a Path),
    Microphone,
}

/// Open the catalog, acquire the clip and identify it.
///
/// Every failure along the way comes back as a [`crate::error::MelodyError`]
/// so the caller can turn it into a failure payload.
pub fn run(
    source: ClipSource<'_>,
    catalog_path: Option<&Path>,
    config: &Config,
) -> Result<(Transcription, Response)> {
    let catalog = open_catalog(catalog_path)?;
    let clip = match source {
        ClipSource::File(path) => {
            log::info!("Input: {}", path.display());
            audio::decode::decode_clip(path, config.audio.clip_seconds)?
        }
        ClipSource::Microphone => {
            audio::capture::capture_clip(config.audio.clip_seconds, config.audio.sample_rate)?
        }
    };
    identify(
        &clip,
        &config.pipeline,
        catalog.as_ref(),
        RetryPolicy::from(&config.catalog),
    )
}

fn open_catalog(path: Option<&Path>) -> Result<Box<dyn Catalog>> {
    match path {
        Some(path) => catalog::open(path).map_err(|err| {
            log::error!("Failed to open catalog {}: {}", path.display(), err);
            err.into()
        }),
        None => {
            log::warn!("No catalog configured; matches will be empty");
            Ok(Box::new(JsonCatalog::default()))
        }
    }
}

/// Transcribe `clip` and look its fingerprint up in `catalog`.
///
/// Too few notes is a successful response; every other failure is returned
/// as an error for the caller to report.
pub fn identify(
    clip: &Clip,
    pipeline: &PipelineConfig,
    catalog: &dyn Catalog,
    retry: RetryPolicy,
) -> Result<(Transcription, Response)> {
    let transcription = melody::transcribe(clip, pipeline)?;

    let response = match transcription.outcome {
        Encoding::InsufficientNotes { found } => {
            log::info!("Only {} valid notes found; skipping catalog lookup", found);
            Response::insufficient()
        }
        Encoding::Fingerprint(ref fingerprint) => {
            let engine = MatchEngine::new(catalog, retry);
            let entries = engine.find_matches(fingerprint)?;
            Response::matched(fingerprint, entries)
        }
    };

    Ok((transcription, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::entry;
    use crate::catalog::CatalogEntry;
    use crate::error::{MelodyError, StoreError};
    use crate::response::Song;

    const SR: u32 = 44100;

    fn two_note_clip() -> Clip {
        let mut samples = Vec::new();
        let mut phase = 0.0f64;
        for midi in [60.0f64, 57.0] {
            let freq = 440.0 * 2f64.powf((midi - 69.0) / 12.0);
            let step = 2.0 * std::f64::consts::PI * freq / SR as f64;
            for _ in 0..(SR as usize * 3 / 2) {
                samples.push((0.5 * phase.sin()) as f32);
                phase += step;
            }
        }
        Clip {
            samples,
            sample_rate: SR,
        }
    }

    struct Down;

    impl Catalog for Down {
        fn find_by_signature_substring(&self, _pattern: &str) -> std::result::Result<Vec<CatalogEntry>, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "catalog offline",
            )))
        }
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            base_backoff: std::time::Duration::from_millis(0),
        }
    }

    #[test]
    fn end_to_end_match() {
        let catalog = JsonCatalog::new(vec![entry(1, "2,-1.5,1"), entry(2, "1,2"), entry(3, "-1.5")]);
        let (transcription, response) =
            identify(&two_note_clip(), &PipelineConfig::default(), &catalog, no_retry()).unwrap();
        assert_eq!(transcription.notes.len(), 2);
        match response {
            Response::Matched { success, tone_intervals, songs } => {
                assert!(success);
                assert_eq!(tone_intervals, vec![-1.5]);
                let ids: Vec<i64> = songs.iter().map(|s: &Song| s.song_id).collect();
                assert_eq!(ids, vec![1, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn silence_is_insufficient_without_catalog_call() {
        let clip = Clip {
            samples: vec![0.0; SR as usize * 5],
            sample_rate: SR,
        };
        let (_, response) = identify(&clip, &PipelineConfig::default(), &Down, no_retry()).unwrap();
        assert_eq!(response, Response::insufficient());
    }

    #[test]
    fn store_failure_surfaces_as_error() {
        let err = identify(&two_note_clip(), &PipelineConfig::default(), &Down, no_retry()).unwrap_err();
        assert!(matches!(err, MelodyError::Store(StoreError::Io(_))));
    }

    #[test]
    fn missing_catalog_file_is_a_store_error() {
        let err = run(
            ClipSource::File(Path::new("/nonexistent/melodex/clip.wav")),
            Some(Path::new("/nonexistent/melodex/songs.json")),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MelodyError::Store(StoreError::Io(_))));
    }

    #[test]
    fn missing_input_file_is_a_decode_error() {
        let err = run(
            ClipSource::File(Path::new("/nonexistent/melodex/clip.wav")),
            None,
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MelodyError::Decode(_)));
        assert!(!Response::failure(&err).is_success());
    }
}
