//! Audio-to-melody transcription: band-pass, framing, pitch tracking,
//! smoothing, note segmentation and fingerprint encoding.

pub mod filter;
pub mod fingerprint;
pub mod framing;
pub mod pitch;
pub mod segment;
pub mod smoothing;

pub use fingerprint::{encode, Encoding, Fingerprint};
pub use framing::SessionContext;
pub use pitch::{PitchEstimate, PitchTracker};
pub use segment::Note;

use crate::audio::Clip;
use crate::config::PipelineConfig;
use crate::error::{MelodyError, Result};

/// Everything one pipeline run produced, intermediate tracks included.
#[derive(Clone, Debug)]
pub struct Transcription {
    pub context: SessionContext,
    pub estimates: Vec<PitchEstimate>,
    pub semitones: Vec<Option<i32>>,
    pub notes: Vec<Note>,
    pub outcome: Encoding,
}

impl Transcription {
    pub fn voiced_frames(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_voiced()).count()
    }
}

pub fn transcribe(clip: &Clip, config: &PipelineConfig) -> Result<Transcription> {
    if config.median_window == 0 || config.median_window % 2 == 0 {
        return Err(MelodyError::Configuration(format!(
            "median window must be odd and non-zero, got {}",
            config.median_window
        )));
    }
    let tracker = PitchTracker::new(
        config.frame_size,
        config.low_hz,
        config.high_hz,
        config.clarity_threshold,
    )?;

    let filtered = filter::band_pass(
        &clip.samples,
        clip.sample_rate,
        config.low_hz,
        config.high_hz,
        config.filter_order,
    )?;

    let framing = framing::frame_signal(
        &filtered,
        config.frame_size,
        config.hop_size,
        config.energy_fraction,
        clip.sample_rate,
    )?;
    if framing.is_empty() {
        log::info!(
            "Clip of {:.2}s is shorter than one frame; nothing to transcribe",
            clip.duration()
        );
        return Ok(Transcription {
            context: framing.context,
            estimates: Vec::new(),
            semitones: Vec::new(),
            notes: Vec::new(),
            outcome: Encoding::InsufficientNotes { found: 0 },
        });
    }

    let estimates = tracker.track(&filtered, &framing);

    let smoothed = smoothing::median_filter(&smoothing::midi_track(&estimates), config.median_window)?;
    let semitones = smoothing::round_semitones(&smoothed);
    let notes = segment::segment(
        &semitones,
        config.min_note_frames,
        config.min_midi,
        config.max_midi,
    );
    log::info!(
        "Segmented {} notes: {:?}",
        notes.len(),
        notes.iter().map(|n| n.midi_pitch).collect::<Vec<_>>()
    );

    let outcome = encode(&notes);
    if let Encoding::Fingerprint(ref f) = outcome {
        log::info!("Fingerprint ({} intervals): {}", f.len(), f);
    }

    let transcription = Transcription {
        context: framing.context,
        estimates,
        semitones,
        notes,
        outcome,
    };
    log::info!(
        "Pitch tracking: {}/{} frames voiced",
        transcription.voiced_frames(),
        framing.len()
    );
    Ok(transcription)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    /// Consecutive sine segments, each `(midi, seconds)`; `None` is silence.
    fn melody(parts: &[(Option<f64>, f32)]) -> Clip {
        let mut samples = Vec::new();
        let mut phase = 0.0f64;
        for &(midi, seconds) in parts {
            let len = (seconds * SR as f32) as usize;
            match midi {
                Some(m) => {
                    let freq = 440.0 * 2f64.powf((m - 69.0) / 12.0);
                    let step = 2.0 * std::f64::consts::PI * freq / SR as f64;
                    for _ in 0..len {
                        samples.push((0.5 * phase.sin()) as f32);
                        phase += step;
                    }
                }
                None => samples.extend(std::iter::repeat(0.0).take(len)),
            }
        }
        Clip {
            samples,
            sample_rate: SR,
        }
    }

    #[test]
    fn silent_clip_is_insufficient() {
        let clip = Clip {
            samples: vec![0.0; SR as usize * 5],
            sample_rate: SR,
        };
        let t = transcribe(&clip, &PipelineConfig::default()).unwrap();
        assert_eq!(t.context.energy_threshold, 0.0);
        assert!(!t.estimates.is_empty());
        assert_eq!(t.voiced_frames(), 0);
        assert!(t.notes.is_empty());
        assert_eq!(t.outcome, Encoding::InsufficientNotes { found: 0 });
    }

    #[test]
    fn clip_shorter_than_a_frame() {
        let clip = Clip {
            samples: vec![0.1; 1000],
            sample_rate: SR,
        };
        let t = transcribe(&clip, &PipelineConfig::default()).unwrap();
        assert!(t.estimates.is_empty());
        assert_eq!(t.outcome, Encoding::InsufficientNotes { found: 0 });
    }

    #[test]
    fn two_notes_give_one_interval() {
        let clip = melody(&[(Some(60.0), 1.5), (Some(57.0), 1.5)]);
        let t = transcribe(&clip, &PipelineConfig::default()).unwrap();
        let pitches: Vec<i32> = t.notes.iter().map(|n| n.midi_pitch).collect();
        assert_eq!(pitches, vec![60, 57]);
        match t.outcome {
            Encoding::Fingerprint(f) => assert_eq!(f.to_string(), "-1.5"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn single_note_is_insufficient() {
        let clip = melody(&[(None, 0.5), (Some(55.0), 2.0), (None, 0.5)]);
        let t = transcribe(&clip, &PipelineConfig::default()).unwrap();
        assert_eq!(t.outcome, Encoding::InsufficientNotes { found: 1 });
    }

    #[test]
    fn repeated_runs_are_identical() {
        let clip = melody(&[(Some(52.0), 1.0), (Some(55.0), 1.0), (Some(59.0), 1.0)]);
        let config = PipelineConfig::default();
        let first = transcribe(&clip, &config).unwrap();
        let second = transcribe(&clip, &config).unwrap();
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.estimates, second.estimates);
        match first.outcome {
            Encoding::Fingerprint(f) => assert_eq!(f.to_string(), "1.5,2"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_band_surfaces_configuration_error() {
        let clip = melody(&[(Some(60.0), 0.5)]);
        let config = PipelineConfig {
            high_hz: 30_000.0,
            ..PipelineConfig::default()
        };
        let err = transcribe(&clip, &config).unwrap_err();
        assert!(matches!(err, MelodyError::Configuration(_)));
    }
}
