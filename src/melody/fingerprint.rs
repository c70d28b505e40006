//! Melodic fingerprints: the sequence of pitch steps between consecutive notes,
//! written in tone units (one semitone = 0.5).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::segment::Note;

/// Interval sequence between consecutive notes.
///
/// Steps are stored as whole semitones so the half-tone values stay exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    semitone_steps: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Encoding {
    Fingerprint(Fingerprint),
    /// Fewer than two notes survived segmentation.
    InsufficientNotes { found: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseFingerprintError {
    #[error("fingerprint is empty")]
    Empty,
    #[error("'{0}' is not a number")]
    InvalidToken(String),
    #[error("'{0}' is not a multiple of 0.5")]
    NotHalfTone(String),
}

pub fn encode(notes: &[Note]) -> Encoding {
    if notes.len() < 2 {
        return Encoding::InsufficientNotes { found: notes.len() };
    }
    let semitone_steps = notes
        .windows(2)
        .map(|pair| pair[1].midi_pitch - pair[0].midi_pitch)
        .collect();
    Encoding::Fingerprint(Fingerprint { semitone_steps })
}

impl Fingerprint {
    #[cfg(test)]
    pub fn from_semitone_steps(semitone_steps: Vec<i32>) -> Self {
        Self { semitone_steps }
    }

    pub fn len(&self) -> usize {
        self.semitone_steps.len()
    }

    pub fn tone_values(&self) -> Vec<f64> {
        self.semitone_steps.iter().map(|&s| s as f64 / 2.0).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &step) in self.semitone_steps.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if step % 2 == 0 {
                write!(f, "{}", step / 2)?;
            } else {
                write!(f, "{:.1}", step as f64 / 2.0)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseFingerprintError::Empty);
        }
        let semitone_steps = s
            .split(',')
            .map(|raw| {
                let token = raw.trim();
                let value: f64 = token
                    .parse()
                    .map_err(|_| ParseFingerprintError::InvalidToken(token.to_string()))?;
                let doubled = value * 2.0;
                if !doubled.is_finite() || doubled.fract() != 0.0 || doubled.abs() > i32::MAX as f64 {
                    return Err(ParseFingerprintError::NotHalfTone(token.to_string()));
                }
                Ok(doubled as i32)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { semitone_steps })
    }
}
