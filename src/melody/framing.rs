use std::ops::Range;

use crate::error::{MelodyError, Result};

/// Per-recording state shared read-only by every pitch-tracking worker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionContext {
    pub sample_rate: u32,
    /// Frames with less energy than this are treated as silence.
    pub energy_threshold: f64,
}

#[derive(Clone, Debug)]
pub struct Framing {
    /// Sample ranges into the filtered signal, one per frame.
    pub frames: Vec<Range<usize>>,
    pub energies: Vec<f64>,
    pub context: SessionContext,
}

impl Framing {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Slice `samples` into `frame_size` windows every `hop_size` samples.
///
/// A trailing remainder shorter than one frame is dropped.
pub fn frame_signal(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    energy_fraction: f64,
    sample_rate: u32,
) -> Result<Framing> {
    if frame_size == 0 || hop_size == 0 {
        return Err(MelodyError::Configuration(format!(
            "frame size ({}) and hop size ({}) must be non-zero",
            frame_size, hop_size
        )));
    }

    let mut frames = Vec::new();
    let mut energies = Vec::new();
    let mut start = 0;
    while start + frame_size <= samples.len() {
        let range = start..start + frame_size;
        energies.push(frame_energy(&samples[range.clone()]));
        frames.push(range);
        start += hop_size;
    }

    let max_energy = energies.iter().copied().fold(0.0f64, f64::max);
    let context = SessionContext {
        sample_rate,
        energy_threshold: energy_fraction * max_energy,
    };

    log::debug!(
        "Framed {} samples into {} frames (max energy {:.4}, threshold {:.6})",
        samples.len(),
        frames.len(),
        max_energy,
        context.energy_threshold
    );

    Ok(Framing {
        frames,
        energies,
        context,
    })
}

pub fn frame_energy(frame: &[f32]) -> f64 {
    frame.iter().map(|&s| (s as f64) * (s as f64)).sum()
}
