//! Frame-wise fundamental frequency estimation with the normalized
//! square-difference function (NSDF).
//!
//! Each frame is Hann-windowed, autocorrelated through a zero-padded FFT and
//! normalized into an NSDF curve. The highest NSDF value inside the allowed lag
//! range is the pitch period; its height is the clarity.

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::framing::{Framing, SessionContext};
use crate::error::{MelodyError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchEstimate {
    /// `None` when the frame is silent, noisy or otherwise unpitched.
    pub frequency: Option<f32>,
    /// NSDF peak height, 0.0 to 1.0.
    pub clarity: f32,
}

impl PitchEstimate {
    pub fn unvoiced(clarity: f64) -> Self {
        Self {
            frequency: None,
            clarity: clarity.clamp(0.0, 1.0) as f32,
        }
    }

    pub fn is_voiced(&self) -> bool {
        self.frequency.is_some()
    }
}

pub struct PitchTracker {
    frame_size: usize,
    min_hz: f64,
    max_hz: f64,
    clarity_threshold: f64,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl PitchTracker {
    pub fn new(frame_size: usize, min_hz: f64, max_hz: f64, clarity_threshold: f64) -> Result<Self> {
        if frame_size < 4 {
            return Err(MelodyError::Configuration(format!(
                "frame size {} is too small for pitch tracking",
                frame_size
            )));
        }
        if !(min_hz > 0.0 && min_hz < max_hz) {
            return Err(MelodyError::Configuration(format!(
                "pitch range {}-{} Hz is empty",
                min_hz, max_hz
            )));
        }

        // Planned once; the plans are immutable and shared by all workers.
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(2 * frame_size);
        let inverse = planner.plan_fft_inverse(2 * frame_size);

        Ok(Self {
            frame_size,
            min_hz,
            max_hz,
            clarity_threshold,
            window: hann_window(frame_size),
            forward,
            inverse,
        })
    }

    /// Estimate the pitch of every frame, in frame order.
    pub fn track(&self, samples: &[f32], framing: &Framing) -> Vec<PitchEstimate> {
        let ctx = &framing.context;
        framing
            .frames
            .par_iter()
            .zip(framing.energies.par_iter())
            .map(|(range, &energy)| self.estimate(&samples[range.clone()], energy, ctx))
            .collect()
    }

    pub fn estimate(&self, frame: &[f32], energy: f64, ctx: &SessionContext) -> PitchEstimate {
        if frame.len() != self.frame_size {
            log::warn!(
                "Skipping frame of {} samples (expected {})",
                frame.len(),
                self.frame_size
            );
            return PitchEstimate::unvoiced(0.0);
        }
        if energy <= 0.0 || energy < ctx.energy_threshold {
            return PitchEstimate::unvoiced(0.0);
        }

        let curve = self.nsdf(frame);
        let sr = ctx.sample_rate as f64;
        let min_lag = ((sr / self.max_hz) as usize).max(1);
        let max_lag = ((sr / self.min_hz) as usize).min(curve.len() - 1);
        if min_lag >= max_lag {
            return PitchEstimate::unvoiced(0.0);
        }

        let mut peak = min_lag;
        for lag in min_lag + 1..max_lag {
            if curve[lag] > curve[peak] {
                peak = lag;
            }
        }

        let clarity = curve[peak];
        if clarity < self.clarity_threshold {
            return PitchEstimate::unvoiced(clarity);
        }

        let lag = refine_peak(&curve, peak);
        let frequency = sr / lag;
        if !frequency.is_finite() || frequency <= 0.0 {
            return PitchEstimate::unvoiced(clarity);
        }

        PitchEstimate {
            frequency: Some(frequency as f32),
            clarity: clarity.clamp(0.0, 1.0) as f32,
        }
    }

    /// NSDF of the Hann-windowed frame for lags `0..frame_size`.
    pub fn nsdf(&self, frame: &[f32]) -> Vec<f64> {
        let n = self.frame_size;
        let windowed: Vec<f64> = frame
            .iter()
            .zip(&self.window)
            .map(|(&s, &w)| s as f64 * w)
            .collect();

        let mut buffer = vec![Complex::new(0.0, 0.0); 2 * n];
        for (slot, &w) in buffer.iter_mut().zip(&windowed) {
            slot.re = w;
        }
        self.forward.process(&mut buffer);
        for bin in buffer.iter_mut() {
            *bin = Complex::new(bin.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buffer);
        let scale = 1.0 / (2 * n) as f64;

        let mut cumulative = Vec::with_capacity(n);
        let mut running = 0.0;
        for &w in &windowed {
            running += w * w;
            cumulative.push(running);
        }

        let total = cumulative[n - 1];
        (0..n)
            .map(|k| {
                let acf = buffer[k].re * scale;
                let head = if k > 0 { cumulative[k - 1] } else { 0.0 };
                let mut denom = total + cumulative[n - 1 - k] - head;
                if denom <= f64::EPSILON {
                    denom = f64::EPSILON;
                }
                2.0 * acf / denom
            })
            .collect()
    }
}

/// Parabolic interpolation of the peak at `idx`; falls back to the integer lag
/// on the curve boundary or for a flat neighbourhood.
fn refine_peak(curve: &[f64], idx: usize) -> f64 {
    if idx == 0 || idx + 1 >= curve.len() {
        return idx as f64;
    }
    let (y0, y1, y2) = (curve[idx - 1], curve[idx], curve[idx + 1]);
    let d = y0 - 2.0 * y1 + y2;
    if d == 0.0 {
        return idx as f64;
    }
    idx as f64 + (y0 - y2) / (2.0 * d)
}

fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}
