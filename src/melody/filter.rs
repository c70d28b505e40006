//! Butterworth band-pass used to keep only the melodic range before pitch
//! tracking.
//!
//! The filter is designed from the analog low-pass prototype, moved to a
//! band-pass around the pre-warped edges and mapped to the z-plane with the
//! bilinear transform. It runs as a cascade of second-order sections, forward
//! only.

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

use crate::error::{MelodyError, Result};

/// One second-order section, `b` over `a` with `a0 == 1`.
#[derive(Clone, Debug)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
}

impl Biquad {
    fn response(&self, z: Complex<f64>) -> Complex<f64> {
        let zi = z.inv();
        let zi2 = zi * zi;
        let num = Complex::new(self.b[0], 0.0) + zi * self.b[1] + zi2 * self.b[2];
        let den = Complex::new(self.a[0], 0.0) + zi * self.a[1] + zi2 * self.a[2];
        num / den
    }
}

#[derive(Clone, Debug)]
pub struct BandPass {
    sections: Vec<Biquad>,
}

impl BandPass {
    /// Design an `order`-th order Butterworth band-pass (`2 * order` poles).
    pub fn design(sample_rate: u32, low_hz: f64, high_hz: f64, order: usize) -> Result<Self> {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;
        if order == 0 {
            return Err(MelodyError::Configuration("filter order must be at least 1".into()));
        }
        if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
            return Err(MelodyError::Configuration(format!(
                "band {}-{} Hz is not inside (0, {}) Hz",
                low_hz, high_hz, nyquist
            )));
        }

        let w_low = 2.0 * fs * (PI * low_hz / fs).tan();
        let w_high = 2.0 * fs * (PI * high_hz / fs).tan();
        let bandwidth = w_high - w_low;
        let center_sq = w_low * w_high;

        let mut analog_poles = Vec::with_capacity(2 * order);
        for k in 0..order {
            let theta = PI / 2.0 + PI * (2 * k + 1) as f64 / (2 * order) as f64;
            let prototype = Complex::from_polar(1.0, theta);
            let half = prototype * (bandwidth / 2.0);
            let root = (half * half - center_sq).sqrt();
            analog_poles.push(half + root);
            analog_poles.push(half - root);
        }

        let two_fs = Complex::new(2.0 * fs, 0.0);
        let digital: Vec<Complex<f64>> = analog_poles
            .iter()
            .map(|&s| (two_fs + s) / (two_fs - s))
            .collect();

        let mut sections = Vec::with_capacity(order);
        let mut real_poles = Vec::new();
        for pole in &digital {
            if pole.im > 1e-12 {
                sections.push(Biquad {
                    b: [1.0, 0.0, -1.0],
                    a: [1.0, -2.0 * pole.re, pole.norm_sqr()],
                });
            } else if pole.im.abs() <= 1e-12 {
                real_poles.push(pole.re);
            }
        }
        for pair in real_poles.chunks(2) {
            let (r1, r2) = (pair[0], pair.get(1).copied().unwrap_or(0.0));
            sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -(r1 + r2), r1 * r2],
            });
        }

        // Unity gain at the band's geometric center.
        let center = 2.0 * (center_sq.sqrt() / (2.0 * fs)).atan();
        let z = Complex::from_polar(1.0, center);
        let magnitude = sections
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, s| acc * s.response(z))
            .norm();
        if !(magnitude.is_finite() && magnitude > 0.0) {
            return Err(MelodyError::Configuration(format!(
                "degenerate band-pass design for {}-{} Hz",
                low_hz, high_hz
            )));
        }
        let per_section = (1.0 / magnitude).powf(1.0 / sections.len() as f64);
        for section in &mut sections {
            for b in &mut section.b {
                *b *= per_section;
            }
        }

        Ok(Self { sections })
    }

    pub fn apply(&self, samples: &[f32]) -> Vec<f32> {
        let mut signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        for section in &self.sections {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            let (mut s1, mut s2) = (0.0f64, 0.0f64);
            for x in signal.iter_mut() {
                let input = *x;
                let y = b0 * input + s1;
                s1 = b1 * input - a1 * y + s2;
                s2 = b2 * input - a2 * y;
                *x = y;
            }
        }
        signal.into_iter().map(|s| s as f32).collect()
    }

    /// Magnitude response at `freq_hz`.
    #[cfg(test)]
    pub fn gain_at(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate as f64;
        let z = Complex::from_polar(1.0, omega);
        self.sections
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, s| acc * s.response(z))
            .norm()
    }
}

pub fn band_pass(
    samples: &[f32],
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
    order: usize,
) -> Result<Vec<f32>> {
    let filter = BandPass::design(sample_rate, low_hz, high_hz, order)?;
    Ok(filter.apply(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn sine(freq: f32, seconds: f32) -> Vec<f32> {
        let n = (seconds * SR as f32) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn steady_rms(signal: &[f32]) -> f32 {
        let tail = &signal[signal.len() / 2..];
        (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn passes_in_band_tone() {
        let input = sine(440.0, 1.0);
        let output = band_pass(&input, SR, 80.0, 1200.0, 4).unwrap();
        assert_eq!(output.len(), input.len());
        let ratio = steady_rms(&output) / steady_rms(&input);
        assert!(ratio > 0.9 && ratio < 1.1, "ratio {}", ratio);
    }

    #[test]
    fn rejects_rumble_and_hiss() {
        for freq in [20.0, 6000.0] {
            let input = sine(freq, 1.0);
            let output = band_pass(&input, SR, 80.0, 1200.0, 4).unwrap();
            let ratio = steady_rms(&output) / steady_rms(&input);
            assert!(ratio < 0.05, "{} Hz leaked with ratio {}", freq, ratio);
        }
    }

    #[test]
    fn response_shape() {
        let filter = BandPass::design(SR, 80.0, 1200.0, 4).unwrap();
        let edge = std::f64::consts::FRAC_1_SQRT_2;
        assert!((filter.gain_at(80.0, SR) - edge).abs() < 0.02);
        assert!((filter.gain_at(1200.0, SR) - edge).abs() < 0.02);
        assert!(filter.gain_at(300.0, SR) > 0.99);
    }

    #[test]
    fn invalid_cutoffs_are_configuration_errors() {
        for (low, high) in [(0.0, 1200.0), (1200.0, 80.0), (80.0, 30000.0)] {
            let err = BandPass::design(SR, low, high, 4).unwrap_err();
            assert!(matches!(err, MelodyError::Configuration(_)));
        }
        assert!(BandPass::design(SR, 80.0, 1200.0, 0).is_err());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(band_pass(&[], SR, 80.0, 1200.0, 4).unwrap().is_empty());
    }
}
