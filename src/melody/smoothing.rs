use super::pitch::PitchEstimate;
use crate::error::{MelodyError, Result};

/// Fractional MIDI note number of a frequency (A4 = 440 Hz = 69).
pub fn to_midi(frequency: f64) -> f64 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

pub fn midi_track(estimates: &[PitchEstimate]) -> Vec<Option<f64>> {
    estimates
        .iter()
        .map(|e| match e.frequency {
            Some(f) if f > 0.0 => Some(to_midi(f as f64)),
            _ => None,
        })
        .collect()
}

/// Sliding median over a pitch track with unvoiced gaps.
///
/// Windows past either end repeat the edge frame. A window produces a value
/// only when voiced frames are a strict majority of it; the value is the
/// median of those voiced frames.
pub fn median_filter(track: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 || window % 2 == 0 {
        return Err(MelodyError::Configuration(format!(
            "median window must be odd and non-zero, got {}",
            window
        )));
    }
    if track.is_empty() {
        return Ok(Vec::new());
    }

    let half = window / 2;
    let last = track.len() - 1;
    let mut voiced = Vec::with_capacity(window);

    let smoothed = (0..track.len())
        .map(|i| {
            voiced.clear();
            for offset in 0..window {
                let idx = (i + offset).saturating_sub(half).min(last);
                if let Some(value) = track[idx] {
                    voiced.push(value);
                }
            }
            if voiced.len() * 2 <= window {
                return None;
            }
            voiced.sort_by(|a, b| a.total_cmp(b));
            let mid = voiced.len() / 2;
            if voiced.len() % 2 == 1 {
                Some(voiced[mid])
            } else {
                Some((voiced[mid - 1] + voiced[mid]) / 2.0)
            }
        })
        .collect();

    Ok(smoothed)
}

/// Nearest integer semitone, halves rounded to even.
pub fn round_semitones(track: &[Option<f64>]) -> Vec<Option<i32>> {
    track.iter().map(|v| v.map(|m| m.round_ties_even() as i32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_reference_points() {
        assert!((to_midi(440.0) - 69.0).abs() < 1e-9);
        assert!((to_midi(261.6256) - 60.0).abs() < 1e-3);
        assert!((to_midi(880.0) - 81.0).abs() < 1e-9);
    }

    #[test]
    fn unvoiced_estimates_map_to_none() {
        let estimates = [
            PitchEstimate { frequency: Some(440.0), clarity: 0.9 },
            PitchEstimate::unvoiced(0.3),
        ];
        let track = midi_track(&estimates);
        assert!(track[0].is_some());
        assert_eq!(track[1], None);
    }

    #[test]
    fn removes_isolated_outlier() {
        let track = vec![Some(60.0), Some(60.0), Some(72.0), Some(60.0), Some(60.0)];
        let smoothed = median_filter(&track, 5).unwrap();
        assert!(smoothed.iter().all(|v| *v == Some(60.0)));
    }

    #[test]
    fn fills_single_gap_but_not_majority_gaps() {
        let track = vec![Some(60.0), Some(60.0), None, Some(60.0), Some(60.0)];
        let smoothed = median_filter(&track, 5).unwrap();
        assert_eq!(smoothed[2], Some(60.0));

        let sparse = vec![None, None, Some(60.0), None, None];
        let smoothed = median_filter(&sparse, 5).unwrap();
        assert!(smoothed.iter().all(|v| v.is_none()));
    }

    #[test]
    fn edges_are_replicated() {
        // index 0 sees [a, a, a, b, c]
        let track = vec![Some(50.0), Some(52.0), Some(54.0)];
        let smoothed = median_filter(&track, 5).unwrap();
        assert_eq!(smoothed[0], Some(50.0));
        assert_eq!(smoothed[2], Some(54.0));
    }

    #[test]
    fn even_voiced_count_takes_mean() {
        // index 1 sees [None, None, 60, 61, 62]: 3 voiced -> median 61
        // index 2 sees [None, 60, 61, 62, 62]: 4 voiced -> (61 + 62) / 2
        let track = vec![None, Some(60.0), Some(61.0), Some(62.0)];
        let smoothed = median_filter(&track, 5).unwrap();
        assert_eq!(smoothed[2], Some(61.5));
    }

    #[test]
    fn rejects_even_window() {
        assert!(median_filter(&[Some(1.0)], 4).is_err());
        assert!(median_filter(&[Some(1.0)], 0).is_err());
        assert!(median_filter(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn rounds_to_semitones() {
        let rounded = round_semitones(&[Some(59.6), Some(60.49), None, Some(60.51)]);
        assert_eq!(rounded, vec![Some(60), Some(60), None, Some(61)]);
    }

    #[test]
    fn halves_round_to_even() {
        let rounded = round_semitones(&[Some(59.5), Some(60.5), Some(61.5), Some(62.5)]);
        assert_eq!(rounded, vec![Some(60), Some(60), Some(62), Some(62)]);
    }
}
