#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub midi_pitch: i32,
    pub start_frame: usize,
    pub frame_span: usize,
}

/// Run-length encode a semitone track into notes.
///
/// Runs that are unvoiced or shorter than `min_frames` are dropped first, then
/// notes outside `min_midi..=max_midi`. Neighbouring notes with the same pitch
/// are not merged across a dropped run.
pub fn segment(semitones: &[Option<i32>], min_frames: usize, min_midi: i32, max_midi: i32) -> Vec<Note> {
    let mut notes = Vec::new();
    let mut start = 0;

    for end in 1..=semitones.len() {
        if end < semitones.len() && semitones[end] == semitones[start] {
            continue;
        }
        let frame_span = end - start;
        if let Some(midi_pitch) = semitones[start] {
            if frame_span >= min_frames {
                notes.push(Note {
                    midi_pitch,
                    start_frame: start,
                    frame_span,
                });
            }
        }
        start = end;
    }

    notes.retain(|n| (min_midi..=max_midi).contains(&n.midi_pitch));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(value: Option<i32>, len: usize) -> Vec<Option<i32>> {
        vec![value; len]
    }

    #[test]
    fn min_frames_boundary() {
        let mut track = run(Some(60), 2);
        track.extend(run(None, 1));
        track.extend(run(Some(62), 3));
        let notes = segment(&track, 3, 47, 64);
        assert_eq!(
            notes,
            vec![Note {
                midi_pitch: 62,
                start_frame: 3,
                frame_span: 3
            }]
        );
    }

    #[test]
    fn unvoiced_runs_never_become_notes() {
        let notes = segment(&run(None, 10), 3, 0, 127);
        assert!(notes.is_empty());
    }

    #[test]
    fn out_of_range_notes_are_dropped() {
        let mut track = run(Some(46), 4);
        track.extend(run(Some(55), 4));
        track.extend(run(Some(65), 4));
        let pitches: Vec<i32> = segment(&track, 3, 47, 64).iter().map(|n| n.midi_pitch).collect();
        assert_eq!(pitches, vec![55]);
    }

    #[test]
    fn trailing_run_is_kept() {
        let mut track = run(Some(60), 3);
        track.extend(run(Some(57), 5));
        let notes = segment(&track, 3, 47, 64);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].midi_pitch, 57);
        assert_eq!(notes[1].frame_span, 5);
    }

    #[test]
    fn repeated_pitch_split_by_short_run_stays_two_notes() {
        let mut track = run(Some(60), 3);
        track.extend(run(Some(61), 1));
        track.extend(run(Some(60), 3));
        let notes = segment(&track, 3, 47, 64);
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.midi_pitch == 60));
    }

    #[test]
    fn empty_track() {
        assert!(segment(&[], 3, 47, 64).is_empty());
    }
}
