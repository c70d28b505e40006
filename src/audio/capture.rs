//! Microphone capture of a fixed-length clip.
//!
//! Only compiled against a real device when the `capture` feature is on;
//! otherwise every call fails with [`MelodyError::Capture`].

use super::Clip;
use crate::error::{MelodyError, Result};

/// Record `seconds` of mono audio from the default input device.
///
/// Blocks until the clip is full.
#[cfg(feature = "capture")]
pub fn capture_clip(seconds: f32, sample_rate: u32) -> Result<Clip> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::time::Duration;

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| MelodyError::Capture("no input device available".into()))?;

    let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());
    log::info!("Using audio input device: {}", device_name);

    let configs = device
        .supported_input_configs()
        .map_err(|e| MelodyError::Capture(e.to_string()))?
        .collect::<Vec<_>>();
    let supported = find_supported_config(configs, sample_rate).ok_or_else(|| {
        MelodyError::Capture(format!("no f32 input format at {} Hz", sample_rate))
    })?;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();

    let wanted = super::clip_len(seconds, sample_rate);
    let (sender, receiver) = crossbeam_channel::unbounded::<Vec<f32>>();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut mono = Vec::with_capacity(data.len() / channels.max(1));
                super::downmix(data, channels, &mut mono);
                let _ = sender.send(mono);
            },
            |err| log::error!("Audio input stream error: {}", err),
            None,
        )
        .map_err(|e| MelodyError::Capture(e.to_string()))?;

    stream
        .play()
        .map_err(|e| MelodyError::Capture(e.to_string()))?;
    log::info!("Recording {:.1}s...", seconds);

    // Clip length plus 5s; a device that stalls past this is an error.
    let deadline = Duration::from_secs_f32(seconds.max(0.0) + 5.0);
    let started = std::time::Instant::now();
    let mut samples = Vec::with_capacity(wanted);
    while samples.len() < wanted {
        let remaining = deadline
            .checked_sub(started.elapsed())
            .ok_or_else(|| MelodyError::Capture("input device stopped delivering audio".into()))?;
        match receiver.recv_timeout(remaining) {
            Ok(chunk) => samples.extend_from_slice(&chunk),
            Err(_) => {
                return Err(MelodyError::Capture(
                    "input device stopped delivering audio".into(),
                ))
            }
        }
    }
    drop(stream);
    samples.truncate(wanted);
    log::info!("Recording finished: {} samples", samples.len());

    Ok(Clip {
        samples,
        sample_rate,
    })
}

#[cfg(feature = "capture")]
fn find_supported_config(
    configs: Vec<cpal::SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<cpal::SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .min_by_key(|c| c.channels())
}

#[cfg(not(feature = "capture"))]
pub fn capture_clip(_seconds: f32, _sample_rate: u32) -> Result<Clip> {
    Err(MelodyError::Capture(
        "microphone capture requires the 'capture' feature; rebuild with: cargo build --features capture"
            .into(),
    ))
}
