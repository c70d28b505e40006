mod audio;
mod catalog;
mod cli;
mod config;
mod error;
mod matching;
mod melody;
mod response;
mod session;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::Config;
use response::Response;
use session::ClipSource;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None if cli.config.is_some() => {
                anyhow::bail!("Failed to load config from {}", path.display());
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    let catalog_path = cli.catalog.clone().or_else(|| config.catalog.path.clone());
    let source = if cli.record {
        ClipSource::Microphone
    } else {
        let input = cli
            .input
            .as_deref()
            .context("Input audio file is required (or pass --record)")?;
        ClipSource::File(input)
    };

    let response = match session::run(source, catalog_path.as_deref(), &config) {
        Ok((transcription, response)) => {
            if cli.show_notes {
                let voiced = transcription.voiced_frames();
                let mean_clarity = if voiced > 0 {
                    transcription
                        .estimates
                        .iter()
                        .filter(|e| e.is_voiced())
                        .map(|e| e.clarity)
                        .sum::<f32>()
                        / voiced as f32
                } else {
                    0.0
                };
                eprintln!(
                    "{} Hz, energy threshold {:.6}, {}/{} frames voiced (mean clarity {:.2})",
                    transcription.context.sample_rate,
                    transcription.context.energy_threshold,
                    voiced,
                    transcription.semitones.len(),
                    mean_clarity
                );
                for note in &transcription.notes {
                    eprintln!(
                        "note {:>3}  frames {:>4}..{:<4}",
                        note.midi_pitch,
                        note.start_frame,
                        note.start_frame + note.frame_span
                    );
                }
            }
            response
        }
        Err(err) => {
            log::error!("{}", err);
            Response::failure(&err)
        }
    };

    let payload = if cli.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{}", payload);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

