use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "melodex", about = "Identify songs from a short hummed or played melody")]
pub struct Cli {
    /// Audio clip to identify (WAV, MP3, FLAC, OGG). Only the first clip length is used.
    pub input: Option<PathBuf>,

    /// Record the clip from the default microphone instead of reading a file
    #[arg(short, long, conflicts_with = "input")]
    pub record: bool,

    /// Song catalog (.json, .db, .sqlite)
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the detected notes to stderr
    #[arg(long)]
    pub show_notes: bool,

    /// Emit single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}
