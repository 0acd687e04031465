use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "music-convert")]
#[command(version = "1.0")]
#[command(about = "Convert audio files to MP3 (320kbps, 44.1kHz, Stereo)", long_about = None)]
pub struct Cli {
    /// Directory to scan for audio files
    pub directory: PathBuf,

    /// Show what would be converted without converting
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Keep original files after conversion
    #[arg(short = 'k', long)]
    pub keep_original: bool,

    /// Show detailed FFmpeg output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
