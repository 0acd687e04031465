use std::path::{Path, PathBuf};

pub mod audio;
pub mod cli;
pub mod convert;
pub mod utils;

#[cfg(test)]
pub mod test_fixtures;

/// Extensions recognized as audio inputs. MP3 is included so existing MP3s
/// get re-encoded with normalized cover art.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "aac", "ogg", "wma", "m4a", "aiff", "ape", "opus",
];

/// Extensions recognized as video inputs (audio track is extracted).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "avi", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

pub fn is_convertible(path: &Path) -> bool {
    MediaKind::from_path(path).is_some()
}

pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub dry_run: bool,
    pub keep_original: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct FailedConversion {
    pub input_path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub input_path: PathBuf,
    pub reason: String,
}

/// Accumulated outcome of one batch run. Every discovered input lands in
/// exactly one of the three lists.
#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub successful: Vec<ConversionResult>,
    pub failed: Vec<FailedConversion>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Ffmpeg(String),
    #[error("ffprobe error: {0}")]
    Probe(String),
    #[error("Output verification failed")]
    Verification,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

// Re-exports for convenience
pub use audio::renamer::RenameResult;
pub use convert::batch::convert_directory;
pub use convert::ffmpeg::FfmpegTool;
pub use convert::{ConversionJob, MediaProbe, MediaTool, ProgressInfo};
