use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{MediaKind, Result};

pub mod batch;
pub mod ffmpeg;
pub mod pipeline;

/// Target encoding applied to every output, regardless of source format.
pub const TARGET_BITRATE_KBPS: u32 = 320;
pub const TARGET_SAMPLE_RATE_HZ: u32 = 44_100;
pub const TARGET_CHANNELS: u32 = 2;

/// One unit of work handed to the external tool.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: MediaKind,
}

/// Snapshot relayed from the external tool while a conversion runs. Not
/// retained after the callback returns.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    pub percent: Option<f64>,
    pub fps: Option<f64>,
    pub kbps: Option<f64>,
    pub target_size: Option<u64>,
    pub timemark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub codec_type: String,
    pub codec_name: Option<String>,
}

/// Result of probing a media file: stream list, format-level tags, duration.
#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    pub streams: Vec<StreamInfo>,
    pub tags: HashMap<String, String>,
    pub duration_secs: Option<f64>,
}

impl MediaProbe {
    pub fn has_audio_stream(&self) -> bool {
        self.streams.iter().any(|s| s.codec_type == "audio")
    }

    /// Tag lookup accepting lowercase or uppercase keys; lowercase wins when
    /// both are present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .or_else(|| self.tags.get(&key.to_uppercase()))
            .map(String::as_str)
    }
}

/// Boundary to the external transcoding tool. `convert` runs one job to a
/// single terminal success or failure; `probe` inspects a file without
/// touching it.
pub trait MediaTool {
    fn convert(
        &self,
        job: &ConversionJob,
        on_progress: Option<&mut dyn FnMut(&ProgressInfo)>,
    ) -> Result<()>;

    fn probe(&self, path: &Path) -> Result<MediaProbe>;
}
