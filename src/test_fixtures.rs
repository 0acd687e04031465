//! Shared test doubles. Only compiled for tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::convert::{ConversionJob, MediaProbe, MediaTool, ProgressInfo, StreamInfo};
use crate::{ConvertError, Result};

/// In-memory stand-in for ffmpeg/ffprobe. Conversions write a plausible
/// output file; probes answer from canned tags.
pub struct FakeTool {
    tags: HashMap<String, String>,
    has_audio: bool,
    convert_error: Option<String>,
    partial_bytes: Option<usize>,
    probe_error: bool,
}

impl Default for FakeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTool {
    pub fn new() -> Self {
        Self {
            tags: HashMap::new(),
            has_audio: true,
            convert_error: None,
            partial_bytes: None,
            probe_error: false,
        }
    }

    pub fn with_tags(pairs: &[(&str, &str)]) -> Self {
        let mut tool = Self::new();
        tool.tags = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        tool
    }

    pub fn without_audio_stream(mut self) -> Self {
        self.has_audio = false;
        self
    }

    /// Every conversion fails with this message, leaving no output behind.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.convert_error = Some(message.to_string());
        self
    }

    /// Failed conversions leave a truncated output file behind.
    pub fn leaving_partial_output(mut self, bytes: usize) -> Self {
        self.partial_bytes = Some(bytes);
        self
    }

    pub fn with_probe_error(mut self) -> Self {
        self.probe_error = true;
        self
    }
}

impl MediaTool for FakeTool {
    fn convert(
        &self,
        job: &ConversionJob,
        on_progress: Option<&mut dyn FnMut(&ProgressInfo)>,
    ) -> Result<()> {
        if let Some(message) = &self.convert_error {
            if let Some(bytes) = self.partial_bytes {
                let _ = fs::write(&job.output_path, vec![0u8; bytes]);
            }
            return Err(ConvertError::Ffmpeg(message.clone()));
        }

        fs::write(&job.output_path, vec![0u8; 4096])?;

        if let Some(callback) = on_progress {
            callback(&ProgressInfo {
                percent: Some(50.0),
                ..Default::default()
            });
            callback(&ProgressInfo {
                percent: Some(100.0),
                ..Default::default()
            });
        }
        Ok(())
    }

    fn probe(&self, _path: &Path) -> Result<MediaProbe> {
        if self.probe_error {
            return Err(ConvertError::Probe("probe failed".to_string()));
        }
        let streams = if self.has_audio {
            vec![StreamInfo {
                codec_type: "audio".to_string(),
                codec_name: Some("mp3".to_string()),
            }]
        } else {
            vec![]
        };
        Ok(MediaProbe {
            streams,
            tags: self.tags.clone(),
            duration_secs: Some(60.0),
        })
    }
}
