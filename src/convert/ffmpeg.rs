use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::{
    ConversionJob, MediaProbe, MediaTool, ProgressInfo, StreamInfo, TARGET_BITRATE_KBPS,
    TARGET_CHANNELS, TARGET_SAMPLE_RATE_HZ,
};
use crate::{ConvertError, MediaKind, Result};

/// Cover art is re-encoded to baseline JPEG and bounded to 640px on the long
/// edge without ever upscaling. Commas inside min() are escaped at the
/// filtergraph level.
const COVER_SCALE_FILTER: &str =
    "scale=iw*min(1\\,min(640/iw\\,640/ih)):ih*min(1\\,min(640/iw\\,640/ih))";

/// How many diagnostic stderr lines to keep for the failure message.
const DIAGNOSTIC_TAIL: usize = 8;

/// Production `MediaTool` backed by the ffmpeg and ffprobe binaries.
pub struct FfmpegTool {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }

    pub fn with_binaries(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn build_args(job: &ConversionJob) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            job.input_path.to_string_lossy().into_owned(),
            "-map_metadata".into(),
            "0".into(),
            "-map".into(),
            "0:a:0".into(),
        ];

        match job.kind {
            MediaKind::Audio => {
                // Carry an embedded cover over if one exists; absence is fine.
                args.extend([
                    "-map".into(),
                    "0:v?".into(),
                    "-c:v".into(),
                    "mjpeg".into(),
                    "-vf".into(),
                    COVER_SCALE_FILTER.into(),
                    "-q:v".into(),
                    "2".into(),
                ]);
            }
            MediaKind::Video => {
                args.push("-vn".into());
            }
        }

        args.extend([
            "-c:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            format!("{}k", TARGET_BITRATE_KBPS),
            "-ar".into(),
            TARGET_SAMPLE_RATE_HZ.to_string(),
            "-ac".into(),
            TARGET_CHANNELS.to_string(),
            "-id3v2_version".into(),
            "3".into(),
            "-write_id3v1".into(),
            "1".into(),
            "-v".into(),
            "error".into(),
            "-nostats".into(),
            "-progress".into(),
            "pipe:2".into(),
            job.output_path.to_string_lossy().into_owned(),
        ]);

        args
    }

    fn parse_probe_output(raw: &str) -> Result<MediaProbe> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
            #[serde(default)]
            tags: HashMap<String, String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(raw)
            .map_err(|e| ConvertError::Probe(format!("unparseable ffprobe output: {e}")))?;

        let (duration_secs, tags) = match probe.format {
            Some(format) => (
                format.duration.as_deref().and_then(|d| d.parse().ok()),
                format.tags,
            ),
            None => (None, HashMap::new()),
        };

        Ok(MediaProbe {
            streams: probe
                .streams
                .into_iter()
                .map(|s| StreamInfo {
                    codec_type: s.codec_type.unwrap_or_default(),
                    codec_name: s.codec_name,
                })
                .collect(),
            tags,
            duration_secs,
        })
    }
}

/// Accumulates `key=value` records from `-progress` output between record
/// boundaries.
#[derive(Default)]
struct ProgressState {
    out_time_secs: Option<f64>,
    fps: Option<f64>,
    kbps: Option<f64>,
    target_size: Option<u64>,
    timemark: Option<String>,
}

impl ProgressState {
    fn snapshot(&self, duration_secs: Option<f64>) -> ProgressInfo {
        let percent = match (self.out_time_secs, duration_secs) {
            (Some(t), Some(d)) if d > 0.0 => Some((t / d * 100.0).min(100.0)),
            _ => None,
        };
        ProgressInfo {
            percent,
            fps: self.fps,
            kbps: self.kbps,
            target_size: self.target_size,
            timemark: self.timemark.clone(),
        }
    }
}

/// Consume one stderr line. Returns true if it was part of the progress
/// stream, false if it is a diagnostic the caller should keep.
fn consume_progress_line(state: &mut ProgressState, line: &str) -> bool {
    let Some((key, value)) = line.trim().split_once('=') else {
        return false;
    };
    // Prose diagnostics can contain '='; real progress keys never contain
    // spaces.
    if key.contains(' ') {
        return false;
    }
    let value = value.trim();
    match key {
        "out_time_ms" | "out_time_us" => {
            if let Ok(us) = value.parse::<f64>() {
                state.out_time_secs = Some(us / 1_000_000.0);
            }
        }
        "out_time" => {
            state.timemark = Some(value.to_string());
        }
        "fps" => {
            state.fps = value.parse().ok();
        }
        "bitrate" => {
            state.kbps = value.strip_suffix("kbits/s").and_then(|v| v.parse().ok());
        }
        "total_size" => {
            state.target_size = value.parse().ok();
        }
        _ => {}
    }
    true
}

impl MediaTool for FfmpegTool {
    fn convert(
        &self,
        job: &ConversionJob,
        mut on_progress: Option<&mut dyn FnMut(&ProgressInfo)>,
    ) -> Result<()> {
        // Duration is only needed to turn the tool's elapsed time into a
        // percentage; a failed probe just means no percent is reported.
        let duration_secs = self.probe(&job.input_path).ok().and_then(|p| p.duration_secs);

        let args = Self::build_args(job);
        log::debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::Ffmpeg(format!(
                        "ffmpeg not found at {}",
                        self.ffmpeg_path.display()
                    ))
                } else {
                    ConvertError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr is piped");
        let reader = BufReader::new(stderr);

        let mut state = ProgressState::default();
        let mut diagnostics: Vec<String> = Vec::new();

        for line in reader.lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let key = line.trim().split('=').next().unwrap_or("");
            if key == "progress" {
                if let Some(callback) = on_progress.as_deref_mut() {
                    callback(&state.snapshot(duration_secs));
                }
            } else if !consume_progress_line(&mut state, &line) {
                if diagnostics.len() == DIAGNOSTIC_TAIL {
                    diagnostics.remove(0);
                }
                diagnostics.push(line.trim().to_string());
            }
        }

        let status = child.wait()?;
        if !status.success() {
            let detail = diagnostics
                .last()
                .cloned()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ConvertError::Ffmpeg(format!(
                "ffmpeg exited with {status}: {detail}"
            )));
        }

        Ok(())
    }

    fn probe(&self, path: &Path) -> Result<MediaProbe> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::Probe(format!(
                        "ffprobe not found at {}",
                        self.ffprobe_path.display()
                    ))
                } else {
                    ConvertError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConvertError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}
