use std::fs;
use std::path::{Path, PathBuf};

use super::{ConversionJob, MediaTool, ProgressInfo};
use crate::utils::sanitize::sanitize_filename;
use crate::{is_mp3, ConversionResult, MediaKind, Result};

/// Outputs smaller than this are considered broken regardless of content.
const MIN_OUTPUT_BYTES: u64 = 1024;

const TMP_SUFFIX: &str = ".tmp.mp3";

/// Deterministic output path for an input. MP3 inputs convert to a temp
/// sibling so the source survives until the conversion is known good.
pub fn output_path_for(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = sanitize_filename(&stem);

    if is_mp3(input) {
        dir.join(format!("{base}{TMP_SUFFIX}"))
    } else {
        dir.join(format!("{base}.mp3"))
    }
}

fn is_tmp_output(output: &Path) -> bool {
    output
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(TMP_SUFFIX))
        .unwrap_or(false)
}

/// Run one conversion through the external tool. Resolves only on the tool's
/// terminal success; the error otherwise carries the tool's own message.
pub fn convert_to_mp3(
    tool: &dyn MediaTool,
    input: &Path,
    output: &Path,
    on_progress: Option<&mut dyn FnMut(&ProgressInfo)>,
) -> Result<ConversionResult> {
    let kind = MediaKind::from_path(input).unwrap_or(MediaKind::Audio);
    let job = ConversionJob {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        kind,
    };
    tool.convert(&job, on_progress)?;
    Ok(ConversionResult {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        success: true,
    })
}

/// Check that a conversion actually produced a playable file. Returns false
/// rather than erroring: an unstattable file, a file under 1 KiB, a failed
/// probe, or a probe without an audio stream all mean "not verified".
pub fn verify_output(tool: &dyn MediaTool, output: &Path) -> bool {
    let Ok(metadata) = fs::metadata(output) else {
        return false;
    };
    if metadata.len() < MIN_OUTPUT_BYTES {
        return false;
    }
    match tool.probe(output) {
        Ok(probe) => probe.has_audio_stream(),
        Err(_) => false,
    }
}

/// For in-place MP3 conversions, replace the original with the temp output.
/// The delete happens before the rename, so there is a brief window with no
/// file at the final path if the process dies between the two calls.
pub fn finalize_output(input: &Path, output: &Path) -> Result<PathBuf> {
    if is_tmp_output(output) {
        fs::remove_file(input)?;
        fs::rename(output, input)?;
        return Ok(input.to_path_buf());
    }
    Ok(output.to_path_buf())
}

/// Best-effort removal of a partial output after a failed conversion. The
/// file may legitimately not exist.
pub fn cleanup_partial_output(output: &Path) {
    let _ = fs::remove_file(output);
}

pub fn delete_file(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    Ok(())
}
