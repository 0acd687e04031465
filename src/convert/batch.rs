use std::path::Path;

use super::{MediaTool, ProgressInfo};
use crate::audio::{renamer, scanner};
use crate::convert::pipeline;
use crate::utils::reporting::ProgressTracker;
use crate::{
    is_mp3, ConversionOptions, ConversionResult, ConversionSummary, ConvertError,
    FailedConversion, Result, SkippedFile,
};

/// Drive one pass over every convertible file under `directory`, strictly in
/// sorted order. Only a missing directory propagates as an error; every
/// per-file problem becomes a summary entry.
pub fn convert_directory(
    tool: &dyn MediaTool,
    directory: &Path,
    options: &ConversionOptions,
) -> Result<ConversionSummary> {
    let mut summary = ConversionSummary::default();

    if !scanner::directory_exists(directory) {
        return Err(ConvertError::DirectoryNotFound(directory.to_path_buf()));
    }

    println!("Scanning directory: {}", directory.display());
    let files = scanner::collect_convertible_files(directory);

    if files.is_empty() {
        println!("No audio files found to convert.");
        return Ok(summary);
    }

    println!("Found {} audio file(s) to process.", files.len());

    if options.dry_run {
        println!("\nDry run - would convert:");
        for file in &files {
            println!(
                "  {} -> {}",
                file.display(),
                pipeline::output_path_for(file).display()
            );
        }
        return Ok(summary);
    }

    let mut tracker = ProgressTracker::new(files.len());

    for input_path in files {
        let output_path = pipeline::output_path_for(&input_path);
        let mp3_input = is_mp3(&input_path);

        // MP3 inputs always go through a temp sibling, which cannot collide
        // with a previous run's final output.
        if !mp3_input && output_path.exists() {
            tracker.skip(&input_path, "output already exists");
            summary.skipped.push(SkippedFile {
                input_path,
                reason: "output already exists".to_string(),
            });
            continue;
        }

        tracker.start(&input_path);

        match process_file(tool, &input_path, &output_path, mp3_input, options, &mut tracker) {
            Ok(result) => {
                tracker.success(&input_path);
                summary.successful.push(result);
            }
            Err(err) => {
                let message = err.to_string();
                tracker.fail(&input_path, &message);
                summary.failed.push(FailedConversion {
                    input_path: input_path.clone(),
                    error: message,
                });
                // The original input is never touched on failure; only our
                // own partial output gets cleaned up.
                pipeline::cleanup_partial_output(&output_path);
            }
        }
    }

    tracker.finish(&summary);
    Ok(summary)
}

fn process_file(
    tool: &dyn MediaTool,
    input_path: &Path,
    output_path: &Path,
    mp3_input: bool,
    options: &ConversionOptions,
    tracker: &mut ProgressTracker,
) -> Result<ConversionResult> {
    log::debug!("Converting: {}", input_path.display());
    log::debug!("Output: {}", output_path.display());

    let mut on_progress = |progress: &ProgressInfo| tracker.update(progress);
    let mut result = pipeline::convert_to_mp3(tool, input_path, output_path, Some(&mut on_progress))?;

    if !pipeline::verify_output(tool, output_path) {
        return Err(ConvertError::Verification);
    }

    let final_path = pipeline::finalize_output(input_path, output_path)?;
    result.output_path = final_path.clone();

    let rename = renamer::rename_by_tags(tool, &final_path);
    if rename.renamed {
        log::debug!(
            "Renamed to: {}",
            rename.new_path.file_name().unwrap_or_default().to_string_lossy()
        );
    } else if let Some(reason) = &rename.reason {
        log::debug!("Not renamed: {reason}");
    }
    result.output_path = rename.new_path;

    // MP3 inputs were already consumed by finalize.
    if !options.keep_original && !mp3_input {
        pipeline::delete_file(input_path)?;
        log::debug!("Deleted original: {}", input_path.display());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FakeTool;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn options() -> ConversionOptions {
        ConversionOptions::default()
    }

    fn write_input(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"source data").unwrap();
        path
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn missing_directory_is_a_top_level_error() {
        let tool = FakeTool::new();
        let err = convert_directory(&tool, Path::new("/nonexistent/music"), &options());
        assert!(matches!(err, Err(ConvertError::DirectoryNotFound(_))));
    }

    #[test]
    fn empty_directory_yields_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FakeTool::new();
        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();
        assert!(summary.successful.is_empty());
        assert!(summary.failed.is_empty());
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn converts_and_renames_by_tags() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "sigur.flac");
        write_input(dir.path(), ".DS_Store");
        let tool = FakeTool::with_tags(&[("artist", "Sigur Rós"), ("title", "Track")]);

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        assert_eq!(summary.successful.len(), 1);
        assert!(summary.failed.is_empty());
        assert!(summary.skipped.is_empty());
        assert_eq!(
            summary.successful[0].output_path.file_name().unwrap(),
            "Sigur Ros - Track.mp3"
        );
        // Original consumed, hidden file untouched.
        assert_eq!(dir_entries(dir.path()), vec![".DS_Store", "Sigur Ros - Track.mp3"]);
    }

    #[test]
    fn keep_original_leaves_the_source_in_place() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "song.wav");
        let tool = FakeTool::with_tags(&[("artist", "A"), ("title", "B")]);
        let opts = ConversionOptions {
            keep_original: true,
            ..Default::default()
        };

        let summary = convert_directory(&tool, dir.path(), &opts).unwrap();

        assert_eq!(summary.successful.len(), 1);
        assert!(dir.path().join("song.wav").exists());
        assert!(dir.path().join("A - B.mp3").exists());
    }

    #[test]
    fn failed_conversion_is_recorded_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "corrupt.flac");
        let tool = FakeTool::new()
            .failing_with("ffmpeg exited with exit status: 1: Invalid data found")
            .leaving_partial_output(100);

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        assert!(summary.successful.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].error.contains("Invalid data"));
        // Partial output removed, original untouched.
        assert!(!dir.path().join("corrupt.mp3").exists());
        assert!(input.exists());
        assert_eq!(fs::read(&input).unwrap(), b"source data");
    }

    #[test]
    fn verification_failure_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "song.flac");
        let tool = FakeTool::with_tags(&[("artist", "A"), ("title", "B")]).without_audio_stream();

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].error.contains("verification"));
        assert!(!dir.path().join("song.mp3").exists());
        assert!(dir.path().join("song.flac").exists());
    }

    #[test]
    fn existing_output_skips_non_mp3_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "track.flac");
        write_input(dir.path(), "unrelated.mp3");
        fs::write(dir.path().join("track.mp3"), vec![0u8; 4096]).unwrap();
        let tool = FakeTool::new();

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(
            summary.skipped[0].input_path.file_name().unwrap(),
            "track.flac"
        );
        assert_eq!(summary.skipped[0].reason, "output already exists");
        // track.flac was not converted and not deleted.
        assert!(dir.path().join("track.flac").exists());
    }

    #[test]
    fn mp3_inputs_are_replaced_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "untagged.mp3");
        let tool = FakeTool::new();

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        assert_eq!(summary.successful.len(), 1);
        // No tags: the finalized file stays at the original path, re-encoded.
        assert_eq!(summary.successful[0].output_path, input);
        assert!(input.exists());
        assert_eq!(fs::read(&input).unwrap().len(), 4096);
        assert!(!dir.path().join("untagged.tmp.mp3").exists());
    }

    #[test]
    fn dry_run_touches_nothing_and_returns_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "a.flac");
        write_input(dir.path(), "b.mp3");
        let before = dir_entries(dir.path());
        // A fake that would fail loudly if any conversion were attempted.
        let tool = FakeTool::new().failing_with("dry run must not convert");
        let opts = ConversionOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = convert_directory(&tool, dir.path(), &opts).unwrap();

        assert!(summary.successful.is_empty());
        assert!(summary.failed.is_empty());
        assert!(summary.skipped.is_empty());
        assert_eq!(dir_entries(dir.path()), before);
    }

    #[test]
    fn every_input_lands_in_exactly_one_bucket() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "ok.wav");
        write_input(dir.path(), "skipme.flac");
        fs::write(dir.path().join("skipme.mp3"), vec![0u8; 4096]).unwrap();
        let tool = FakeTool::with_tags(&[("artist", "A"), ("title", "B")]);

        let summary = convert_directory(&tool, dir.path(), &options()).unwrap();

        let total = summary.successful.len() + summary.failed.len() + summary.skipped.len();
        // ok.wav converted, skipme.flac skipped, skipme.mp3 converted in place.
        assert_eq!(total, 3);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.successful.len(), 2);
    }
}
