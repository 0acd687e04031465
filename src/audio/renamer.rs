use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::MediaTool;
use crate::utils::sanitize::sanitize_filename;

/// Giving up after this many ` (n)` suffixes counts as a rename failure.
const MAX_RENAME_ATTEMPTS: u32 = 999;

#[derive(Debug, Clone)]
pub struct RenameResult {
    pub new_path: PathBuf,
    pub renamed: bool,
    pub reason: Option<String>,
}

impl RenameResult {
    fn unchanged(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            new_path: path.to_path_buf(),
            renamed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Rename a finalized file to "Artist - Title.mp3" from its embedded tags.
/// Best-effort by contract: every failure mode comes back as an unrenamed
/// result with a reason, never as an error.
pub fn rename_by_tags(tool: &dyn MediaTool, path: &Path) -> RenameResult {
    let (artist, title) = read_tags(tool, path);

    let artist = artist.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let (Some(artist), Some(title)) = (artist.clone(), title.clone()) else {
        return RenameResult::unchanged(
            path,
            format!(
                "Missing tags (artist: {}, title: {})",
                artist.as_deref().unwrap_or("none"),
                title.as_deref().unwrap_or("none")
            ),
        );
    };

    let new_name = sanitize_filename(&format!("{artist} - {title}"));
    let current_name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    if current_name.as_deref() == Some(new_name.as_str()) {
        return RenameResult::unchanged(path, "Already named correctly");
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3")
        .to_string();

    let Some(new_path) = resolve_collision(dir, &new_name, &ext) else {
        return RenameResult::unchanged(
            path,
            format!("Rename failed: no free filename for \"{new_name}\" after {MAX_RENAME_ATTEMPTS} attempts"),
        );
    };

    match fs::rename(path, &new_path) {
        Ok(()) => RenameResult {
            new_path,
            renamed: true,
            reason: None,
        },
        Err(e) => RenameResult::unchanged(path, format!("Rename failed: {e}")),
    }
}

fn read_tags(tool: &dyn MediaTool, path: &Path) -> (Option<String>, Option<String>) {
    match tool.probe(path) {
        Ok(probe) => (
            probe.tag("artist").map(str::to_string),
            probe.tag("title").map(str::to_string),
        ),
        // A file we cannot probe simply has no usable tags.
        Err(_) => (None, None),
    }
}

/// First free path among `name.ext`, `name (1).ext`, ..., `name (999).ext`.
fn resolve_collision(dir: &Path, name: &str, ext: &str) -> Option<PathBuf> {
    let candidate = dir.join(format!("{name}.{ext}"));
    if !candidate.exists() {
        return Some(candidate);
    }
    for n in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = dir.join(format!("{name} ({n}).{ext}"));
        if !candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
