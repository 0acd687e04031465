use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::is_convertible;

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Lazy depth-first walk yielding convertible files. Hidden entries are
/// neither yielded nor descended into; unreadable directories are skipped
/// without reporting.
pub fn scan_directory(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_convertible(entry.path()))
        .map(|entry| entry.into_path())
}

/// Materialize the scan as a sorted list of absolute paths so processing
/// order is reproducible across runs.
pub fn collect_convertible_files(root: &Path) -> Vec<PathBuf> {
    let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut files: Vec<PathBuf> = scan_directory(&root).collect();
    files.sort();
    files
}

pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}
