use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively collect every file under `dir` with the given extension, sorted by path.
pub fn collect_file_paths(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
