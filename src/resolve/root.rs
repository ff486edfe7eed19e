use std::path::{Path, PathBuf};

/// Directory whose presence marks the project source root.
pub const DEFAULT_ROOT_MARKER: &str = "libs";

/// Walk upward from `start` looking for a directory that contains `marker`.
///
/// Returns `start` unchanged when no ancestor has the marker. The filesystem
/// root itself is never reported.
pub fn find_project_root(start: &Path, marker: &str) -> PathBuf {
    let absolute = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());

    for dir in absolute.ancestors() {
        if dir.parent().is_none() {
            break;
        }
        if dir.join(marker).exists() {
            return dir.to_path_buf();
        }
    }

    tracing::debug!(start = %start.display(), marker, "no project root marker found");
    start.to_path_buf()
}
