use std::path::Path;

/// Ensure a directory exists, creating it if necessary.
///
/// An empty path (the parent of a bare file name) is the current directory.
pub fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Delete a leftover artifact from an earlier run.
///
/// Returns whether a file was removed. A missing file is not an error.
pub fn remove_stale_file(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
