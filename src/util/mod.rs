//! Filesystem utility helpers.

pub mod fs;

pub use fs::{ensure_dir_exists, remove_stale_file};
