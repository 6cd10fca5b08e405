//! File system helpers shared across the codebase.
//!
//! Writes go through a temporary file followed by a rename, so a crash
//! mid-write never leaves a half-written manifest or log behind.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Create a directory and any missing parents.
///
/// # Errors
///
/// IO errors from the underlying create call.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Read a file into a string.
///
/// # Errors
///
/// IO errors, including the file not existing.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories as needed.
///
/// The content lands in `<path>.tmp` first and is renamed over the target
/// after a successful flush, so readers only ever observe the old or the
/// new content.
///
/// # Errors
///
/// IO errors from any step of the write.
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temporary file: {}", temp_path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to: {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync: {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to move {} into place as {}",
            temp_path.display(),
            path.display()
        )
    })
}

/// Delete a file if it exists; missing files are not an error.
///
/// # Errors
///
/// IO errors other than the file being absent.
pub fn remove_file_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.yaml");

        write_text_file(&path, "dependencies: []\n").unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "dependencies: []\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn write_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("file.txt");

        write_text_file(&path, "content").unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "content");
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");

        write_text_file(&path, "first").unwrap();
        write_text_file(&path, "second").unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "second");
    }

    #[test]
    fn reading_a_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let err = read_text_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn removing_a_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.log");

        remove_file_if_present(&path).unwrap();

        write_text_file(&path, "stale").unwrap();
        remove_file_if_present(&path).unwrap();
        assert!(!path.exists());
    }
}
