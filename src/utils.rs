//! Utility functions for nextword-rs
//!
//! This module provides path helpers used to derive batch and document ids,
//! plus small formatting helpers for progress and size reporting.

use crate::error::{NextwordError, Result};
use std::path::{Path, PathBuf};

/// Get file extension from path
pub fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check whether the file extension is one of `extensions` (case-insensitive)
pub fn has_extension<P: AsRef<Path>>(path: P, extensions: &[String]) -> bool {
    match get_file_extension(path) {
        Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Batch id of a source directory: its base name
pub fn batch_id_from_dir<P: AsRef<Path>>(dir: P) -> Option<String> {
    dir.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
}

/// Document id of a source file: its base name without the extension
pub fn document_id_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
}

/// Format file size in human readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Calculate progress percentage
pub fn calculate_progress(current: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        (current as f32 / total as f32) * 100.0
    }
}

/// Validate and normalize a directory path.
///
/// Canonicalizing turns `.` or a trailing slash into a path whose base name
/// is the real directory name.
pub fn normalize_dir<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Err(NextwordError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", path.display()),
        )));
    }

    path.canonicalize().map_err(NextwordError::Io)
}

/// Create the parent directory of `path` if it doesn't exist
pub fn ensure_parent_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(NextwordError::Io)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_extension() {
        assert_eq!(get_file_extension("d1.json"), Some("json".to_string()));
        assert_eq!(get_file_extension("d1.JSON"), Some("json".to_string()));
        assert_eq!(get_file_extension("d1"), None);
        assert_eq!(get_file_extension("d1.tar.gz"), Some("gz".to_string()));
    }

    #[test]
    fn test_has_extension() {
        let extensions = vec!["json".to_string()];
        assert!(has_extension("a.json", &extensions));
        assert!(has_extension("a.Json", &extensions));
        assert!(!has_extension("a.txt", &extensions));
        assert!(!has_extension("json", &extensions));
    }

    #[test]
    fn test_id_derivation() {
        assert_eq!(
            batch_id_from_dir("/data/TL_01. KAKAO(1)"),
            Some("TL_01. KAKAO(1)".to_string())
        );
        assert_eq!(batch_id_from_dir("/"), None);
        assert_eq!(
            document_id_from_path("/data/kakao1/KAKAO_0001.json"),
            Some("KAKAO_0001".to_string())
        );
        // Only the final extension is stripped
        assert_eq!(
            document_id_from_path("/data/kakao1/dialog.v2.json"),
            Some("dialog.v2".to_string())
        );
    }

    #[test]
    fn test_file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_progress_calculation() {
        assert_eq!(calculate_progress(0, 100), 0.0);
        assert_eq!(calculate_progress(50, 100), 50.0);
        assert_eq!(calculate_progress(0, 0), 0.0); // Edge case
    }

    #[test]
    fn test_normalize_dir() {
        let temp_dir = tempdir().unwrap();
        let kakao = temp_dir.path().join("kakao1");
        std::fs::create_dir(&kakao).unwrap();

        let normalized = normalize_dir(kakao.join(".")).unwrap();
        assert!(normalized.is_absolute());
        assert_eq!(batch_id_from_dir(&normalized), Some("kakao1".to_string()));

        assert!(normalize_dir(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_ensure_parent_directory() {
        let temp_dir = tempdir().unwrap();
        let db = temp_dir.path().join("nested/dir/nextword.db");
        ensure_parent_directory(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_parent_directory("nextword.db").unwrap();
    }
}
