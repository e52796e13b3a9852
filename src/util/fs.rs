//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Remove a directory and all its contents, if it exists.
///
/// Returns whether anything was removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
        return Ok(true);
    }
    Ok(false)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).with_context(|| {
        format!("failed to copy {} to {}", src.display(), dst.display())
    })?;
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
///
/// On Windows the `\\?\` verbatim prefix is dropped where possible; CMake
/// does not accept it.
pub fn normalize_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Total size in bytes of the regular files under `path`.
pub fn dir_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_size() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/one"), "12345").unwrap();
        fs::write(tmp.path().join("a/b/two"), "123").unwrap();

        assert_eq!(dir_size(tmp.path()), 8);
        assert_eq!(dir_size(&tmp.path().join("missing")), 0);
    }

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let ops = tmp.path().join("triton").join("ops");
        fs::create_dir_all(&ops).unwrap();
        fs::write(ops.join("softmax.c"), "void softmax() {}").unwrap();
        fs::write(ops.join("matmul.c"), "void matmul() {}").unwrap();
        fs::write(ops.join("__init__.py"), "").unwrap();

        let files = glob_files(tmp.path(), &["triton/ops/*.c".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build");
        fs::create_dir_all(dir.join("nested")).unwrap();

        assert!(remove_dir_all_if_exists(&dir).unwrap());
        assert!(!dir.exists());
        assert!(!remove_dir_all_if_exists(&dir).unwrap());
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "content").unwrap();

        let dst = tmp.path().join("x").join("y").join("a.txt");
        copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst).unwrap(), "content");
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("/proj/python"), Path::new("/proj/python/triton/ops"));
        assert_eq!(rel, PathBuf::from("triton/ops"));
    }

    #[test]
    fn test_normalize_path_is_plain() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("src");
        fs::create_dir_all(&dir).unwrap();

        let normalized = normalize_path(&dir.join("..").join("src"));
        assert!(normalized.is_absolute());
        assert!(!normalized.to_string_lossy().starts_with(r"\\?\"));
        assert!(normalized.ends_with("src"));

        let missing = tmp.path().join("missing");
        assert_eq!(normalize_path(&missing), missing);
    }
}
