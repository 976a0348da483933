//! Local path analysis
//!
//! A file is classified directly; a directory is walked recursively and each
//! file beneath it is classified on its own, so one unreadable file never
//! aborts the rest of the walk.

use crate::classify::{guess_content_type, summarize, UNKNOWN_CONTENT_TYPE};
use crate::types::{AnalysisResult, DirectoryResult, PathAnalysis};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use walkdir::WalkDir;

/// Prefix for per-file I/O failures
pub const READ_FAILED_PREFIX: &str = "Error reading file: ";

/// Analyze a file, or every file beneath a directory
pub async fn analyze_path(path: impl AsRef<Path>, max_bytes: u64) -> PathAnalysis {
    let path = path.as_ref();

    // Follows symlinks, so a dangling link reports as missing
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("stat {} failed: {}", path.display(), e);
            return AnalysisResult::error(format!("Path not found: {}", path.display())).into();
        }
    };

    if metadata.is_file() {
        classify_file(path, max_bytes).await.into()
    } else if metadata.is_dir() {
        analyze_directory(path, max_bytes).await
    } else {
        AnalysisResult::error("Path is neither file nor directory").into()
    }
}

/// Classify a single file against `max_bytes`
///
/// The MIME type comes from the file extension. Files over the ceiling are
/// rejected from their metadata without being read.
pub async fn classify_file(path: impl AsRef<Path>, max_bytes: u64) -> AnalysisResult {
    let path = path.as_ref();
    let content_type = guess_content_type(path).unwrap_or(UNKNOWN_CONTENT_TYPE);

    match read_bounded(path, max_bytes).await {
        Ok(bytes) => summarize(content_type, &bytes),
        Err(e) if e.is_too_large() => AnalysisResult::error(e.to_string()),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            AnalysisResult::error(format!("{}{}", READ_FAILED_PREFIX, e))
        }
    }
}

async fn read_bounded(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        )
        .into());
    }
    if metadata.len() > max_bytes {
        return Err(Error::too_large("File", max_bytes));
    }

    // The file may grow between stat and read
    let file = tokio::fs::File::open(path).await?;
    let mut bytes = Vec::with_capacity(metadata.len() as usize);
    file.take(max_bytes.saturating_add(1)).read_to_end(&mut bytes).await?;
    if bytes.len() as u64 > max_bytes {
        return Err(Error::too_large("File", max_bytes));
    }

    Ok(bytes)
}

async fn analyze_directory(path: &Path, max_bytes: u64) -> PathAnalysis {
    let root = match tokio::fs::canonicalize(path).await {
        Ok(root) => root,
        Err(e) => {
            return AnalysisResult::error(format!("{}{}", READ_FAILED_PREFIX, e)).into();
        }
    };

    tracing::info!("Walking {}", root.display());

    let entries = match tokio::task::spawn_blocking(move || walk(&root)).await {
        Ok(entries) => entries,
        Err(e) => {
            return AnalysisResult::error(format!("Directory walk failed: {}", e)).into();
        }
    };

    let mut result = DirectoryResult::new();
    for entry in entries {
        match entry {
            WalkEntry::File(file) => {
                let analysis = classify_file(&file, max_bytes).await;
                record(&mut result, &file, analysis);
            }
            WalkEntry::Failed(at, message) => {
                record(
                    &mut result,
                    &at,
                    AnalysisResult::error(format!("{}{}", READ_FAILED_PREFIX, message)),
                );
            }
        }
    }

    tracing::debug!("Analyzed {} files", result.len());
    result.into()
}

/// Keys are lossy UTF-8, so distinct non-UTF-8 names can collide
fn record(result: &mut DirectoryResult, path: &Path, analysis: AnalysisResult) {
    let key = path.to_string_lossy();
    if result.insert(key.to_string(), analysis).is_some() {
        tracing::warn!("Duplicate result key {}, earlier entry replaced", key);
    }
}

enum WalkEntry {
    File(PathBuf),
    Failed(PathBuf, String),
}

/// Every non-directory entry under `root`; symlinked directories are not
/// descended into
fn walk(root: &Path) -> Vec<WalkEntry> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    continue;
                }
                if entry.path_is_symlink() && entry.path().is_dir() {
                    continue;
                }
                entries.push(WalkEntry::File(entry.into_path()));
            }
            Err(e) => {
                let at = e.path().unwrap_or(root).to_path_buf();
                entries.push(WalkEntry::Failed(at, e.to_string()));
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_SIZE;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_analyze_text_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, "hello world").unwrap();

        let result = analyze_path(&file, DEFAULT_MAX_SIZE).await;
        match result.as_file().unwrap() {
            AnalysisResult::Text(t) => {
                assert_eq!(t.content_type, "text/plain");
                assert!(t.preview.contains("hello"));
                assert_eq!(t.byte_size, 11);
            }
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, vec![b'a'; DEFAULT_MAX_SIZE as usize + 1]).unwrap();

        let result = analyze_path(&file, DEFAULT_MAX_SIZE).await;
        assert_eq!(result.error_message(), Some("File too large (>5 MB)"));
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, vec![b'a'; 2048]).unwrap();

        let result = analyze_path(&file, 1024).await;
        assert!(result.error_message().unwrap().contains("too large"));

        let result = analyze_path(&file, 2048).await;
        assert_eq!(result.as_file().unwrap().byte_size(), Some(2048));
    }

    #[tokio::test]
    async fn test_unbounded_limit() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello world").unwrap();

        let result = classify_file(&file, u64::MAX).await;
        assert_eq!(result.byte_size(), Some(11));
        assert_eq!(result, summarize("text/plain", b"hello world"));
    }

    #[tokio::test]
    async fn test_path_not_found() {
        let result = analyze_path("/path/does/not/exist.txt", DEFAULT_MAX_SIZE).await;
        let message = result.error_message().unwrap();
        assert!(message.to_lowercase().contains("not found"));
        assert!(message.contains("/path/does/not/exist.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_broken_symlink() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("broken");
        std::os::unix::fs::symlink("/does/not/exist", &link).unwrap();

        let result = analyze_path(&link, DEFAULT_MAX_SIZE).await;
        let message = result.error_message().unwrap().to_lowercase();
        assert!(message.contains("not found") || message.contains("neither file nor directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_special_file() {
        let result = analyze_path("/dev/null", DEFAULT_MAX_SIZE).await;
        assert_eq!(result.error_message(), Some("Path is neither file nor directory"));
    }

    #[tokio::test]
    async fn test_directory_text_and_binary() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let binary = dir.path().join("b.bin");
        std::fs::write(&text, "hello world").unwrap();
        std::fs::write(&binary, [0x00, 0x01, 0x02]).unwrap();

        let result = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        let files = result.as_directory().unwrap();
        assert_eq!(files.len(), 2);

        let root = std::fs::canonicalize(dir.path()).unwrap();
        let text_key = root.join("a.txt").to_string_lossy().to_string();
        let binary_key = root.join("b.bin").to_string_lossy().to_string();

        assert_eq!(files.get(&text_key).unwrap().kind(), "text");
        match files.get(&binary_key).unwrap() {
            AnalysisResult::Binary(b) => assert_eq!(b.preview_bytes, "000102"),
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_directory_recurses() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
        std::fs::write(dir.path().join("top.txt"), "top").unwrap();
        std::fs::write(dir.path().join("x/y/z/deep.txt"), "deep").unwrap();

        let result = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        let files = result.as_directory().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|(k, _)| Path::new(k).is_absolute()));
        assert!(files.iter().any(|(k, _)| k.ends_with("deep.txt")));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let result = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        assert!(result.as_directory().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_directory_isolates_failures_and_skips_dir_links() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("hidden.txt"), "outside").unwrap();

        std::fs::write(dir.path().join("ok.txt"), "fine").unwrap();
        std::os::unix::fs::symlink("/does/not/exist", dir.path().join("dangling")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();

        let result = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        let files = result.as_directory().unwrap();
        assert_eq!(files.len(), 2);

        let root = std::fs::canonicalize(dir.path()).unwrap();
        let ok = files.get(&root.join("ok.txt").to_string_lossy().to_string()).unwrap();
        assert_eq!(ok.kind(), "text");

        let dangling = files
            .get(&root.join("dangling").to_string_lossy().to_string())
            .unwrap();
        assert!(dangling.error_message().unwrap().starts_with(READ_FAILED_PREFIX));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_lossy_name_collision_keeps_one_entry() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"name\xff")), "one").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"name\xfe")), "two").unwrap();

        let result = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        let files = result.as_directory().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.iter().all(|(k, _)| k.ends_with("name\u{FFFD}")));
    }

    #[tokio::test]
    async fn test_classify_file_matches_in_memory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        let bytes = b"line one\nline two has more words\r\nthree\n";
        std::fs::write(&file, bytes).unwrap();

        let from_disk = classify_file(&file, DEFAULT_MAX_SIZE).await;
        let in_memory = summarize("text/plain", bytes);
        assert_eq!(from_disk, in_memory);
    }

    #[tokio::test]
    async fn test_repeated_analysis_is_identical() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.dat"), [1u8, 2, 3]).unwrap();

        let first = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        let second = analyze_path(dir.path(), DEFAULT_MAX_SIZE).await;
        assert_eq!(first, second);
    }
}
