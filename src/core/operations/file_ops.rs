use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Per-file failures. These are collected into run reports and never
/// abort a batch.
#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("Failed to copy {} to {}: {source}", src.display(), dst.display())]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite existing file {}", path.display())]
    WouldOverwrite { path: PathBuf },
}

/// Persists copied and synthetic samples
pub trait Materializer {
    /// Copy `src` to `dst` byte-for-byte, creating parent directories.
    /// Returns the number of bytes copied.
    fn copy(&self, src: &Path, dst: &Path) -> FileOpResult<u64>;

    /// Write a new file at `dst`. Never replaces an existing file.
    fn write(&self, bytes: &[u8], dst: &Path) -> FileOpResult<()>;
}

/// Local filesystem materializer
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMaterializer;

impl FsMaterializer {
    fn ensure_parent(path: &Path) -> FileOpResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| FileOpError::CreateDirFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Whether `a` and `b` resolve to the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Materializer for FsMaterializer {
    fn copy(&self, src: &Path, dst: &Path) -> FileOpResult<u64> {
        debug!("Copying {:?} to {:?}", src, dst);

        // Copying a file onto itself would truncate the source
        if same_file(src, dst) {
            error!("Copy destination {:?} is the source file", dst);
            return Err(FileOpError::WouldOverwrite {
                path: dst.to_path_buf(),
            });
        }

        Self::ensure_parent(dst)?;

        fs::copy(src, dst).map_err(|source| {
            error!("Failed to copy file from {:?} to {:?}: {}", src, dst, source);
            FileOpError::CopyFailed {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
                source,
            }
        })
    }

    fn write(&self, bytes: &[u8], dst: &Path) -> FileOpResult<()> {
        debug!("Writing {} bytes to {:?}", bytes.len(), dst);
        Self::ensure_parent(dst)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dst)
            .map_err(|source| {
                if source.kind() == ErrorKind::AlreadyExists {
                    FileOpError::WouldOverwrite {
                        path: dst.to_path_buf(),
                    }
                } else {
                    FileOpError::WriteFailed {
                        path: dst.to_path_buf(),
                        source,
                    }
                }
            })?;

        file.write_all(bytes).map_err(|source| {
            error!("Failed to write {:?}: {}", dst, source);
            // Don't leave a truncated output behind
            let _ = fs::remove_file(dst);
            FileOpError::WriteFailed {
                path: dst.to_path_buf(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.jpg");
        fs::write(&src, b"pixels").unwrap();
        let dst = tmp.path().join("out/train/weed_w1/a.jpg");

        let copied = FsMaterializer.copy(&src, &dst).unwrap();
        assert_eq!(copied, 6);
        assert_eq!(fs::read(&dst).unwrap(), b"pixels");
        // Source untouched
        assert_eq!(fs::read(&src).unwrap(), b"pixels");
    }

    #[test]
    fn test_copy_onto_itself_is_refused() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.jpg");
        fs::write(&src, b"pixels").unwrap();

        let result = FsMaterializer.copy(&src, &src);
        assert!(matches!(result, Err(FileOpError::WouldOverwrite { .. })));
        assert_eq!(fs::read(&src).unwrap(), b"pixels");
    }

    #[test]
    fn test_copy_missing_source() {
        let tmp = TempDir::new().unwrap();
        let result = FsMaterializer.copy(&tmp.path().join("nope.jpg"), &tmp.path().join("x.jpg"));
        assert!(matches!(result, Err(FileOpError::CopyFailed { .. })));
    }

    #[test]
    fn test_write_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let dst = tmp.path().join("class/a_aug0.jpg");

        FsMaterializer.write(b"first", &dst).unwrap();
        let second = FsMaterializer.write(b"second", &dst);

        assert!(matches!(second, Err(FileOpError::WouldOverwrite { .. })));
        assert_eq!(fs::read(&dst).unwrap(), b"first");
    }
}
