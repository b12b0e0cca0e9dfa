//! Durable, crash-tolerant persistence of the append-only record log.
//!
//! The file is never held open across caller-visible time: every operation
//! opens, does its work, and closes, so scans and appends from concurrent
//! callers do not contend on a long-lived handle. A scan may or may not
//! observe an append racing with it; there is no read-after-write guarantee
//! across distinct calls.

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::{Result, StoreError};

pub struct BackingFile {
    path: PathBuf,
}

impl BackingFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the containing directory and an empty file if absent.
    ///
    /// Failures here are fatal to store construction: the store never runs
    /// in a degraded in-memory-only mode.
    pub fn ensure_exists(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!(
                    "failed to create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Append-mode create: never truncates a file that appeared between
        // the check and the open.
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| {
                StoreError::Io(format!("failed to open {}: {}", self.path.display(), e))
            })?;
        Ok(())
    }

    /// Drain the file's current contents as raw lines. Open, read, close.
    pub fn scan(&self) -> Result<Vec<String>> {
        let file = File::open(&self.path).map_err(|e| {
            StoreError::Io(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()
            .map_err(|e| StoreError::Io(format!("failed to read {}: {}", self.path.display(), e)))
    }

    /// Append one line plus terminator, synced to disk before returning.
    pub fn append(&self, line: &str) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| {
                StoreError::Io(format!("failed to open {}: {}", self.path.display(), e))
            })?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| {
                StoreError::Io(format!("failed to append to {}: {}", self.path.display(), e))
            })?;
        writer.get_mut().sync_all().map_err(|e| {
            StoreError::Io(format!("failed to sync {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Replace the whole file content via a sibling temp file and rename.
    ///
    /// Rename is the sole crash-consistency primitive: a crash before the
    /// rename leaves the original untouched, a crash after it leaves the
    /// new content intact. The file is never observed half-written.
    pub fn atomic_rewrite(&self, lines: &[String]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
            StoreError::Io(format!(
                "failed to create temp file in {}: {}",
                parent.display(),
                e
            ))
        })?;

        for line in lines {
            writeln!(temp, "{line}").map_err(|e| {
                StoreError::Io(format!("failed to write replacement content: {e}"))
            })?;
        }
        temp.flush()
            .map_err(|e| StoreError::Io(format!("failed to flush replacement content: {e}")))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::Io(format!("failed to sync replacement content: {e}")))?;

        temp.persist(&self.path).map_err(|e| {
            StoreError::Io(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BackingFile;
    use tempfile::TempDir;

    #[test]
    fn ensure_exists_creates_missing_directories_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("PlayerList.txt");
        let file = BackingFile::new(&path);

        file.ensure_exists().unwrap();
        assert!(path.exists());
        assert_eq!(file.scan().unwrap().len(), 0);

        // Idempotent, and never truncates existing content.
        file.append("keep-me").unwrap();
        file.ensure_exists().unwrap();
        assert_eq!(file.scan().unwrap(), vec!["keep-me".to_string()]);
    }

    #[test]
    fn append_then_scan_round_trips_lines() {
        let dir = TempDir::new().unwrap();
        let file = BackingFile::new(dir.path().join("list.txt"));
        file.ensure_exists().unwrap();

        file.append("one").unwrap();
        file.append("two").unwrap();
        assert_eq!(file.scan().unwrap(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn scan_on_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let file = BackingFile::new(dir.path().join("absent.txt"));
        assert!(file.scan().is_err());
    }

    #[test]
    fn atomic_rewrite_replaces_content_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let file = BackingFile::new(dir.path().join("list.txt"));
        file.ensure_exists().unwrap();
        file.append("old").unwrap();

        file.atomic_rewrite(&["new-1".to_string(), "new-2".to_string()])
            .unwrap();
        assert_eq!(
            file.scan().unwrap(),
            vec!["new-1".to_string(), "new-2".to_string()]
        );

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "only the backing file should remain");
    }
}
