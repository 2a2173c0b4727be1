//! True-label log
//!
//! Flat UTF-8 text file holding one relative image path per line for every
//! image labeled `true`. Lines are only appended, except when an undo removes
//! the last occurrence of a path.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Default log file name
pub const DEFAULT_LABELS_FILE: &str = "true_images.txt";

/// Handle to the durable true-label log
#[derive(Debug, Clone)]
pub struct LabelLog {
    path: PathBuf,
}

impl LabelLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one path as a new line, creating the file if needed
    pub fn append(&self, image_path: &str) -> Result<()> {
        if image_path.contains(|c| c == '\n' || c == '\r') {
            return Err(Error::InvalidInput(format!(
                "Image path contains a line break: {:?}",
                image_path
            )));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut line = String::with_capacity(image_path.len() + 2);
        if !ends_with_newline(&mut file)? {
            line.push('\n');
        }
        line.push_str(image_path);
        line.push('\n');

        // Single write in append mode: earlier lines are never rewritten
        file.write_all(line.as_bytes())?;
        file.sync_data()?;

        debug!("Appended {} to {}", image_path, self.path.display());
        Ok(())
    }

    /// Number of lines in the log (0 if the file does not exist)
    pub fn count(&self) -> Result<usize> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
        let unterminated = matches!(bytes.last(), Some(&b) if b != b'\n');
        Ok(newlines + usize::from(unterminated))
    }

    /// All entries in file order, trimmed
    pub fn entries(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(|l| l.trim().to_string()).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the line closest to the end of the file that equals `image_path`
    ///
    /// Returns `Ok(false)` without touching the file when it does not exist or
    /// holds no matching line. The remaining lines are written to a sibling
    /// file that then replaces the log.
    pub fn remove_last_occurrence(&self, image_path: &str) -> Result<bool> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
        let Some(position) = lines.iter().rposition(|line| line.trim() == image_path) else {
            return Ok(false);
        };
        lines.remove(position);

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, lines.concat())?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            "Removed line {} ({}) from {}",
            position + 1,
            image_path,
            self.path.display()
        );
        Ok(true)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_LABELS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// True if the file is empty or its last byte is a newline
fn ends_with_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_in(dir: &TempDir) -> LabelLog {
        LabelLog::new(dir.path().join(DEFAULT_LABELS_FILE))
    }

    #[test]
    fn test_missing_file_counts_zero() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        assert_eq!(log.count().unwrap(), 0);
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_count_with_duplicates() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append("a.jpg").unwrap();
        log.append("sub/b.jpg").unwrap();
        log.append("a.jpg").unwrap();

        assert_eq!(log.count().unwrap(), 3);
        assert_eq!(log.entries().unwrap(), vec!["a.jpg", "sub/b.jpg", "a.jpg"]);
        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "a.jpg\nsub/b.jpg\na.jpg\n"
        );
    }

    #[test]
    fn test_append_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        assert!(matches!(log.append("a.jpg\nb.jpg"), Err(Error::InvalidInput(_))));
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn test_append_after_unterminated_line() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        fs::write(log.path(), "a.jpg").unwrap();
        assert_eq!(log.count().unwrap(), 1);

        log.append("b.jpg").unwrap();
        assert_eq!(log.entries().unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_append_then_remove_restores_content() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append("x.jpg").unwrap();
        log.append("y.jpg").unwrap();
        let before = fs::read_to_string(log.path()).unwrap();

        log.append("p.jpg").unwrap();
        assert!(log.remove_last_occurrence("p.jpg").unwrap());

        assert_eq!(fs::read_to_string(log.path()).unwrap(), before);
    }

    #[test]
    fn test_removes_occurrence_closest_to_end() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        fs::write(log.path(), "a.jpg\nb.jpg\na.jpg\n").unwrap();

        assert!(log.remove_last_occurrence("a.jpg").unwrap());
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "a.jpg\nb.jpg\n");
    }

    #[test]
    fn test_remove_absent_path_is_noop() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        assert!(!log.remove_last_occurrence("a.jpg").unwrap());
        assert!(!log.path().exists());

        fs::write(log.path(), "b.jpg\n").unwrap();
        assert!(!log.remove_last_occurrence("a.jpg").unwrap());
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "b.jpg\n");
    }

    #[test]
    fn test_remove_matches_trimmed_lines() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        fs::write(log.path(), "a.jpg\r\nb.jpg  \n").unwrap();

        assert!(log.remove_last_occurrence("b.jpg").unwrap());
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "a.jpg\r\n");
        assert!(!log.path().with_file_name("true_images.txt.tmp").exists());
    }
}
