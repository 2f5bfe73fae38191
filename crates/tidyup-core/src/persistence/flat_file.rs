//! Line-oriented state files.
//!
//! A state file is UTF-8 text with one record per line. Empty lines and lines
//! starting with `#` are skipped on load so users can annotate the files by
//! hand. This module knows nothing about what the lines mean; see
//! [`super::codec`] for that.
//!
//! Writes go to `<file>.tmp` first and are renamed over the real file, so a
//! crash mid-write leaves the previous contents in place.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for flat-file operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file the failed operation was touching.
    pub fn path(&self) -> &Path {
        match self {
            StoreError::Io { path, .. } => path,
        }
    }
}

fn is_record_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

/// Read the record lines of a state file.
///
/// Returns `Ok(None)` if the file does not exist. Comment and blank lines are
/// dropped, and a trailing `\r` is stripped so files edited on Windows load
/// the same.
pub fn read_lines(path: &Path) -> Result<Option<Vec<String>>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let mut line = line.map_err(|e| StoreError::io(path, e))?;
        if line.ends_with('\r') {
            line.pop();
        }
        if is_record_line(&line) {
            lines.push(line);
        }
    }

    Ok(Some(lines))
}

/// Read the record lines of a state file, treating a missing file as empty.
pub fn load_lines(path: &Path) -> Result<Vec<String>, StoreError> {
    Ok(read_lines(path)?.unwrap_or_default())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace a state file with the given lines, one per line.
///
/// # Atomic Write
///
/// The lines are written to a sibling `.tmp` file, flushed to disk and then
/// renamed over `path`. If any step fails the temp file is removed and the
/// original file is left untouched.
///
/// The parent directory must already exist.
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let temp_path = temp_path_for(path);

    let result = write_temp(&temp_path, lines).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp<I, S>(temp_path: &Path, lines: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(temp_path).map_err(|e| StoreError::io(temp_path, e))?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| StoreError::io(temp_path, e))?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| StoreError::io(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| StoreError::io(temp_path, e))?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_nonexistent_returns_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing");

        assert!(load_lines(&path).unwrap().is_empty());
        assert!(read_lines(&path).unwrap().is_none());
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");
        fs::write(&path, "# header\n\nfirst\n#second\n\n\nthird\n").unwrap();

        let lines = load_lines(&path).unwrap();
        assert_eq!(lines, vec!["first", "third"]);
    }

    #[test]
    fn keeps_file_order_and_last_line_without_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");
        fs::write(&path, "c\nb\na").unwrap();

        assert_eq!(load_lines(&path).unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn strips_carriage_returns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");
        fs::write(&path, "one\r\n\r\n# note\r\ntwo\r\n").unwrap();

        assert_eq!(load_lines(&path).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn only_leading_hash_is_a_comment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");
        fs::write(&path, " # indented\n/a#b,c,d\n").unwrap();

        assert_eq!(load_lines(&path).unwrap(), vec![" # indented", "/a#b,c,d"]);
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");

        write_lines(&path, ["alpha", "beta"]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha\nbeta\n");
        assert_eq!(load_lines(&path).unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn write_empty_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");

        write_lines(&path, Vec::<String>::new()).unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn write_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");
        fs::write(&path, "old1\nold2\nold3\n").unwrap();

        write_lines(&path, ["new"]).unwrap();

        assert_eq!(load_lines(&path).unwrap(), vec!["new"]);
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list");

        write_lines(&path, ["x"]).unwrap();

        assert!(!dir.path().join("list.tmp").exists());
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("list");

        let err = write_lines(&path, ["x"]).unwrap_err();
        assert!(err.path().ends_with("list.tmp"));
        assert!(!path.exists());
    }

    #[test]
    fn read_directory_is_an_error() {
        let dir = tempdir().unwrap();

        // Opening a directory succeeds on Unix but reading it fails; either
        // way it must surface as an error rather than "no prior state".
        let result = read_lines(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn temp_path_is_sibling() {
        let path = Path::new("/data/tidyupwatchlist");
        assert_eq!(temp_path_for(path), Path::new("/data/tidyupwatchlist.tmp"));
    }
}
