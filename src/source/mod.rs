//! Record source
//!
//! A [`RecordSource`] is a factory of passes. Every call to
//! [`RecordSource::pass`] yields a fresh, lazy [`Pass`] over the backing
//! file from its first line:
//!
//! - `Streaming` re-opens and re-reads the file for every pass; memory use
//!   does not grow with file size.
//! - `Preload` reads the file once into a read-only snapshot. Each pass
//!   builds new records from the snapshot, so timestamp rewrites made during
//!   one pass never leak into the next.
//!
//! Empty lines are not records and are skipped. With `skip_header` the first
//! record of every pass is consumed and not emitted.
//!
//! Looping is not a property of the source: the session asks for another
//! pass when one ends.

mod errors;
mod pass;
mod record;

pub use errors::{SourceError, SourceErrorCode, SourceResult};
pub use pass::Pass;
pub use record::Record;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pass::{LineReader, SourceLine};

/// How the backing file is read across passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    /// Re-read the file on every pass.
    #[default]
    Streaming,
    /// Read once, replay from memory.
    Preload,
}

/// Record source options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    pub delimiter: char,
    pub skip_header: bool,
    pub mode: SourceMode,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_header: false,
            mode: SourceMode::Streaming,
        }
    }
}

/// Immutable in-memory copy of the source lines.
#[derive(Debug)]
struct Snapshot {
    lines: Vec<SourceLine>,
    checksum: u32,
}

/// Restartable record source over one delimited text file.
#[derive(Debug)]
pub struct RecordSource {
    path: PathBuf,
    options: SourceOptions,
    snapshot: Option<Snapshot>,
}

impl RecordSource {
    /// Opens the source, preloading it if configured.
    ///
    /// Fails with `REPLAY_SOURCE_NOT_FOUND` if the file is missing.
    pub fn open(path: &Path, options: SourceOptions) -> SourceResult<Self> {
        if !path.is_file() {
            return Err(SourceError::not_found(path));
        }

        let snapshot = match options.mode {
            SourceMode::Streaming => None,
            SourceMode::Preload => Some(Self::load_snapshot(path)?),
        };

        Ok(Self {
            path: path.to_path_buf(),
            options,
            snapshot,
        })
    }

    fn load_snapshot(path: &Path) -> SourceResult<Snapshot> {
        let file = File::open(path).map_err(|e| SourceError::from_open(path, e))?;
        let mut reader = LineReader::new(BufReader::new(file), path);
        let mut hasher = crc32fast::Hasher::new();
        let mut lines = Vec::new();

        while let Some(line) = reader.next_line()? {
            hasher.update(line.content());
            hasher.update(b"\n");
            lines.push(line);
        }

        Ok(Snapshot {
            lines,
            checksum: hasher.finalize(),
        })
    }

    /// Starts a new pass from the beginning of the source.
    ///
    /// In streaming mode the file is re-opened; a file removed since
    /// [`RecordSource::open`] fails with `REPLAY_SOURCE_NOT_FOUND`.
    pub fn pass(&self) -> SourceResult<Pass<'_>> {
        match &self.snapshot {
            Some(snapshot) => Ok(Pass::from_snapshot(&snapshot.lines, &self.options)),
            None => {
                let file =
                    File::open(&self.path).map_err(|e| SourceError::from_open(&self.path, e))?;
                Ok(Pass::from_reader(
                    LineReader::new(BufReader::new(file), &self.path),
                    &self.options,
                ))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CRC32 of the preloaded snapshot, `None` when streaming.
    pub fn snapshot_checksum(&self) -> Option<u32> {
        self.snapshot.as_ref().map(|s| s.checksum)
    }

    /// Non-empty lines held in the snapshot (header included), `None` when streaming.
    pub fn snapshot_len(&self) -> Option<usize> {
        self.snapshot.as_ref().map(|s| s.lines.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("source.csv");
        fs::write(&path, content).unwrap();
        path
    }

    fn lines(source: &RecordSource) -> Vec<String> {
        source
            .pass()
            .unwrap()
            .map(|r| r.unwrap().to_line())
            .collect()
    }

    #[test]
    fn test_missing_source_fails_fast() {
        let err = RecordSource::open(Path::new("/definitely/not/here.csv"), SourceOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_directory_is_not_a_source() {
        let dir = TempDir::new().unwrap();
        let err = RecordSource::open(dir.path(), SourceOptions::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_streaming_passes_restart_from_top() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "1,a\n2,b\n");
        let source = RecordSource::open(&path, SourceOptions::default()).unwrap();

        assert_eq!(lines(&source), vec!["1,a", "2,b"]);
        assert_eq!(lines(&source), vec!["1,a", "2,b"]);
    }

    #[test]
    fn test_streaming_sees_file_changes_between_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "1,a\n");
        let source = RecordSource::open(&path, SourceOptions::default()).unwrap();
        assert_eq!(lines(&source), vec!["1,a"]);

        fs::write(&path, "1,a\n2,b\n").unwrap();
        assert_eq!(lines(&source), vec!["1,a", "2,b"]);
    }

    #[test]
    fn test_streaming_pass_fails_when_file_removed() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "1,a\n");
        let source = RecordSource::open(&path, SourceOptions::default()).unwrap();

        fs::remove_file(&path).unwrap();

        assert!(source.pass().unwrap_err().is_not_found());
    }

    #[test]
    fn test_preload_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "h\n1,a\n2,b\n");
        let options = SourceOptions {
            mode: SourceMode::Preload,
            ..SourceOptions::default()
        };
        let source = RecordSource::open(&path, options).unwrap();

        fs::remove_file(&path).unwrap();

        assert_eq!(source.snapshot_len(), Some(3));
        assert!(source.snapshot_checksum().is_some());
        assert_eq!(lines(&source), vec!["h", "1,a", "2,b"]);
    }

    #[test]
    fn test_preload_rewrites_do_not_leak_between_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "1,a\n");
        let options = SourceOptions {
            mode: SourceMode::Preload,
            ..SourceOptions::default()
        };
        let source = RecordSource::open(&path, options).unwrap();

        for record in source.pass().unwrap() {
            let mut record = record.unwrap();
            record.set_field(0, "999".to_string());
        }

        assert_eq!(lines(&source), vec!["1,a"]);
    }

    #[test]
    fn test_header_skipped_on_every_pass() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "ts,dev\n1,a\n");
        for mode in [SourceMode::Streaming, SourceMode::Preload] {
            let options = SourceOptions {
                skip_header: true,
                mode,
                ..SourceOptions::default()
            };
            let source = RecordSource::open(&path, options).unwrap();
            assert_eq!(lines(&source), vec!["1,a"]);
            assert_eq!(lines(&source), vec!["1,a"]);
        }
    }
}
