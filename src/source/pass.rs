//! One traversal of a record source

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::errors::{SourceError, SourceResult};
use super::record::Record;
use super::SourceOptions;

/// A non-empty source line as read, terminator included.
#[derive(Debug, Clone)]
pub(crate) struct SourceLine {
    pub(crate) line_no: u64,
    raw: Vec<u8>,
    content_len: usize,
}

impl SourceLine {
    /// Line bytes without the `\n` or `\r\n` terminator.
    pub(crate) fn content(&self) -> &[u8] {
        &self.raw[..self.content_len]
    }

    /// Line bytes exactly as they appear in the file.
    pub(crate) fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Reads non-empty lines without decoding them.
///
/// Accepts `\n` and `\r\n` endings and a missing final newline.
#[derive(Debug)]
pub(crate) struct LineReader<R> {
    reader: R,
    path: PathBuf,
    line_no: u64,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            line_no: 0,
        }
    }

    pub(crate) fn next_line(&mut self) -> SourceResult<Option<SourceLine>> {
        loop {
            let mut raw = Vec::with_capacity(256);
            let read = self
                .reader
                .read_until(b'\n', &mut raw)
                .map_err(|e| SourceError::read_failed(&self.path, e))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let mut content_len = raw.len();
            if raw[..content_len].ends_with(b"\n") {
                content_len -= 1;
            }
            if raw[..content_len].ends_with(b"\r") {
                content_len -= 1;
            }
            if content_len == 0 {
                continue;
            }

            return Ok(Some(SourceLine {
                line_no: self.line_no,
                raw,
                content_len,
            }));
        }
    }
}

#[derive(Debug)]
enum Lines<'a> {
    File(LineReader<BufReader<File>>),
    Snapshot(std::slice::Iter<'a, SourceLine>),
}

impl Lines<'_> {
    fn next_line(&mut self) -> SourceResult<Option<SourceLine>> {
        match self {
            Lines::File(reader) => reader.next_line(),
            Lines::Snapshot(iter) => Ok(iter.next().cloned()),
        }
    }
}

/// Lazy sequence of records for one pass.
///
/// Yields `Err` at most once; iteration ends after an error.
#[derive(Debug)]
pub struct Pass<'a> {
    lines: Lines<'a>,
    delimiter: char,
    header_pending: bool,
    header: Option<SourceLine>,
    finished: bool,
}

impl<'a> Pass<'a> {
    pub(crate) fn from_reader(reader: LineReader<BufReader<File>>, options: &SourceOptions) -> Self {
        Self::new(Lines::File(reader), options)
    }

    pub(crate) fn from_snapshot(lines: &'a [SourceLine], options: &SourceOptions) -> Self {
        Self::new(Lines::Snapshot(lines.iter()), options)
    }

    fn new(lines: Lines<'a>, options: &SourceOptions) -> Self {
        Self {
            lines,
            delimiter: options.delimiter,
            header_pending: options.skip_header,
            header: None,
            finished: false,
        }
    }

    /// Consumes the header line now if it is still pending and returns it
    /// exactly as it appears in the file, terminator included.
    ///
    /// Returns `None` when header skipping is off or the source is empty.
    pub fn take_header(&mut self) -> SourceResult<Option<&[u8]>> {
        if self.header_pending {
            self.header_pending = false;
            self.header = self.lines.next_line()?;
        }
        Ok(self.header.as_ref().map(SourceLine::raw))
    }
}

impl Iterator for Pass<'_> {
    type Item = SourceResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.header_pending {
            let header = self.take_header().map(|_| ());
            if let Err(e) = header {
                self.finished = true;
                return Some(Err(e));
            }
        }

        match self.lines.next_line() {
            Ok(Some(line)) => Some(Ok(Record::from_bytes(
                line.content(),
                self.delimiter,
                line.line_no,
            ))),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
