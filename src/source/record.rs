//! Delimited record representation

use std::borrow::Cow;

/// One source line split into fields.
///
/// Fields are kept as raw bytes and never re-quoted: serializing an
/// untouched record yields the original line byte for byte, whatever its
/// encoding. Only fields that are read as text (timestamp, key, filter
/// column) are decoded, and invalid UTF-8 in those reads as U+FFFD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number within the source file
    line_no: u64,
    fields: Vec<Vec<u8>>,
    delimiter: char,
}

impl Record {
    /// Splits `line` (without its line terminator) on `delimiter`.
    pub fn parse(line: &str, delimiter: char, line_no: u64) -> Self {
        Self::from_bytes(line.as_bytes(), delimiter, line_no)
    }

    /// Splits raw line bytes on the UTF-8 encoding of `delimiter`.
    pub fn from_bytes(line: &[u8], delimiter: char, line_no: u64) -> Self {
        let mut encoded = [0u8; 4];
        let delim = delimiter.encode_utf8(&mut encoded).as_bytes();

        Self {
            line_no,
            fields: split_fields(line, delim),
            delimiter,
        }
    }

    /// Line number in the source file.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw bytes of the field at `index`, if in range.
    pub fn field_bytes(&self, index: usize) -> Option<&[u8]> {
        self.fields.get(index).map(Vec::as_slice)
    }

    /// Field at `index` decoded as text, if in range.
    pub fn field(&self, index: usize) -> Option<Cow<'_, str>> {
        self.field_bytes(index).map(String::from_utf8_lossy)
    }

    /// Replaces the field at `index`. Returns false if out of range.
    pub fn set_field(&mut self, index: usize, value: String) -> bool {
        match self.fields.get_mut(index) {
            Some(field) => {
                *field = value.into_bytes();
                true
            }
            None => false,
        }
    }

    /// Fields rejoined with the delimiter, no terminator, decoded for display.
    pub fn to_line(&self) -> String {
        let mut buf = self.to_bytes();
        buf.pop();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Appends the wire form (line plus `\n`) to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        let mut delim = [0u8; 4];
        let delim = self.delimiter.encode_utf8(&mut delim).as_bytes();

        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                buf.extend_from_slice(delim);
            }
            buf.extend_from_slice(field);
        }
        buf.push(b'\n');
    }

    /// Wire form as an owned buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.fields.iter().map(|f| f.len() + 1).sum());
        self.encode_into(&mut buf);
        buf
    }
}

fn split_fields(line: &[u8], delim: &[u8]) -> Vec<Vec<u8>> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + delim.len() <= line.len() {
        if &line[i..i + delim.len()] == delim {
            fields.push(line[start..i].to_vec());
            i += delim.len();
            start = i;
        } else {
            i += 1;
        }
    }
    fields.push(line[start..].to_vec());
    fields
}
