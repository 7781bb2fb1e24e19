//! xxd-style hex dump records.

use std::fmt;
use std::io::{self, Read, Write};

pub const BYTES_PER_RECORD: usize = 16;

/// One 16-byte window of a blob. Only the last record of a blob may be short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDumpRecord {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl HexDumpRecord {
    /// The byte values as two-digit lowercase hex strings, in file order.
    pub fn byte_strings(&self) -> impl Iterator<Item = String> + '_ {
        self.bytes.iter().map(|b| format!("{:02x}", b))
    }
}

impl fmt::Display for HexDumpRecord {
    /// `0000010: 0102 0304 ...  ascii`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self
            .bytes
            .chunks(2)
            .map(|pair| pair.iter().map(|b| format!("{:02x}", b)).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        let ascii = self
            .bytes
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect::<String>();
        write!(f, "{:07x}: {:<39}  {}", self.offset, groups, ascii)
    }
}

/// Lazily reads a blob 16 bytes at a time.
pub struct HexDump<R> {
    reader: R,
    offset: u64,
    done: bool,
}

impl<R: Read> HexDump<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Writes every record as a text line, returning how many were written.
    pub fn write_to<W: Write>(self, mut out: W) -> io::Result<usize> {
        let mut count = 0;
        for record in self {
            writeln!(out, "{}", record?)?;
            count += 1;
        }
        out.flush()?;
        Ok(count)
    }
}

impl<R: Read> Iterator for HexDump<R> {
    type Item = io::Result<HexDumpRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut bytes = Vec::with_capacity(BYTES_PER_RECORD);
        // take() keeps reading across short reads until the window is full or EOF
        if let Err(e) = (&mut self.reader)
            .take(BYTES_PER_RECORD as u64)
            .read_to_end(&mut bytes)
        {
            self.done = true;
            return Some(Err(e));
        }
        if bytes.is_empty() {
            self.done = true;
            return None;
        }
        if bytes.len() < BYTES_PER_RECORD {
            self.done = true;
        }
        let record = HexDumpRecord {
            offset: self.offset,
            bytes,
        };
        self.offset += BYTES_PER_RECORD as u64;
        Some(Ok(record))
    }
}

/// Records for an in-memory blob.
pub fn records(blob: &[u8]) -> Vec<HexDumpRecord> {
    blob.chunks(BYTES_PER_RECORD)
        .enumerate()
        .map(|(i, chunk)| HexDumpRecord {
            offset: (i * BYTES_PER_RECORD) as u64,
            bytes: chunk.to_vec(),
        })
        .collect()
}
