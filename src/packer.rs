//! Repacking a byte stream into little-endian memory image words.
//!
//! Two stages, each usable on its own: byte pairs are swapped into 16-bit
//! units, then unit pairs are swapped into 32-bit words. A trailing odd byte
//! gets a zero high byte and a trailing odd unit gets a zero high half-word.

use std::fmt;
use std::io::{self, Read};

use crate::hexdump::{HexDump, HexDumpRecord};

/// One line of a stim file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLine(pub u32);

impl ImageLine {
    /// Written in place of a section the image doesn't have.
    pub const DUMMY: ImageLine = ImageLine(0);
}

impl fmt::Display for ImageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// `(hi, lo)` byte pairs in stream order become `lo hi` half-words.
pub fn half_words<I>(bytes: I) -> Vec<u16>
where
    I: IntoIterator<Item = u8>,
{
    let mut out = Vec::new();
    let mut bytes = bytes.into_iter();
    while let Some(first) = bytes.next() {
        let second = bytes.next().unwrap_or(0);
        out.push(u16::from_le_bytes([first, second]));
    }
    out
}

/// `(W[j], W[j+1])` becomes the word `W[j+1] W[j]`; a lone last unit is
/// zero-extended.
pub fn words(half_words: &[u16]) -> Vec<u32> {
    half_words
        .chunks(2)
        .map(|pair| match *pair {
            [low, high] => (u32::from(high) << 16) | u32::from(low),
            [low] => u32::from(low),
            _ => unreachable!("chunks(2) yields one or two units"),
        })
        .collect()
}

/// Runs both stages over the flattened bytes of `records`.
pub fn pack<'a, I>(records: I) -> Vec<ImageLine>
where
    I: IntoIterator<Item = &'a HexDumpRecord>,
{
    let units = half_words(records.into_iter().flat_map(|r| r.bytes.iter().copied()));
    words(&units).into_iter().map(ImageLine).collect()
}

/// Like [`pack`], but pulls records from a lazy dump, stopping at the first
/// read error.
pub fn pack_dump<R: Read>(dump: HexDump<R>) -> io::Result<Vec<ImageLine>> {
    let mut bytes = Vec::new();
    for record in dump {
        bytes.extend(record?.bytes);
    }
    Ok(words(&half_words(bytes)).into_iter().map(ImageLine).collect())
}
