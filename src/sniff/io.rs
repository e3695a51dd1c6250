//! Bounded prefix reading for size-sensitive detectors.
//!
//! Detectors never see the whole file; each reads the smallest sample that
//! has historically been enough for its verdict.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Sample for magic-byte mimetype detection.
pub const MAGIC_SAMPLE: usize = 8192;

/// Sample for XML variant detection.
pub const XML_SAMPLE: usize = 5_000;

/// Sample for the HTML check on octet-stream files.
pub const HTML_SAMPLE: usize = 500;

/// Sample for the IATI root-tag check.
pub const IATI_SAMPLE: usize = 100;

/// Sample for JSON/CSV/Turtle refinement of plain-text verdicts.
pub const TEXT_SAMPLE: usize = 10_000;

/// Sample for the RDFa attribute scan; RDFa may appear deep in a page.
pub const RDFA_SAMPLE: usize = 100_000;

/// Read up to `limit` bytes from the start of a file.
pub fn read_prefix(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a bounded prefix decoded as ISO-8859-1.
///
/// Latin-1 decoding is lossless over arbitrary bytes, which is what the
/// text heuristics need from a possibly mislabelled file.
pub fn latin1_prefix(path: &Path, limit: usize) -> io::Result<String> {
    let bytes = read_prefix(path, limit)?;
    Ok(encoding_rs::mem::decode_latin1(&bytes).into_owned())
}

/// Whether a byte sample looks like character data rather than binary.
pub fn looks_textual(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    if memchr::memchr(0, data).is_some() {
        return false;
    }
    let printable = data
        .iter()
        .filter(|&&b| {
            matches!(b, b'\t' | b'\n' | b'\r' | 0x0c) || (0x20..0x7f).contains(&b) || b >= 0xa0
        })
        .count();
    printable * 100 >= data.len() * 95
}
