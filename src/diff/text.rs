use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many leading bytes are sniffed to decide text vs binary
const SNIFF_LEN: usize = 8192;

/// Whether a file looks like text: its first few KiB contain no NUL byte and
/// decode as UTF-8 (a multi-byte sequence cut off by the sniff window is fine).
/// Unreadable files are treated as binary.
pub fn is_text_path(path: &str) -> bool {
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    let read = File::open(Path::new(path))
        .and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut buf));
    if read.is_err() {
        return false;
    }
    is_text_bytes(&buf)
}

fn is_text_bytes(buf: &[u8]) -> bool {
    if buf.contains(&0) {
        return false;
    }
    match std::str::from_utf8(buf) {
        Ok(_) => true,
        // error_len() == None means the input ended mid-character
        Err(e) => e.error_len().is_none() && buf.len() >= SNIFF_LEN,
    }
}

/// Read a file classified as text. Only the sniffed prefix was checked, so
/// invalid UTF-8 further in is replaced rather than failing the read.
pub fn read_text(path: &str) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read '{}'", path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Number of lines in a text file, counting a final unterminated line.
pub fn count_lines(content: &str) -> usize {
    content.lines().count()
}
