//! Capture dump parsing.
//!
//! Dumps are `$writememb` output: one bit string per row. Lines starting
//! with `/` (address comments) and blank lines are skipped, and `_`
//! separators are ignored.

use std::path::Path;

use strobe_common::BitVec;

use crate::error::CheckError;

/// Parses the rows of a capture dump of a `width`-bit bus.
pub fn parse_dump(clock: &str, text: &str, width: u32) -> Result<Vec<BitVec>, CheckError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('/'))
        .map(|(line_no, line)| {
            let bits: String = line.chars().filter(|&c| c != '_').collect();
            BitVec::from_string(&bits, width, false).map_err(|source| CheckError::MalformedRow {
                clock: clock.to_string(),
                line: line_no,
                source,
            })
        })
        .collect()
}

/// Reads and parses a capture dump file.
pub fn read_dump(clock: &str, path: &Path, width: u32) -> Result<Vec<BitVec>, CheckError> {
    let text = std::fs::read_to_string(path).map_err(|source| CheckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dump(clock, &text, width)
}
