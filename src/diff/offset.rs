//! Codepoint offsets → (line, byte column) positions.

use std::path::Path;

use crate::error::{BrokerError, BrokerResult};
use crate::responses::{Position, Range};

/// Convert a 1-based codepoint column in `line` to a 1-based byte column.
///
/// Widths are recomputed from the line on every call; columns past the end
/// of the line count only the bytes that exist.
pub fn codepoint_offset_to_byte_offset(line: &str, codepoint_offset: usize) -> usize {
    line.chars()
        .take(codepoint_offset.saturating_sub(1))
        .map(char::len_utf8)
        .sum::<usize>()
        + 1
}

/// Byte offset of every codepoint, followed by the text length.
pub(crate) fn char_starts(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Maps codepoint offsets of one text to positions.
///
/// The newline index is built once per text and holds the codepoint offset
/// of every `\n`, followed by a sentinel equal to the text's codepoint length.
pub struct OffsetMapper<'a> {
    path: &'a Path,
    text: &'a str,
    char_starts: Vec<usize>,
    newlines: Vec<usize>,
}

impl<'a> OffsetMapper<'a> {
    pub fn new(path: &'a Path, text: &'a str) -> Self {
        let char_starts = char_starts(text);
        let mut newlines: Vec<usize> = text
            .chars()
            .enumerate()
            .filter(|(_, c)| *c == '\n')
            .map(|(i, _)| i)
            .collect();
        newlines.push(char_starts.len() - 1);
        Self {
            path,
            text,
            char_starts,
            newlines,
        }
    }

    /// Number of codepoints in the text.
    pub fn len_chars(&self) -> usize {
        self.char_starts.len() - 1
    }

    /// Position of a 0-based codepoint offset.
    pub fn position(&self, offset: usize) -> BrokerResult<Position> {
        let index = self.newlines.partition_point(|&newline| newline < offset);
        let Some(&line_end) = self.newlines.get(index) else {
            tracing::error!(
                "invalid offset {offset} in {} with {} characters",
                self.path.display(),
                self.len_chars()
            );
            return Err(BrokerError::DiffRange {
                path: self.path.to_path_buf(),
                offset,
                length: self.len_chars(),
            });
        };

        let line_start = if index > 0 {
            self.newlines[index - 1] + 1
        } else {
            0
        };
        let column = offset - line_start;
        let line = &self.text[self.char_starts[line_start]..self.char_starts[line_end]];

        Ok(Position {
            line_num: (index + 1) as u32,
            column_num: codepoint_offset_to_byte_offset(line, column + 1) as u32,
            filepath: self.path.to_path_buf(),
        })
    }

    /// Positions of a `[start, end)` codepoint range.
    pub fn range(&self, start: usize, end: usize) -> BrokerResult<Range> {
        Ok(Range {
            start: self.position(start)?,
            end: self.position(end)?,
        })
    }
}
