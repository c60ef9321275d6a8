//! Full-text before/after → position-anchored edit chunks.
//!
//! The two texts are aligned codepoint by codepoint with a minimal Myers
//! diff (no junk heuristics, so long runs of repeated code still align).
//! Each non-equal hunk becomes one [`EditChunk`] whose range is expressed in
//! the original text's coordinates, columns in bytes.

pub mod offset;

pub use offset::{OffsetMapper, codepoint_offset_to_byte_offset};

use imara_diff::{Algorithm, Diff, Hunk, InternedInput};
use std::path::Path;

use crate::engine::ChangeSet;
use crate::error::BrokerResult;
use crate::responses::{EditChunk, FixIt, Patch};

/// Kind of a non-equal alignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert,
    Delete,
    Replace,
}

/// One non-equal step: codepoint ranges in the old and new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub op: EditOp,
    pub old: std::ops::Range<usize>,
    pub new: std::ops::Range<usize>,
}

/// Minimal edit opcodes between two texts, equal runs omitted.
pub fn opcodes(old: &str, new: &str) -> Vec<Opcode> {
    let mut input: InternedInput<char> = InternedInput::default();
    input.update_before(old.chars());
    input.update_after(new.chars());
    let diff = Diff::compute(Algorithm::MyersMinimal, &input);

    diff.hunks()
        .map(|Hunk { before, after }| {
            let op = match (before.is_empty(), after.is_empty()) {
                (true, _) => EditOp::Insert,
                (_, true) => EditOp::Delete,
                _ => EditOp::Replace,
            };
            Opcode {
                op,
                old: before.start as usize..before.end as usize,
                new: after.start as usize..after.end as usize,
            }
        })
        .collect()
}

/// Build the patch turning `old` into `new` for the file at `path`.
///
/// All-or-nothing: an offset that does not map to a position fails the
/// whole patch.
pub fn build_patch(path: &Path, old: &str, new: &str) -> BrokerResult<Patch> {
    let mapper = OffsetMapper::new(path, old);
    let new_starts = offset::char_starts(new);

    opcodes(old, new)
        .into_iter()
        .map(|opcode| {
            let replacement =
                new[new_starts[opcode.new.start]..new_starts[opcode.new.end]].to_string();
            Ok(EditChunk {
                replacement_text: replacement,
                range: mapper.range(opcode.old.start, opcode.old.end)?,
            })
        })
        .collect()
}

/// Convert every file of a refactoring into one refactor FixIt.
///
/// Files are visited in path order so the chunk order is stable.
pub fn change_set_to_fixit(label: &str, changes: &ChangeSet) -> BrokerResult<FixIt> {
    let mut chunks = Vec::new();
    for (path, file) in &changes.files {
        chunks.extend(build_patch(path, &file.old_text, &file.new_text)?);
    }
    Ok(FixIt::refactor(label, chunks))
}
