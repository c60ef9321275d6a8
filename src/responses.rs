//! Response payloads returned to the request layer.
//!
//! Field names follow the editor wire format (`line_num`, `column_num`,
//! `filepath`, ...), so these serialize directly with serde_json.

use serde::Serialize;
use std::path::PathBuf;

use crate::engine::Completion;
use crate::types::DefinitionLocation;

/// A position in a file: 1-based line, 1-based column in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line_num: u32,
    pub column_num: u32,
    pub filepath: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Replace the text between `range.start` and `range.end` of the original
/// file with `replacement_text`. An empty range inserts, an empty text deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditChunk {
    pub replacement_text: String,
    pub range: Range,
}

/// Ordered edit chunks, all anchored in original-text coordinates.
pub type Patch = Vec<EditChunk>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixItKind {
    Refactor,
}

/// A patch with a human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixIt {
    pub text: String,
    pub chunks: Patch,
    pub kind: FixItKind,
}

impl FixIt {
    pub fn refactor(text: impl Into<String>, chunks: Patch) -> Self {
        Self {
            text: text.into(),
            chunks,
            kind: FixItKind::Refactor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixItResponse {
    pub fixits: Vec<FixIt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GoToResponse {
    Single(DefinitionLocation),
    Multiple(Vec<DefinitionLocation>),
}

/// Result of a subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    GoTo(GoToResponse),
    Message { message: String },
    DetailedInfo { detailed_info: String },
    FixIts(FixItResponse),
}

/// Location attached to a detailed completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateLocation {
    pub location: DefinitionLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCandidate {
    pub insertion_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_menu_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<CandidateLocation>,
    /// Engine completion kept until the candidate is detailed
    #[serde(skip)]
    pub pending: Option<Completion>,
}

impl CompletionCandidate {
    pub fn is_detailed(&self) -> bool {
        self.pending.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    /// Byte range of the parameter inside the signature label
    pub label: [usize; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureInfo {
    pub label: String,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignatureHelp {
    pub active_signature: usize,
    pub active_parameter: usize,
    pub signatures: Vec<SignatureInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfoItem {
    pub key: String,
    pub value: String,
}

impl DebugInfoItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub name: String,
    pub items: Vec<DebugInfoItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn goto_response_serializes_wire_names() {
        let single = GoToResponse::Single(
            DefinitionLocation::new("/m.py", 3, 5).with_description("def f()"),
        );
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({"filepath": "/m.py", "line_num": 3, "column_num": 5, "description": "def f()"})
        );
    }

    #[test]
    fn signature_help_uses_camel_case() {
        let help = SignatureHelp {
            active_signature: 1,
            active_parameter: 2,
            signatures: vec![],
        };
        let value = serde_json::to_value(&help).unwrap();
        assert_eq!(value["activeSignature"], 1);
        assert_eq!(value["activeParameter"], 2);
    }

    #[test]
    fn fixit_kind_is_lowercase() {
        let fixit = FixIt::refactor("Rename", vec![]);
        assert_eq!(serde_json::to_value(&fixit).unwrap()["kind"], "refactor");
    }
}
