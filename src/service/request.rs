//! Incoming requests and the closed set of subcommands.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BrokerError, BrokerResult};
use crate::types::{ClientData, EnginePosition, FileKey};

/// An unsaved buffer sent with the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileData {
    pub contents: String,
    #[serde(default)]
    pub filetypes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RangeEnd {
    pub line_num: Option<u32>,
    pub column_num: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RequestRange {
    #[serde(default)]
    pub end: RangeEnd,
}

/// One editor request.
///
/// `line_num` is 1-based; `column_codepoint` and `start_codepoint` are
/// 1-based codepoint columns of the cursor and of the identifier start.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub filepath: PathBuf,
    #[serde(default)]
    pub file_data: HashMap<PathBuf, FileData>,
    pub line_num: u32,
    pub column_codepoint: u32,
    pub start_codepoint: u32,
    #[serde(default, rename = "extra_conf_data")]
    pub client_data: ClientData,
    #[serde(default)]
    pub range: Option<RequestRange>,
}

impl Request {
    /// Request at `line`/`column` of `filepath`, with the file's contents as
    /// its only buffer. The cursor is assumed to be on the identifier start.
    pub fn new(filepath: impl Into<PathBuf>, contents: impl Into<String>, line: u32, column: u32) -> Self {
        let filepath = filepath.into();
        let mut file_data = HashMap::new();
        file_data.insert(
            filepath.clone(),
            FileData {
                contents: contents.into(),
                filetypes: Vec::new(),
            },
        );
        Self {
            filepath,
            file_data,
            line_num: line,
            column_codepoint: column,
            start_codepoint: column,
            client_data: ClientData::default(),
            range: None,
        }
    }

    pub fn with_client_data(mut self, client_data: ClientData) -> Self {
        self.client_data = client_data;
        self
    }

    pub fn with_start_codepoint(mut self, start_codepoint: u32) -> Self {
        self.start_codepoint = start_codepoint;
        self
    }

    pub fn with_range_end(mut self, line_num: u32, column_num: u32) -> Self {
        self.range = Some(RequestRange {
            end: RangeEnd {
                line_num: Some(line_num),
                column_num: Some(column_num),
            },
        });
        self
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(self.filepath.clone(), self.client_data.clone())
    }

    /// Identifier start in engine coordinates, used by queries.
    pub fn start_position(&self) -> EnginePosition {
        EnginePosition::new(self.line_num, self.start_codepoint.saturating_sub(1))
    }

    /// Cursor in engine coordinates, used by refactors.
    pub fn cursor_position(&self) -> EnginePosition {
        EnginePosition::new(self.line_num, self.column_codepoint.saturating_sub(1))
    }

    /// End of the selected range, passed through unchanged.
    pub fn range_end(&self) -> Option<EnginePosition> {
        let end = self.range?.end;
        Some(EnginePosition::new(end.line_num?, end.column_num?))
    }

    /// Contents of `path`: the unsaved buffer if the client sent one,
    /// otherwise the file on disk.
    pub fn contents(&self, path: &Path) -> BrokerResult<String> {
        if let Some(data) = self.file_data.get(path) {
            return Ok(data.contents.clone());
        }
        std::fs::read_to_string(path).map_err(|source| BrokerError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn buffers(&self) -> impl Iterator<Item = (PathBuf, String)> + '_ {
        self.file_data
            .iter()
            .map(|(path, data)| (path.clone(), data.contents.clone()))
    }
}

/// Subcommands understood by the completer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GoTo,
    GoToDefinition,
    GoToDeclaration,
    GoToImplementation,
    GoToReferences,
    GoToSymbol,
    GoToType,
    GetType,
    GetDoc,
    RefactorRename,
    RefactorInline,
    RefactorExtractVariable,
    RefactorExtractFunction,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Command::GoTo,
        Command::GoToDefinition,
        Command::GoToDeclaration,
        Command::GoToImplementation,
        Command::GoToReferences,
        Command::GoToSymbol,
        Command::GoToType,
        Command::GetType,
        Command::GetDoc,
        Command::RefactorRename,
        Command::RefactorInline,
        Command::RefactorExtractVariable,
        Command::RefactorExtractFunction,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::GoTo => "GoTo",
            Command::GoToDefinition => "GoToDefinition",
            Command::GoToDeclaration => "GoToDeclaration",
            Command::GoToImplementation => "GoToImplementation",
            Command::GoToReferences => "GoToReferences",
            Command::GoToSymbol => "GoToSymbol",
            Command::GoToType => "GoToType",
            Command::GetType => "GetType",
            Command::GetDoc => "GetDoc",
            Command::RefactorRename => "RefactorRename",
            Command::RefactorInline => "RefactorInline",
            Command::RefactorExtractVariable => "RefactorExtractVariable",
            Command::RefactorExtractFunction => "RefactorExtractFunction",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| BrokerError::invalid_argument(format!("Unknown command: {s}")))
    }
}
