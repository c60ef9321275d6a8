//! Core identity and location types shared by every layer.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::resolver::Sha256Hash;
use crate::resolver::sha::compute_sha256;

/// Opaque client configuration attached to a request.
///
/// The value itself is only handed to configuration hooks. Identity is the
/// SHA-256 fingerprint of its canonical JSON form, so two requests carrying
/// equal configuration share cache entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ClientData {
    value: Arc<serde_json::Value>,
    fingerprint: Sha256Hash,
}

impl ClientData {
    pub fn new(value: serde_json::Value) -> Self {
        // serde_json maps are ordered by key, so this string is canonical.
        let fingerprint = compute_sha256(&value.to_string());
        Self {
            value: Arc::new(value),
            fingerprint,
        }
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn fingerprint(&self) -> &Sha256Hash {
        &self.fingerprint
    }
}

impl From<serde_json::Value> for ClientData {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

impl Default for ClientData {
    fn default() -> Self {
        Self::new(serde_json::Value::Null)
    }
}

impl PartialEq for ClientData {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for ClientData {}

impl Hash for ClientData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

/// Identity of a file as seen by the resolution cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    path: PathBuf,
    client: ClientData,
}

impl FileKey {
    pub fn new(path: impl Into<PathBuf>, client: ClientData) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn client(&self) -> &ClientData {
        &self.client
    }

    /// Same client configuration, different file.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(path, self.client.clone())
    }
}

/// A position handed to the engine: 1-based line, 0-based codepoint column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnginePosition {
    pub line: u32,
    pub column: u32,
}

impl EnginePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A resolved definition site: 1-based line and 1-based codepoint column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionLocation {
    #[serde(rename = "filepath")]
    pub path: PathBuf,
    #[serde(rename = "line_num")]
    pub line: u32,
    #[serde(rename = "column_num")]
    pub column: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl DefinitionLocation {
    pub fn new(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line,
            column,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The (path, line, column) triple used for revisit detection.
    pub fn site(&self) -> (&Path, u32, u32) {
        (&self.path, self.line, self.column)
    }

    /// Engine coordinates for a query positioned on this location.
    pub fn engine_position(&self) -> EnginePosition {
        EnginePosition::new(self.line, self.column.saturating_sub(1))
    }
}
