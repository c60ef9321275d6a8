//! Capability contract of the external code-intelligence engine.
//!
//! The engine parses, infers, completes and refactors a single source file
//! for a chosen runtime and project root. Nothing here implements any of
//! that: these traits are the seam the resolution cache and the request
//! layer call into, and every call must go through [`EngineGuard`].
//!
//! Coordinates handed to the engine are 1-based lines and 0-based codepoint
//! columns ([`EnginePosition`]). Coordinates coming back use the same
//! convention, with every field optional because engines frequently report
//! builtins and synthesized names without a location.

pub mod guard;

pub use guard::EngineGuard;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::resolver::ProjectConfig;
use crate::types::EnginePosition;

/// Engine-defined failure. Surfaced to callers as a "no result" error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// An executable runtime the engine analyses code against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    /// Absolute path of the runtime executable
    pub executable: PathBuf,
    /// Import search path of the runtime
    pub sys_path: Vec<PathBuf>,
    /// Version components, most significant first
    pub version: Vec<u32>,
}

impl RuntimeEnvironment {
    pub fn version_string(&self) -> String {
        self.version
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// One parameter of a callable signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    /// Engine description, usually prefixed with `param `
    pub description: String,
}

impl Parameter {
    /// Description without the engine's `param ` prefix.
    pub fn label(&self) -> &str {
        self.description
            .strip_prefix("param ")
            .unwrap_or(&self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub description: String,
    pub params: Vec<Parameter>,
    /// Index of the parameter under the cursor, if the cursor is in the call
    pub index: Option<usize>,
}

/// A name the engine resolved: definitions, references, inferred types and
/// symbol search hits all share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Definition {
    pub module_path: Option<PathBuf>,
    pub line: Option<u32>,
    /// 0-based codepoint column
    pub column: Option<u32>,
    pub description: String,
    pub docstring: String,
    pub kind: String,
    pub signatures: Vec<Signature>,
}

impl Definition {
    /// True when the engine gave no location information at all.
    pub fn is_unlocated(&self) -> bool {
        self.module_path.is_none() && self.line.is_none() && self.column.is_none()
    }
}

/// A completion candidate with everything needed to detail it later.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Text to insert at the completion start
    pub complete: String,
    pub name: String,
    pub definition: Definition,
}

/// Before/after text of one file touched by a refactoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub old_text: String,
    pub new_text: String,
}

/// All files touched by a refactoring, ordered by path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub files: BTreeMap<PathBuf, ChangedFile>,
}

/// Entry points of the engine that do not need a parsed source file.
pub trait Engine: Send + Sync {
    /// Engine name for diagnostics
    fn name(&self) -> &str;

    /// Engine version for diagnostics
    fn version(&self) -> String;

    /// Build a runtime from an executable path, or the system default
    /// runtime when `executable` is `None`.
    fn resolve_runtime(&self, executable: Option<&Path>) -> EngineResult<RuntimeEnvironment>;

    /// Heuristic project root discovery starting from `directory`.
    fn default_project_root(&self, directory: &Path) -> PathBuf;

    /// Parse `source` as the contents of `path` within `project`.
    fn open_session(
        &self,
        source: &str,
        path: &Path,
        project: &ProjectConfig,
        runtime: &RuntimeEnvironment,
    ) -> EngineResult<Box<dyn EngineSession>>;
}

/// Per-file capabilities of a parsed source.
pub trait EngineSession {
    fn complete(&self, at: EnginePosition) -> EngineResult<Vec<Completion>>;

    fn signatures(&self, at: EnginePosition) -> EngineResult<Vec<Signature>>;

    fn infer(&self, at: EnginePosition) -> EngineResult<Vec<Definition>>;

    fn goto(&self, at: EnginePosition) -> EngineResult<Vec<Definition>>;

    fn references(&self, at: EnginePosition) -> EngineResult<Vec<Definition>>;

    /// Project-wide name search, stopping after `limit` hits.
    fn search_symbol(&self, query: &str, limit: usize) -> EngineResult<Vec<Definition>>;

    fn rename(&self, at: EnginePosition, new_name: &str) -> EngineResult<ChangeSet>;

    fn inline(&self, at: EnginePosition) -> EngineResult<ChangeSet>;

    fn extract_variable(
        &self,
        at: EnginePosition,
        new_name: &str,
        until: Option<EnginePosition>,
    ) -> EngineResult<ChangeSet>;

    fn extract_function(
        &self,
        at: EnginePosition,
        new_name: &str,
        until: Option<EnginePosition>,
    ) -> EngineResult<ChangeSet>;
}
