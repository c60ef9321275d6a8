//! Layered, memoized resolution of the configuration that applies to a file
//!
//! Three layers, each cached indefinitely per key:
//! - settings: "what did the per-project hook say about this file?"
//! - runtime: "which executable runtime does that interpreter path name?"
//! - project: "which root and search path does the engine analyse it with?"
//!
//! This is distinct from the engine's own symbol resolution, which answers
//! "what does the identifier under the cursor refer to?".

pub mod cache;
pub mod hooks;
pub mod interpreter;
pub mod memo;
pub mod registry;
pub mod sha;

pub use cache::ResolutionCache;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(pub String);

/// Project configuration handed to the engine for one file.
///
/// `runtime_path` always equals the executable of the runtime resolved for
/// the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub sys_path: Vec<PathBuf>,
    pub runtime_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// A non-empty interpreter path could not be located on disk or PATH
    #[error("Cannot find interpreter path {hint}.")]
    EnvironmentResolution { hint: String },
    /// The engine refused to build a runtime for a located executable
    #[error("failed to create runtime for '{path}': {source}")]
    RuntimeUnavailable {
        path: String,
        #[source]
        source: EngineError,
    },
    /// A per-project hook file exists but cannot be used
    #[error("invalid configuration hook at '{path}': {details}")]
    HookConfig { path: PathBuf, details: String },
}

impl ResolutionError {
    pub fn environment(hint: impl Into<String>) -> Self {
        Self::EnvironmentResolution { hint: hint.into() }
    }
    pub fn runtime_unavailable(path: impl Into<String>, source: EngineError) -> Self {
        Self::RuntimeUnavailable {
            path: path.into(),
            source,
        }
    }
    pub fn hook_config(path: PathBuf, details: impl Into<String>) -> Self {
        Self::HookConfig {
            path,
            details: details.into(),
        }
    }
    pub fn suggestion(&self) -> &'static str {
        match self {
            ResolutionError::EnvironmentResolution { .. } => {
                "Set interpreter_path in the project hook file or python_binary_path in settings."
            }
            ResolutionError::RuntimeUnavailable { .. } => {
                "Check that the interpreter runs; the request can be retried after fixing it."
            }
            ResolutionError::HookConfig { .. } => {
                "Fix the syntax of the hook file; it is read again on the next request."
            }
        }
    }
    /// Stable code for programmatic handling in JSON responses
    pub fn status_code(&self) -> String {
        match self {
            ResolutionError::EnvironmentResolution { .. } => "RESOLUTION_ENVIRONMENT",
            ResolutionError::RuntimeUnavailable { .. } => "RESOLUTION_RUNTIME_UNAVAILABLE",
            ResolutionError::HookConfig { .. } => "RESOLUTION_HOOK_CONFIG",
        }
        .to_string()
    }
    /// Recovery suggestions list (mirrors project error conventions)
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ResolutionError::EnvironmentResolution { .. } => vec![
                "Use an absolute path or a name found on PATH",
                "Leave the interpreter path empty to use the system default runtime",
            ],
            ResolutionError::RuntimeUnavailable { .. } => vec![
                "Run the interpreter by hand to confirm it starts",
                "Point interpreter_path at a different runtime",
            ],
            ResolutionError::HookConfig { .. } => vec![
                "Validate the hook file as TOML",
                "Remove the hook file to fall back to default settings",
            ],
        }
    }
}

pub type ResolutionResult<T> = Result<T, ResolutionError>;
