/// The main library module for engine-broker
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod resolver;
pub mod responses;
pub mod service;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use diff::{build_patch, change_set_to_fixit};
pub use engine::{Engine, EngineError, EngineGuard, EngineResult, EngineSession};
pub use error::{BrokerError, BrokerResult};
pub use navigation::{ImplementationWalk, is_import_line};
pub use resolver::{ProjectConfig, ResolutionCache, ResolutionError, ResolutionResult};
pub use responses::{EditChunk, FixIt, Patch, Position, Range};
pub use service::{Command, Request, SemanticCompleter};
pub use types::{ClientData, DefinitionLocation, EnginePosition, FileKey};
