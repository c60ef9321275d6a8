//! Navigation built on top of single engine queries.

pub mod implementation;

pub use implementation::{
    DEFAULT_MAX_HOPS, DefinitionOracle, HopQuery, Implementation, ImplementationWalk, LineSource,
    SourceLines, StopReason, VisitedSet, is_import_line,
};
