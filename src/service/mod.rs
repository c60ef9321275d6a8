//! Request layer seam: parses subcommands and turns engine answers into
//! editor responses.

pub mod completer;
pub mod request;

pub use completer::{SIGNATURE_TRIGGERS, SemanticCompleter};
pub use request::{Command, FileData, RangeEnd, Request, RequestRange};
