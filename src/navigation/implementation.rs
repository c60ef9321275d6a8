//! "Go to implementation": follow definition hops through import statements
//!
//! A single "go to definition" on a re-exported name usually lands on the
//! import line that brought it into scope. This walk keeps hopping from
//! such lines until it reaches a line that is not an import, revisits a
//! site, or runs out of hops.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use crate::error::{BrokerError, BrokerResult};
use crate::types::{DefinitionLocation, EnginePosition};

/// Default hop cap
pub const DEFAULT_MAX_HOPS: usize = 10;

/// Leading tokens that mark a line as an import.
///
/// Textual matching only: unusual formatting (line continuations, imports
/// after a semicolon) is misclassified.
pub const IMPORT_PREFIXES: &[&str] = &["import ", "from "];

pub fn is_import_line(line: &str) -> bool {
    let line = line.trim_start();
    IMPORT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Where a single definition hop is asked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopQuery {
    pub path: PathBuf,
    pub position: EnginePosition,
}

impl HopQuery {
    pub fn new(path: impl Into<PathBuf>, position: EnginePosition) -> Self {
        Self {
            path: path.into(),
            position,
        }
    }

    /// A query positioned on a previously found location.
    pub fn at(location: &DefinitionLocation) -> Self {
        Self::new(location.path.clone(), location.engine_position())
    }
}

/// Single-hop "go to definition".
pub trait DefinitionOracle {
    /// Candidate definitions in engine order; the walk takes the first.
    ///
    /// `source` is the text of `query.path` as the walk classifies it.
    fn definitions(&self, query: &HopQuery, source: &str) -> BrokerResult<Vec<DefinitionLocation>>;
}

/// Source text by path, and lines by (path, 1-based line number).
pub trait LineSource {
    fn text(&mut self, path: &Path) -> BrokerResult<&str>;

    /// `Ok(None)` when the line number is out of range for the file.
    fn line(&mut self, path: &Path, line: u32) -> BrokerResult<Option<String>> {
        let Some(index) = (line as usize).checked_sub(1) else {
            return Ok(None);
        };
        Ok(self.text(path)?.lines().nth(index).map(str::to_string))
    }
}

/// Lines from unsaved buffers first, then from disk.
///
/// Files read from disk are kept for the lifetime of this value.
#[derive(Debug, Default)]
pub struct SourceLines {
    contents: HashMap<PathBuf, String>,
}

impl SourceLines {
    pub fn new(buffers: impl IntoIterator<Item = (PathBuf, String)>) -> Self {
        Self {
            contents: buffers.into_iter().collect(),
        }
    }
}

impl LineSource for SourceLines {
    fn text(&mut self, path: &Path) -> BrokerResult<&str> {
        let text = match self.contents.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!("reading {}", path.display());
                let text = std::fs::read_to_string(path).map_err(|source| {
                    BrokerError::FileRead {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                entry.insert(text)
            }
        };
        Ok(text.as_str())
    }
}

/// Ordered (path, line, column) sites seen during one walk.
#[derive(Debug, Default)]
pub struct VisitedSet {
    sites: Vec<DefinitionLocation>,
}

impl VisitedSet {
    pub fn contains(&self, location: &DefinitionLocation) -> bool {
        self.sites.iter().any(|seen| seen.site() == location.site())
    }

    pub fn push(&mut self, location: DefinitionLocation) {
        self.sites.push(location);
    }

    pub fn last(&self) -> Option<&DefinitionLocation> {
        self.sites.last()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Why the walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached a line that is not an import
    Definition,
    /// Landed on a site already visited
    Revisited,
    /// The line could not be read or is out of range
    Unclassifiable,
    /// The oracle had nothing more after at least one hop
    OracleExhausted,
    /// Hop cap reached
    HopLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    pub location: DefinitionLocation,
    pub reason: StopReason,
    /// Single-hop queries issued
    pub hops: usize,
}

enum WalkState {
    /// Ask the oracle for the next location
    Query(HopQuery),
    /// Classify a location the oracle returned
    Inspect(DefinitionLocation),
}

/// The walk itself. Holds no state between calls.
pub struct ImplementationWalk {
    max_hops: usize,
}

impl Default for ImplementationWalk {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HOPS)
    }
}

impl ImplementationWalk {
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    pub fn run(
        &self,
        origin: HopQuery,
        oracle: &impl DefinitionOracle,
        lines: &mut impl LineSource,
    ) -> BrokerResult<Implementation> {
        let mut visited = VisitedSet::default();
        let mut hops = 0;
        let mut state = WalkState::Query(origin);

        loop {
            state = match state {
                WalkState::Query(query) => {
                    if hops == self.max_hops {
                        tracing::info!("implementation walk reached {hops} hops");
                        return Self::degrade(visited, StopReason::HopLimit, hops);
                    }
                    hops += 1;
                    tracing::debug!(
                        "hop {hops}/{}: definition at {}:{}",
                        self.max_hops,
                        query.path.display(),
                        query.position.line
                    );
                    let found = lines
                        .text(&query.path)
                        .and_then(|source| oracle.definitions(&query, source));
                    match found {
                        Ok(found) => match found.into_iter().next() {
                            Some(location) => WalkState::Inspect(location),
                            None => {
                                return Self::degrade(visited, StopReason::OracleExhausted, hops);
                            }
                        },
                        Err(e) => {
                            tracing::debug!("definition hop failed: {e}");
                            return Self::degrade(visited, StopReason::OracleExhausted, hops);
                        }
                    }
                }
                WalkState::Inspect(location) => {
                    if visited.contains(&location) {
                        return Ok(Self::stop(location, StopReason::Revisited, hops));
                    }
                    visited.push(location.clone());

                    let line = match lines.line(&location.path, location.line) {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            tracing::warn!(
                                "line {} out of range in {}",
                                location.line,
                                location.path.display()
                            );
                            return Ok(Self::stop(location, StopReason::Unclassifiable, hops));
                        }
                        Err(e) => {
                            tracing::warn!("{e}");
                            return Ok(Self::stop(location, StopReason::Unclassifiable, hops));
                        }
                    };

                    if !is_import_line(&line) {
                        return Ok(Self::stop(location, StopReason::Definition, hops));
                    }
                    WalkState::Query(HopQuery::at(&location))
                }
            };
        }
    }

    fn stop(location: DefinitionLocation, reason: StopReason, hops: usize) -> Implementation {
        tracing::debug!(
            "implementation walk stopped ({reason:?}) at {}:{}",
            location.path.display(),
            location.line
        );
        Implementation {
            location,
            reason,
            hops,
        }
    }

    /// Best known location, or a failure when nothing was ever found.
    fn degrade(
        mut visited: VisitedSet,
        reason: StopReason,
        hops: usize,
    ) -> BrokerResult<Implementation> {
        match visited.sites.pop() {
            Some(last) => Ok(Self::stop(last, reason, hops)),
            None => Err(BrokerError::no_definition("implementation")),
        }
    }
}
