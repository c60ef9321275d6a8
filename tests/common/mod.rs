//! Shared fixtures: on-disk projects and a scripted engine.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use engine_broker::ProjectConfig;
use engine_broker::engine::{
    ChangeSet, Completion, Definition, Engine, EngineError, EngineResult, EngineSession,
    RuntimeEnvironment, Signature,
};
use engine_broker::responses::GoToResponse;
use engine_broker::types::{DefinitionLocation, EnginePosition};
use parking_lot::Mutex;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// A file the executable lookup accepts as an interpreter.
    #[cfg(unix)]
    pub fn add_executable(&self, path: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let file_path = self.add_file(path, "#!/bin/sh\n");
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Answers and call counters shared by the engine and its sessions.
#[derive(Default)]
pub struct Script {
    /// Definitions returned by `goto`, keyed by (file, line, column)
    pub goto: Mutex<HashMap<(PathBuf, u32, u32), Vec<Definition>>>,
    pub infer: Mutex<Vec<Definition>>,
    pub references: Mutex<Vec<Definition>>,
    pub symbols: Mutex<Vec<Definition>>,
    pub completions: Mutex<Vec<Completion>>,
    pub signatures: Mutex<Vec<Signature>>,
    pub change_set: Mutex<Option<ChangeSet>>,

    pub runtime_calls: AtomicUsize,
    pub root_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub goto_calls: AtomicUsize,
    /// (path, source) of every opened session, in order
    pub sessions: Mutex<Vec<(PathBuf, String)>>,
    /// Last (position, name, until) seen by a refactor
    pub last_refactor: Mutex<Option<(EnginePosition, String, Option<EnginePosition>)>>,
    pub last_symbol_limit: AtomicUsize,

    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Script {
    pub fn on_goto(&self, path: impl Into<PathBuf>, line: u32, column: u32, answer: Vec<Definition>) {
        self.goto.lock().insert((path.into(), line, column), answer);
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }
}

struct InFlight<'a>(&'a Script);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Engine answering from a [`Script`].
pub struct ScriptedEngine {
    pub script: Arc<Script>,
}

impl ScriptedEngine {
    pub fn new() -> (Arc<Self>, Arc<Script>) {
        let script = Arc::new(Script::default());
        (
            Arc::new(Self {
                script: script.clone(),
            }),
            script,
        )
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn version(&self) -> String {
        "0.0.1".to_string()
    }

    fn resolve_runtime(&self, executable: Option<&Path>) -> EngineResult<RuntimeEnvironment> {
        let _busy = self.script.enter();
        self.script.runtime_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RuntimeEnvironment {
            executable: executable
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("/usr/bin/python3")),
            sys_path: vec![PathBuf::from("/usr/lib/python3/site-packages")],
            version: vec![3, 12, 0],
        })
    }

    fn default_project_root(&self, directory: &Path) -> PathBuf {
        let _busy = self.script.enter();
        self.script.root_calls.fetch_add(1, Ordering::SeqCst);
        directory.to_path_buf()
    }

    fn open_session(
        &self,
        source: &str,
        path: &Path,
        _project: &ProjectConfig,
        _runtime: &RuntimeEnvironment,
    ) -> EngineResult<Box<dyn EngineSession>> {
        self.script.session_calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .sessions
            .lock()
            .push((path.to_path_buf(), source.to_string()));
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            path: path.to_path_buf(),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    path: PathBuf,
}

impl ScriptedSession {
    fn refactor(
        &self,
        at: EnginePosition,
        name: &str,
        until: Option<EnginePosition>,
    ) -> EngineResult<ChangeSet> {
        let _busy = self.script.enter();
        *self.script.last_refactor.lock() = Some((at, name.to_string(), until));
        self.script
            .change_set
            .lock()
            .clone()
            .ok_or_else(|| EngineError::new("Nothing to refactor"))
    }
}

impl EngineSession for ScriptedSession {
    fn complete(&self, _at: EnginePosition) -> EngineResult<Vec<Completion>> {
        let _busy = self.script.enter();
        Ok(self.script.completions.lock().clone())
    }

    fn signatures(&self, _at: EnginePosition) -> EngineResult<Vec<Signature>> {
        let _busy = self.script.enter();
        Ok(self.script.signatures.lock().clone())
    }

    fn infer(&self, _at: EnginePosition) -> EngineResult<Vec<Definition>> {
        let _busy = self.script.enter();
        Ok(self.script.infer.lock().clone())
    }

    fn goto(&self, at: EnginePosition) -> EngineResult<Vec<Definition>> {
        let _busy = self.script.enter();
        // Widen the window in which overlapping calls would be observed.
        std::thread::yield_now();
        self.script.goto_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .script
            .goto
            .lock()
            .get(&(self.path.clone(), at.line, at.column))
            .cloned()
            .unwrap_or_default())
    }

    fn references(&self, _at: EnginePosition) -> EngineResult<Vec<Definition>> {
        let _busy = self.script.enter();
        Ok(self.script.references.lock().clone())
    }

    fn search_symbol(&self, _query: &str, limit: usize) -> EngineResult<Vec<Definition>> {
        let _busy = self.script.enter();
        self.script.last_symbol_limit.store(limit, Ordering::SeqCst);
        Ok(self.script.symbols.lock().iter().take(limit).cloned().collect())
    }

    fn rename(&self, at: EnginePosition, new_name: &str) -> EngineResult<ChangeSet> {
        self.refactor(at, new_name, None)
    }

    fn inline(&self, at: EnginePosition) -> EngineResult<ChangeSet> {
        self.refactor(at, "", None)
    }

    fn extract_variable(
        &self,
        at: EnginePosition,
        new_name: &str,
        until: Option<EnginePosition>,
    ) -> EngineResult<ChangeSet> {
        self.refactor(at, new_name, until)
    }

    fn extract_function(
        &self,
        at: EnginePosition,
        new_name: &str,
        until: Option<EnginePosition>,
    ) -> EngineResult<ChangeSet> {
        self.refactor(at, new_name, until)
    }
}

/// A located definition as the engine reports it (0-based column).
pub fn definition(path: impl Into<PathBuf>, line: u32, column: u32) -> Definition {
    Definition {
        module_path: Some(path.into()),
        line: Some(line),
        column: Some(column),
        description: format!("def at {line}:{column}"),
        ..Default::default()
    }
}

/// Every location of a goto response, in engine order.
pub fn goto_locations(goto: GoToResponse) -> Vec<DefinitionLocation> {
    match goto {
        GoToResponse::Single(location) => vec![location],
        GoToResponse::Multiple(locations) => locations,
    }
}
