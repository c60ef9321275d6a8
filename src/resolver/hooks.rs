//! Per-project configuration hooks
//!
//! A hook is the project's say in how its files are analysed: which
//! interpreter to use, where the project root is, and what the final search
//! path should be. Both capabilities are optional.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{ResolutionError, ResolutionResult};
use crate::types::ClientData;

/// Settings key naming the interpreter the runtime is resolved from
pub const INTERPRETER_PATH: &str = "interpreter_path";
/// Settings key naming an explicit project root
pub const PROJECT_DIRECTORY: &str = "project_directory";
/// Settings key with extra search path entries
pub const SYS_PATH: &str = "sys_path";

/// Option name → value mapping produced once per file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedSettings {
    options: Map<String, Value>,
}

impl ResolvedSettings {
    pub fn new(options: Map<String, Value>) -> Self {
        Self { options }
    }

    /// Settings used when no hook answers: only the default interpreter path.
    pub fn fallback(default_interpreter: &str) -> Self {
        let mut options = Map::new();
        options.insert(
            INTERPRETER_PATH.to_string(),
            Value::String(default_interpreter.to_string()),
        );
        Self { options }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Interpreter path hint; empty means the system default runtime.
    pub fn interpreter_path(&self) -> &str {
        self.get(INTERPRETER_PATH)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn project_directory(&self) -> Option<PathBuf> {
        self.get(PROJECT_DIRECTORY)
            .and_then(Value::as_str)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }

    pub fn sys_path(&self) -> Vec<PathBuf> {
        self.get(SYS_PATH)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// What a hook sees when asked for the final search path.
#[derive(Debug)]
pub struct SysPathContext<'a> {
    pub settings: &'a ResolvedSettings,
    pub interpreter_path: &'a Path,
    /// Settings entries followed by the runtime's own search path
    pub sys_path: &'a [PathBuf],
}

/// External per-project configuration hook.
pub trait ConfigHook: Send + Sync {
    /// Where the hook came from, for diagnostics
    fn origin(&self) -> &Path;

    /// Settings for `filename`; `None` falls back to the defaults.
    fn settings(
        &self,
        _language: &str,
        _filename: &Path,
        _client_data: &ClientData,
    ) -> Option<Map<String, Value>> {
        None
    }

    /// Replacement for the computed search path; `None` keeps it.
    fn sys_path(&self, _context: &SysPathContext<'_>) -> Option<Vec<PathBuf>> {
        None
    }
}

#[derive(Debug, Deserialize, Default)]
struct HookFile {
    #[serde(default)]
    settings: Option<toml::Table>,
    #[serde(default)]
    search_path: Option<SearchPathSection>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchPathSection {
    #[serde(default)]
    prepend: Vec<PathBuf>,
    #[serde(default)]
    append: Vec<PathBuf>,
}

/// Hook backed by a TOML file in the project tree.
///
/// ```toml
/// [settings]
/// interpreter_path = "./venv/bin/python"
/// project_directory = "."
/// sys_path = ["src"]
///
/// [search_path]
/// prepend = ["vendor"]
/// append = ["/opt/shared/lib"]
/// ```
///
/// Relative paths are taken from the directory holding the file.
#[derive(Debug)]
pub struct TomlHook {
    origin: PathBuf,
    settings: Option<Map<String, Value>>,
    search_path: Option<(Vec<PathBuf>, Vec<PathBuf>)>,
}

impl TomlHook {
    pub fn load(path: &Path) -> ResolutionResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ResolutionError::hook_config(path.to_path_buf(), e.to_string()))?;
        Self::parse(path, &content)
    }

    pub fn parse(origin: &Path, content: &str) -> ResolutionResult<Self> {
        let file: HookFile = toml::from_str(content)
            .map_err(|e| ResolutionError::hook_config(origin.to_path_buf(), e.to_string()))?;
        let base = origin.parent().unwrap_or(Path::new("")).to_path_buf();

        let settings = match file.settings {
            Some(table) => {
                let value = serde_json::to_value(table).map_err(|e| {
                    ResolutionError::hook_config(origin.to_path_buf(), e.to_string())
                })?;
                let mut options = match value {
                    Value::Object(options) => options,
                    _ => Map::new(),
                };
                anchor_relative(&mut options, &base);
                Some(options)
            }
            None => None,
        };

        let search_path = file.search_path.map(|section| {
            let anchor = |entries: Vec<PathBuf>| -> Vec<PathBuf> {
                entries.into_iter().map(|p| base.join(p)).collect()
            };
            (anchor(section.prepend), anchor(section.append))
        });

        Ok(Self {
            origin: origin.to_path_buf(),
            settings,
            search_path,
        })
    }
}

/// Resolve relative project and interpreter paths against the hook directory.
fn anchor_relative(options: &mut Map<String, Value>, base: &Path) {
    if let Some(Value::String(dir)) = options.get_mut(PROJECT_DIRECTORY) {
        if !dir.is_empty() && Path::new(dir.as_str()).is_relative() {
            *dir = base.join(dir.as_str()).to_string_lossy().into_owned();
        }
    }
    // Bare names like "python3" are looked up on PATH instead.
    if let Some(Value::String(interpreter)) = options.get_mut(INTERPRETER_PATH) {
        if interpreter.starts_with("./") || interpreter.starts_with("../") {
            *interpreter = base.join(interpreter.as_str()).to_string_lossy().into_owned();
        }
    }
    if let Some(Value::Array(entries)) = options.get_mut(SYS_PATH) {
        for entry in entries.iter_mut() {
            if let Value::String(p) = entry {
                if Path::new(p.as_str()).is_relative() {
                    *p = base.join(p.as_str()).to_string_lossy().into_owned();
                }
            }
        }
    }
}

impl ConfigHook for TomlHook {
    fn origin(&self) -> &Path {
        &self.origin
    }

    fn settings(
        &self,
        _language: &str,
        _filename: &Path,
        _client_data: &ClientData,
    ) -> Option<Map<String, Value>> {
        self.settings.clone()
    }

    fn sys_path(&self, context: &SysPathContext<'_>) -> Option<Vec<PathBuf>> {
        let (prepend, append) = self.search_path.as_ref()?;
        let mut sys_path = prepend.clone();
        sys_path.extend_from_slice(context.sys_path);
        sys_path.extend(append.iter().cloned());
        Some(sys_path)
    }
}
