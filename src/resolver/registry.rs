//! Hook registries: which configuration hook governs a source file

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ResolutionResult;
use super::hooks::{ConfigHook, TomlHook};

/// Locates the configuration hook for a source file, if any.
pub trait HookRegistry: Send + Sync {
    fn hook_for(&self, file: &Path) -> ResolutionResult<Option<Arc<dyn ConfigHook>>>;
}

/// Registry that never finds a hook; every file gets the default settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl HookRegistry for NoHooks {
    fn hook_for(&self, _file: &Path) -> ResolutionResult<Option<Arc<dyn ConfigHook>>> {
        Ok(None)
    }
}

/// Explicitly registered hooks, each governing a directory tree.
///
/// The hook with the deepest root enclosing the file wins.
#[derive(Default)]
pub struct SimpleHookRegistry {
    hooks: Vec<(PathBuf, Arc<dyn ConfigHook>)>,
}

impl SimpleHookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add(&mut self, root: impl Into<PathBuf>, hook: Arc<dyn ConfigHook>) {
        self.hooks.push((root.into(), hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl HookRegistry for SimpleHookRegistry {
    fn hook_for(&self, file: &Path) -> ResolutionResult<Option<Arc<dyn ConfigHook>>> {
        Ok(self
            .hooks
            .iter()
            .filter(|(root, _)| file.starts_with(root))
            .max_by_key(|(root, _)| root.components().count())
            .map(|(_, hook)| hook.clone()))
    }
}

/// Finds hook files by walking up from the source file's directory.
///
/// Parsed hook files are kept for the process lifetime. A file that fails
/// to parse is not remembered, so fixing it takes effect on the next miss.
pub struct ProjectFileHooks {
    file_name: String,
    loaded: DashMap<PathBuf, Arc<TomlHook>>,
}

impl ProjectFileHooks {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            loaded: DashMap::new(),
        }
    }

    /// Nearest hook file at or above the file's directory.
    pub fn find_hook_file(&self, file: &Path) -> Option<PathBuf> {
        let start = file.parent()?;
        start
            .ancestors()
            .map(|dir| dir.join(&self.file_name))
            .find(|candidate| candidate.is_file())
    }
}

impl HookRegistry for ProjectFileHooks {
    fn hook_for(&self, file: &Path) -> ResolutionResult<Option<Arc<dyn ConfigHook>>> {
        let Some(hook_path) = self.find_hook_file(file) else {
            return Ok(None);
        };

        if let Some(hook) = self.loaded.get(&hook_path) {
            return Ok(Some(hook.clone() as Arc<dyn ConfigHook>));
        }

        tracing::debug!("loading configuration hook {}", hook_path.display());
        let hook = Arc::new(TomlHook::load(&hook_path)?);
        let hook = self.loaded.entry(hook_path).or_insert(hook).clone();
        Ok(Some(hook as Arc<dyn ConfigHook>))
    }
}
