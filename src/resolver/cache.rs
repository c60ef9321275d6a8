//! The resolution cache: settings → runtime → project, memoized per file.

use std::path::Path;
use std::sync::Arc;

use super::hooks::{ResolvedSettings, SysPathContext};
use super::interpreter::{RuntimeKey, runtime_key};
use super::memo::ResolutionMemo;
use super::registry::HookRegistry;
use super::{ProjectConfig, ResolutionError, ResolutionResult};
use crate::engine::{EngineGuard, RuntimeEnvironment};
use crate::types::FileKey;

/// Everything the engine needs to open a session for one file.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: Arc<ResolvedSettings>,
    pub runtime: Arc<RuntimeEnvironment>,
    pub project: Arc<ProjectConfig>,
}

/// Entry counts of the cache tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub settings: usize,
    pub runtimes: usize,
    pub projects: usize,
}

/// Process-lifetime cache of per-file resolution results.
///
/// Nothing is ever evicted: edits to a hook file are not seen for files
/// already resolved. Failed resolutions are not stored, so a fixed
/// configuration is picked up on the next request.
///
/// Concurrent misses on one key wait for a single computation. A
/// computation only waits on layers below it: project, file runtime,
/// settings, runtime, then the engine guard.
pub struct ResolutionCache {
    guard: Arc<EngineGuard>,
    hooks: Arc<dyn HookRegistry>,
    language: String,
    default_interpreter: String,
    settings: ResolutionMemo<FileKey, ResolvedSettings>,
    runtimes: ResolutionMemo<RuntimeKey, RuntimeEnvironment>,
    file_runtimes: ResolutionMemo<FileKey, RuntimeEnvironment>,
    projects: ResolutionMemo<FileKey, ProjectConfig>,
}

impl ResolutionCache {
    pub fn new(
        guard: Arc<EngineGuard>,
        hooks: Arc<dyn HookRegistry>,
        language: impl Into<String>,
        default_interpreter: impl Into<String>,
    ) -> Self {
        Self {
            guard,
            hooks,
            language: language.into(),
            default_interpreter: default_interpreter.into(),
            settings: ResolutionMemo::new(),
            runtimes: ResolutionMemo::new(),
            file_runtimes: ResolutionMemo::new(),
            projects: ResolutionMemo::new(),
        }
    }

    /// Resolve all three layers for `key`.
    pub fn resolve(&self, key: &FileKey) -> ResolutionResult<Resolved> {
        let runtime = self.runtime_for(key)?;
        let project = self.project_for(key)?;
        let settings = self.settings_for(key)?;
        Ok(Resolved {
            settings,
            runtime,
            project,
        })
    }

    /// Settings layer: ask the file's hook, fall back to the default interpreter.
    pub fn settings_for(&self, key: &FileKey) -> ResolutionResult<Arc<ResolvedSettings>> {
        self.settings.get_or_try_insert_with(key, || {
            let path = key.path();
            if let Some(hook) = self.hooks.hook_for(path)? {
                if let Some(options) = hook.settings(&self.language, path, key.client()) {
                    return Ok(ResolvedSettings::new(options));
                }
                tracing::debug!("no settings defined in {}", hook.origin().display());
            }
            Ok(ResolvedSettings::fallback(&self.default_interpreter))
        })
    }

    /// Runtime sub-cache, keyed by the normalized executable path.
    pub fn runtime_for_interpreter(&self, hint: &str) -> ResolutionResult<Arc<RuntimeEnvironment>> {
        let key = runtime_key(hint)?;
        self.runtimes.get_or_try_insert_with(&key, || {
            let executable = match &key {
                RuntimeKey::SystemDefault => None,
                RuntimeKey::Executable(path) => Some(path.as_path()),
            };
            let runtime = self
                .guard
                .with(|engine| engine.resolve_runtime(executable))
                .map_err(|e| ResolutionError::runtime_unavailable(hint, e))?;
            tracing::info!(
                "created runtime {} (version {})",
                runtime.executable.display(),
                runtime.version_string()
            );
            Ok(runtime)
        })
    }

    /// Runtime layer for a file.
    pub fn runtime_for(&self, key: &FileKey) -> ResolutionResult<Arc<RuntimeEnvironment>> {
        self.file_runtimes.get_or_try_insert_shared_with(key, || {
            let settings = self.settings_for(key)?;
            self.runtime_for_interpreter(settings.interpreter_path())
        })
    }

    /// Project layer: root and final search path for a file.
    pub fn project_for(&self, key: &FileKey) -> ResolutionResult<Arc<ProjectConfig>> {
        self.projects.get_or_try_insert_with(key, || {
            let settings = self.settings_for(key)?;
            let runtime = self.runtime_for(key)?;

            let mut sys_path = settings.sys_path();
            sys_path.extend(runtime.sys_path.iter().cloned());

            if let Some(hook) = self.hooks.hook_for(key.path())? {
                let context = SysPathContext {
                    settings: &settings,
                    interpreter_path: &runtime.executable,
                    sys_path: &sys_path,
                };
                if let Some(replaced) = hook.sys_path(&context) {
                    sys_path = replaced;
                }
            }

            let root = match settings.project_directory() {
                Some(directory) => directory,
                None => {
                    let directory = key.path().parent().unwrap_or(Path::new("/"));
                    self.guard
                        .with(|engine| engine.default_project_root(directory))
                }
            };
            tracing::debug!("project for {} rooted at {}", key.path().display(), root.display());

            Ok(ProjectConfig {
                root,
                sys_path,
                runtime_path: runtime.executable.clone(),
            })
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            settings: self.settings.len(),
            runtimes: self.runtimes.len(),
            projects: self.projects.len(),
        }
    }
}
