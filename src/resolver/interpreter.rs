//! Interpreter path hints: variable expansion, executable lookup, normalization

use regex::Regex;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use super::{ResolutionError, ResolutionResult};

/// Key of the runtime sub-cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeKey {
    /// Empty hint: the engine's default runtime
    SystemDefault,
    /// Normalized absolute executable path
    Executable(PathBuf),
}

fn var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("static regex")
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path hint.
///
/// Unset variables are left as written. Only the current user's home is
/// expanded: `~name/...` is not supported and stays as written, so the
/// executable lookup reports it as missing.
pub fn expand_variables(hint: &str) -> Cow<'_, str> {
    expand_with(hint, |name| std::env::var(name).ok())
}

fn expand_with(hint: &str, lookup: impl Fn(&str) -> Option<String>) -> Cow<'_, str> {
    let expanded = var_regex().replace_all(hint, |caps: &regex::Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        lookup(name).unwrap_or_else(|| caps[0].to_string())
    });

    let tilde = expanded == "~" || expanded.starts_with("~/");
    match (tilde, lookup("HOME")) {
        (true, Some(home)) => Cow::Owned(format!("{home}{}", &expanded[1..])),
        _ => expanded,
    }
}

/// Lexical normalization: drops `.` and folds `..` without touching the disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                let can_fold = matches!(last, Some(Component::Normal(_)));
                if can_fold {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turn an interpreter hint into a runtime cache key.
///
/// An empty hint selects the system default. Anything else must name an
/// executable on disk or on PATH.
pub fn runtime_key(hint: &str) -> ResolutionResult<RuntimeKey> {
    if hint.is_empty() {
        return Ok(RuntimeKey::SystemDefault);
    }
    let expanded = expand_variables(hint);
    let found = which::which(&*expanded).map_err(|e| {
        tracing::debug!("interpreter lookup for '{hint}' failed: {e}");
        ResolutionError::environment(hint)
    })?;
    let absolute = if found.is_absolute() {
        found
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&found))
            .unwrap_or(found)
    };
    Ok(RuntimeKey::Executable(normalize(&absolute)))
}
