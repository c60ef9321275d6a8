//! Mutual exclusion around the engine call boundary.
//!
//! The engine is not reentrant. The only way to reach it is through
//! [`EngineGuard::with`], which holds the lock for the duration of the
//! closure and nothing else. Callers resolve configuration and read files
//! before entering, and take the guard again for every further call.

use parking_lot::Mutex;
use std::sync::Arc;

use super::Engine;

pub struct EngineGuard {
    engine: Mutex<Arc<dyn Engine>>,
}

impl EngineGuard {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Engine) -> R) -> R {
        let engine = self.engine.lock();
        f(engine.as_ref())
    }

    /// Engine name, taken under the guard.
    pub fn engine_name(&self) -> String {
        self.with(|engine| engine.name().to_string())
    }
}

impl std::fmt::Debug for EngineGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineResult, EngineSession, RuntimeEnvironment};
    use crate::resolver::ProjectConfig;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingEngine {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Engine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        fn version(&self) -> String {
            "0".into()
        }

        fn resolve_runtime(&self, _executable: Option<&Path>) -> EngineResult<RuntimeEnvironment> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RuntimeEnvironment {
                executable: PathBuf::from("/bin/rt"),
                sys_path: vec![],
                version: vec![1],
            })
        }

        fn default_project_root(&self, directory: &Path) -> PathBuf {
            directory.to_path_buf()
        }

        fn open_session(
            &self,
            _source: &str,
            _path: &Path,
            _project: &ProjectConfig,
            _runtime: &RuntimeEnvironment,
        ) -> EngineResult<Box<dyn EngineSession>> {
            unimplemented!("not exercised")
        }
    }

    #[test]
    fn engine_calls_never_overlap() {
        let engine = Arc::new(CountingEngine::default());
        let guard = Arc::new(EngineGuard::new(engine.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        guard.with(|e| e.resolve_runtime(None)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(guard.engine_name(), "counting");
    }
}
