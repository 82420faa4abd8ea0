use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub trait ToolResolver: Send + Sync {
    fn resolve(&self, tool: &str) -> Option<PathBuf>;
}

/// Resolves tool names to executables, caching hits.
///
/// Misses are not cached: a client installed mid-session is picked up by the
/// next probe.
pub struct ToolRegistry {
    resolver: Arc<dyn ToolResolver>,
    cache: Mutex<HashMap<String, PathBuf>>,
}

impl ToolRegistry {
    pub fn new(resolver: Arc<dyn ToolResolver>) -> Self {
        Self {
            resolver,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn has(&self, tool: &str) -> bool {
        self.resolve(tool).is_some()
    }

    pub fn require(&self, tool: &str) -> std::io::Result<PathBuf> {
        self.resolve(tool).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("tool not found in PATH: {tool}"),
            )
        })
    }

    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(v) = cache.get(tool) {
            return Some(v.clone());
        }

        let resolved = self.resolver.resolve(tool)?;
        cache.insert(tool.to_string(), resolved.clone());
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticResolver {
        map: HashMap<String, Option<PathBuf>>,
        lookups: AtomicUsize,
    }

    impl ToolResolver for StaticResolver {
        fn resolve(&self, tool: &str) -> Option<PathBuf> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.map.get(tool).cloned().unwrap_or(None)
        }
    }

    #[test]
    fn registry_caches_hits_but_not_misses() {
        let mut map = HashMap::new();
        map.insert("git".to_string(), Some(PathBuf::from("/usr/bin/git")));
        let resolver = Arc::new(StaticResolver {
            map,
            lookups: AtomicUsize::new(0),
        });

        let reg = ToolRegistry::new(resolver.clone());
        assert!(reg.has("git"));
        assert!(reg.has("git"));
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);

        assert!(!reg.has("cm"));
        assert!(!reg.has("cm"));
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn require_errors_when_missing() {
        let reg = ToolRegistry::new(Arc::new(StaticResolver {
            map: HashMap::new(),
            lookups: AtomicUsize::new(0),
        }));
        let err = reg.require("cm").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
