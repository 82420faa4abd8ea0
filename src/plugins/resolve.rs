use std::path::{Path, PathBuf};

use super::registry::ToolResolver;

pub struct PathResolver;

impl ToolResolver for PathResolver {
    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        find_in_path(tool)
    }
}

/// Hands the tool name straight to the runner without a PATH lookup.
///
/// Used with `MockRunner`, where nothing is actually spawned.
pub struct LiteralResolver;

impl ToolResolver for LiteralResolver {
    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        if tool.is_empty() {
            None
        } else {
            Some(PathBuf::from(tool))
        }
    }
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| (m.permissions().mode() & 0o111) != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        // Best-effort: on non-unix, existence is our proxy.
        true
    }
}

fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(tool)];
    if cfg!(windows) && Path::new(tool).extension().is_none() {
        out.push(dir.join(format!("{tool}.exe")));
    }
    out
}

/// Resolve a tool by searching PATH. Names containing a path separator are
/// checked directly.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    if tool.is_empty() {
        return None;
    }

    let direct = Path::new(tool);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for candidate in candidates(&dir, tool) {
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}
