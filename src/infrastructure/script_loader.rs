use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Directories never searched for scripts.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    "node_modules",
    ".tox",
    ".mypy_cache",
];

/// One script file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub path: String,
    pub content: String,
    /// Set when the file was found but could not be read as UTF-8 text.
    pub read_error: Option<String>,
}

impl ScriptSource {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            read_error: None,
        }
    }

    pub fn unreadable(path: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
            read_error: Some(error.to_string()),
        }
    }
}

pub struct ScriptLoader;

impl ScriptLoader {
    /// Read the given script files, in the order given. A path that does not
    /// exist is an error; a file that cannot be read becomes an unreadable
    /// source so the other files are still extracted.
    pub fn load_files(paths: &[String]) -> Result<Vec<ScriptSource>> {
        paths
            .iter()
            .map(|path| {
                let metadata = fs::metadata(path)
                    .with_context(|| format!("Failed to read script {}", path))?;
                if metadata.is_dir() {
                    bail!("{} is a directory; use --folder", path);
                }
                Ok(Self::read_script(Path::new(path)))
            })
            .collect()
    }

    /// Recursively collect every `.py` file under `dir`, sorted by path.
    /// Symlinked directories are not followed.
    pub fn load_folder(dir: &str) -> Result<Vec<ScriptSource>> {
        let root = Path::new(dir);
        if !root.is_dir() {
            bail!("{} is not a directory", dir);
        }

        let mut scripts = Vec::new();
        Self::collect_py_recursive(root, &mut scripts)?;
        scripts.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(folder = dir, scripts = scripts.len(), "collected scripts");
        Ok(scripts)
    }

    fn collect_py_recursive(dir: &Path, out: &mut Vec<ScriptSource>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("Failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name));
                if skipped {
                    tracing::debug!(dir = %path.display(), "skipping directory");
                    continue;
                }
                Self::collect_py_recursive(&path, out)?;
            } else if file_type.is_symlink() && path.is_dir() {
                tracing::debug!(dir = %path.display(), "not following symlinked directory");
            } else if path.extension().is_some_and(|ext| ext == "py") {
                out.push(Self::read_script(&path));
            }
        }
        Ok(())
    }

    fn read_script(path: &Path) -> ScriptSource {
        let display_path = path.display().to_string();
        match fs::read_to_string(path) {
            Ok(content) => ScriptSource::new(display_path, content),
            Err(e) => {
                tracing::warn!(path = %display_path, error = %e, "cannot read script");
                ScriptSource::unreadable(display_path, e)
            }
        }
    }
}
