//! Shared path helpers: byte lengths, absolute resolution, default log names.

use std::env;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Number of bytes the OS sees for this name or path.
///
/// For UTF-8 names this is the UTF-8 byte length; multi-byte characters are
/// never undercounted.
#[must_use]
pub fn byte_len(value: impl AsRef<OsStr>) -> usize {
    value.as_ref().as_encoded_bytes().len()
}

/// Resolve a path to an absolute, normalized path.
///
/// Existing paths go through `fs::canonicalize`. Anything else is made absolute
/// relative to the CWD and has `.`/`..` resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// Default text log file name for a working directory: `<basename>.LOG`.
///
/// The filesystem root has no basename and maps to `root.LOG`.
#[must_use]
pub fn auto_log_name(cwd: &Path) -> PathBuf {
    let normalized = normalize_syntactic(cwd);
    let base = normalized
        .file_name()
        .map_or_else(|| "root".to_string(), |name| name.to_string_lossy().into_owned());
    PathBuf::from(format!("{base}.LOG"))
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
