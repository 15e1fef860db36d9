use crate::error::{Result, VibecraftError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Names that would collide with the project layout or the tool itself.
pub const RESERVED_NAMES: &[&str] = &["core", "vibecraft", "test", "shared", "integration"];

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap())
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

// ---------------------------------------------------------------------------
// Module names
// ---------------------------------------------------------------------------

pub fn validate_module_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VibecraftError::InvalidModuleName(
            "cannot be empty".to_string(),
        ));
    }
    if !name_re().is_match(name) {
        return Err(VibecraftError::InvalidModuleName(format!(
            "'{name}'. Must be a valid identifier"
        )));
    }
    if is_reserved(name) {
        return Err(VibecraftError::InvalidModuleName(format!(
            "'{name}' is reserved"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Module paths
// ---------------------------------------------------------------------------

/// Reject names that would place `<modules_dir>/<name>` outside `root`.
///
/// The containment check is lexical: nothing is resolved on disk, so it
/// works before the module directory exists.
pub fn validate_module_path(name: &str, root: &Path, modules_dir: &str) -> Result<()> {
    if is_reserved(name) {
        return Err(VibecraftError::Security(format!(
            "'{name}' is a reserved name"
        )));
    }
    if name.contains("..") {
        return Err(VibecraftError::Security(format!(
            "'{name}'. Path traversal is not allowed"
        )));
    }
    if is_absolute_like(name) {
        return Err(VibecraftError::Security(format!(
            "'{name}'. Absolute paths are not allowed"
        )));
    }

    let root = normalize(root);
    let target = normalize(&root.join(modules_dir).join(name));
    if !target.starts_with(&root) || target == root {
        return Err(VibecraftError::Security(
            "must be within project directory".to_string(),
        ));
    }
    Ok(())
}

/// `/x`, `C:x` and `\\server` all count, whatever the host platform.
fn is_absolute_like(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with("\\\\")
        || path.as_bytes().get(1) == Some(&b':')
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["auth", "user_service", "_private", "Api2"] {
            validate_module_name(name).unwrap();
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "2fast", "my-module", "has space", "dots.in.name", "ünicode"] {
            assert!(
                matches!(validate_module_name(name), Err(VibecraftError::InvalidModuleName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn reserved_names_are_invalid() {
        for name in RESERVED_NAMES {
            let err = validate_module_name(name).unwrap_err();
            assert!(err.to_string().contains("reserved"));
        }
    }

    #[test]
    fn path_accepts_plain_names() {
        validate_module_path("auth", Path::new("/work/proj"), "modules").unwrap();
    }

    #[test]
    fn path_rejects_reserved_traversal_and_absolute() {
        let root = Path::new("/work/proj");
        for name in ["core", "../etc", "a/../../b", "/etc/passwd", "C:\\win", "\\\\share\\x"] {
            let err = validate_module_path(name, root, "modules").unwrap_err();
            assert!(err.is_security_error(), "{name:?} should be a security error");
            assert!(err.to_string().starts_with("Module path is invalid"));
        }
    }

    #[test]
    fn path_must_stay_under_root() {
        let root = Path::new("/work/proj");
        assert!(validate_module_path(".", root, ".").is_err());
        validate_module_path("x", root, "./components").unwrap();
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }
}
