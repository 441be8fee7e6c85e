// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Policy (component A): normalize and admit/deny a filesystem path
//! against an allow-set. Pure and idempotent — no I/O, no symlink
//! resolution. A later `open` syscall that escapes through a symlink is a
//! residual risk this layer does not mitigate.

use std::path::{Component, Path, PathBuf};

/// Resolve lexical `.` and `..` segments without touching the filesystem.
/// Returns `None` for an empty path or one containing a NUL byte.
pub fn normalize(path: &str) -> Option<PathBuf> {
    if path.is_empty() || path.contains('\0') {
        return None;
    }

    let mut stack: Vec<Component> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(stack.last(), Some(Component::Normal(_))) {
                    stack.pop();
                }
            }
            other => stack.push(other),
        }
    }

    let mut out = PathBuf::new();
    for component in stack {
        out.push(component.as_os_str());
    }
    Some(out)
}

/// Normalize an allow-root: strip a trailing separator unless the root
/// itself is the filesystem root.
pub fn normalize_root(root: &str) -> String {
    let normalized = normalize(root).unwrap_or_else(|| PathBuf::from(root));
    let s = normalized.to_string_lossy().into_owned();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s
    }
}

/// `admit(path, roots) -> bool`. A candidate path is admitted iff its
/// normalized form equals some root or has that root as a strict
/// directory prefix (root followed by `/`, or the root is `/`).
pub fn admit(path: &str, roots: &[String]) -> bool {
    let Some(normalized) = normalize(path) else {
        return false;
    };
    if !normalized.is_absolute() {
        return false;
    }
    let candidate = normalized.to_string_lossy();

    roots.iter().any(|root| {
        let root = normalize_root(root);
        if root == "/" {
            return true;
        }
        candidate.as_ref() == root || candidate.starts_with(&format!("{root}/"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_slash_matches_everything() {
        assert!(admit("/etc/shadow", &["/".to_string()]));
        assert!(admit("/", &["/".to_string()]));
    }

    #[test]
    fn strict_prefix_not_substring() {
        assert!(!admit("/appfile", &["/app".to_string()]));
        assert!(admit("/app/file", &["/app".to_string()]));
        assert!(admit("/app", &["/app".to_string()]));
    }

    #[test]
    fn lexical_dotdot_escapes_allow_root() {
        // /a/../etc/passwd normalizes to /etc/passwd, which is outside /a
        assert!(!admit("/a/../etc/passwd", &["/a".to_string()]));
        assert!(admit("/a/../etc/passwd", &["/etc".to_string()]));
    }

    #[test]
    fn empty_path_rejected() {
        assert!(!admit("", &["/".to_string()]));
    }

    #[test]
    fn relative_path_rejected() {
        assert!(!admit("etc/passwd", &["/".to_string()]));
    }

    #[test]
    fn normalize_strips_current_dir() {
        assert_eq!(normalize("/a/./b"), Some(PathBuf::from("/a/b")));
    }

    #[test]
    fn normalize_root_strips_trailing_slash() {
        assert_eq!(normalize_root("/app/"), "/app");
        assert_eq!(normalize_root("/"), "/");
    }
}
