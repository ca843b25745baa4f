//! Canonical path handling. Canonical form is absolute, `/`-separated, with
//! no empty, `.` or `..` segments and no trailing slash (except root).

use crate::error::VfsError;

pub const ROOT: &str = "/";

/// Normalize an absolute path.
pub fn normalize(path: &str) -> Result<String, VfsError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(VfsError::InvalidPath("empty path".to_string()));
    }
    if !trimmed.starts_with('/') {
        return Err(VfsError::InvalidPath(format!("not absolute: {}", trimmed)));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Resolve `path` against `cwd`, then normalize.
pub fn resolve(cwd: &str, path: &str) -> Result<String, VfsError> {
    if path.starts_with('/') {
        normalize(path)
    } else if path.is_empty() {
        normalize(cwd)
    } else {
        normalize(&format!("{}/{}", cwd, path))
    }
}

/// Segments of a canonical path; empty for root.
pub fn segments(canonical: &str) -> Vec<&str> {
    canonical.split('/').filter(|s| !s.is_empty()).collect()
}

pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// `(parent, name)` of a canonical, non-root path.
pub fn split_parent(canonical: &str) -> Option<(&str, &str)> {
    if canonical == ROOT {
        return None;
    }
    let index = canonical.rfind('/')?;
    let parent = if index == 0 { ROOT } else { &canonical[..index] };
    Some((parent, &canonical[index + 1..]))
}

/// True if `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }
    path == ancestor || path.starts_with(&format!("{}/", ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("//workspace//a/").unwrap(), "/workspace/a");
        assert_eq!(normalize("/workspace/./a/../b").unwrap(), "/workspace/b");
        assert_eq!(normalize("/../..").unwrap(), "/");
        assert!(matches!(normalize("workspace"), Err(VfsError::InvalidPath(_))));
        assert!(matches!(normalize("  "), Err(VfsError::InvalidPath(_))));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/workspace", "src").unwrap(), "/workspace/src");
        assert_eq!(resolve("/workspace", "..").unwrap(), "/");
        assert_eq!(resolve("/workspace", "/tmp").unwrap(), "/tmp");
        assert_eq!(resolve("/workspace", "").unwrap(), "/workspace");
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/a"), Some(("/", "a")));
        assert_eq!(split_parent("/a/b/c"), Some(("/a/b", "c")));
        assert_eq!(split_parent("/"), None);
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/a/b", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(!is_within("/ab", "/a"));
        assert!(is_within("/anything", "/"));
    }
}
