//! Key, prefix and local-path rules.
//!
//! Prefixes are folder-scoped: `"abc"` selects `"abc/..."` and never `"abcdef"`.
//! Keys are stored without a leading `/`.

use crate::services::storage_service::{StorageError, StorageResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a bulk-operation prefix so it always names a folder.
///
/// The empty prefix stays empty and matches every object in the bucket.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Strip any leading `/` from a caller-supplied key.
pub fn strip_leading_slash(key: &str) -> &str {
    key.trim_start_matches('/')
}

/// Build the object key for an uploaded file.
///
/// `folder_path` has trailing `/` trimmed before joining; an absent or empty
/// folder stores the file at the bucket root.
pub fn upload_key(folder_path: Option<&str>, filename: &str) -> String {
    let key = match folder_path.map(|f| f.trim_end_matches('/')) {
        Some(folder) if !folder.is_empty() => format!("{}/{}", folder, filename),
        _ => filename.to_string(),
    };
    strip_leading_slash(&key).to_string()
}

/// Build the key of a folder placeholder object.
pub fn folder_key(key: &str) -> StorageResult<String> {
    let key = strip_leading_slash(key);
    if key.is_empty() {
        return Err(StorageError::InvalidRequest(
            "'key' must name a folder".into(),
        ));
    }
    Ok(normalize_prefix(key))
}

/// Map an object key to a path below `root`, preserving its folder structure.
///
/// Empty segments are skipped; `.` and `..` are rejected so the result can
/// never escape `root`.
pub fn local_path(root: &Path, key: &str) -> StorageResult<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in key.split('/').filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => path.push(segment),
            _ => {
                return Err(StorageError::InvalidRequest(format!(
                    "key `{}` cannot be mapped to a local path",
                    key
                )));
            }
        }
    }
    if path == root {
        return Err(StorageError::InvalidRequest(format!(
            "key `{}` cannot be mapped to a local path",
            key
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_gets_folder_slash() {
        assert_eq!(normalize_prefix("abc"), "abc/");
        assert_eq!(normalize_prefix("abc/"), "abc/");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn upload_keys() {
        assert_eq!(upload_key(Some("reports/"), "x.txt"), "reports/x.txt");
        assert_eq!(upload_key(Some("reports"), "x.txt"), "reports/x.txt");
        assert_eq!(upload_key(None, "x.txt"), "x.txt");
        assert_eq!(upload_key(Some(""), "x.txt"), "x.txt");
        assert_eq!(upload_key(Some("/reports/2025/"), "x.txt"), "reports/2025/x.txt");
        assert_eq!(upload_key(None, "/x.txt"), "x.txt");
    }

    #[test]
    fn folder_keys() {
        assert_eq!(folder_key("a/b").unwrap(), "a/b/");
        assert_eq!(folder_key("/a/b/").unwrap(), "a/b/");
        assert!(matches!(
            folder_key("/"),
            Err(StorageError::InvalidRequest(_))
        ));
    }

    #[test]
    fn local_paths_keep_nesting() {
        let root = Path::new("/srv/downloads");
        assert_eq!(
            local_path(root, "a/b/c.txt").unwrap(),
            Path::new("/srv/downloads/a/b/c.txt")
        );
        assert_eq!(
            local_path(root, "/a//b/").unwrap(),
            Path::new("/srv/downloads/a/b")
        );
    }

    #[test]
    fn local_paths_cannot_escape_root() {
        let root = Path::new("/srv/downloads");
        assert!(local_path(root, "../etc/passwd").is_err());
        assert!(local_path(root, "a/./b").is_err());
        assert!(local_path(root, "/").is_err());
    }
}
