use chrono::{DateTime, Utc};

#[cfg_attr(not(feature = "sftp"), allow(dead_code))]
pub fn from_unix(secs: u32) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(i64::from(secs), 0)
}

/// Strips trailing separators, keeping a bare `/` intact.
pub fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

#[cfg_attr(not(feature = "sftp"), allow(dead_code))]
pub fn join(parent: &str, name: &str) -> String {
    let parent = normalize(parent);
    if parent.is_empty() {
        name.to_owned()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns `true` if `path` lies strictly below `parent`.
pub fn is_descendant(parent: &str, path: &str) -> bool {
    let parent = normalize(parent);
    let path = normalize(path);

    if path == parent {
        return false;
    }

    if parent == "/" {
        return path.starts_with('/') && path.len() > 1;
    }

    path.strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Returns `true` if `path` is an immediate child of `parent`.
pub fn is_child(parent: &str, path: &str) -> bool {
    if !is_descendant(parent, path) {
        return false;
    }

    let parent = normalize(parent);
    let rest = &normalize(path)[parent.len()..];
    !rest.trim_start_matches('/').contains('/')
}
