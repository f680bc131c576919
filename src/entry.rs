use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object returned by a single listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    path: String,
    is_dir: bool,
    file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<DateTime<Utc>>,
}

impl PathEntry {
    pub fn file<P: Into<String>>(path: P, file_size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            file_size,
            modified: None,
        }
    }

    pub fn dir<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            file_size: 0,
            modified: None,
        }
    }

    /// Sets the modification time reported by the store
    #[must_use]
    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    /// Returns the absolute path of the entry within the store.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Returns the size of the file, always `0` for directories
    #[must_use]
    pub fn file_size(&self) -> u64 {
        if self.is_dir {
            0
        } else {
            self.file_size
        }
    }

    /// Returns the last modification time, if the store reported one
    #[must_use]
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub(crate) fn into_parts(self) -> (String, u64) {
        let size = self.file_size();
        (self.path, size)
    }
}
