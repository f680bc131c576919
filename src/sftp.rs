//! [`Lister`] over an SFTP session.
//!
//! `read_dir` already keeps issuing `READDIR` until the server answers with EOF, so
//! each listing arrives complete. Symlinks are reported as files and never followed.

use russh_sftp::{
    client::{error::Error as SftpError, SftpSession},
    protocol::StatusCode,
};

use crate::{
    entry::PathEntry,
    error::ListError,
    lister::{ListResult, Lister},
    utils,
};

impl From<SftpError> for ListError {
    fn from(error: SftpError) -> Self {
        match error {
            SftpError::Status(status) => match status.status_code {
                StatusCode::NoSuchFile => Self::NotFound,
                StatusCode::PermissionDenied => Self::PermissionDenied,
                _ => Self::UnexpectedBehavior(format!(
                    "{}: {}",
                    status.status_code, status.error_message
                )),
            },
            SftpError::Timeout => Self::Timeout,
            SftpError::IO(msg) => Self::IO(msg),
            other => Self::UnexpectedBehavior(other.to_string()),
        }
    }
}

#[async_trait]
impl Lister for SftpSession {
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        let dir = self.read_dir(path).await?;

        let entries = dir
            .map(|entry| {
                let path = utils::join(path, &entry.file_name());
                let metadata = entry.metadata();
                let modified = metadata.mtime.and_then(utils::from_unix);

                if metadata.is_dir() {
                    PathEntry::dir(path).with_modified(modified)
                } else {
                    PathEntry::file(path, metadata.len()).with_modified(modified)
                }
            })
            .collect::<Vec<_>>();

        debug!("sftp listed {} entries of {}", entries.len(), path);

        Ok(entries)
    }
}
