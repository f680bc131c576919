//! Read handler of the `file_paths` data source.
//!
//! The hosting framework validates the `path` and `recursive` inputs, hands them over
//! as an [`EnumerationRequest`] and stores the returned [`FilePaths`] as the state of
//! the data source, with `path_list` exposed as a set of `{path, file_size}` records.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    lister::Lister,
    record::{project, PathSet},
    walker::{EnumerationRequest, WalkResult, Walker},
};

/// State of the data source after a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePaths {
    /// Identifier of the state, always the root path
    pub id: String,
    pub path: String,
    pub recursive: bool,
    pub path_list: PathSet,
}

/// Performs a fresh enumeration and builds the data source state from it.
pub async fn read_file_paths<L: Lister>(
    walker: &Walker<L>,
    request: EnumerationRequest,
    cancel: &CancellationToken,
) -> WalkResult<FilePaths> {
    let entries = walker.enumerate_until(&request, cancel).await?;
    let path_list = project(entries);

    debug!(
        "{}: {} records (recursive: {})",
        request.path,
        path_list.len(),
        request.recursive
    );

    Ok(FilePaths {
        id: request.path.clone(),
        path: request.path,
        recursive: request.recursive,
        path_list,
    })
}

#[cfg(test)]
mod test_file_paths {
    use serde_json::json;

    use super::*;
    use crate::{error::Error, memory::MemoryLister};

    fn walker() -> Walker<MemoryLister> {
        Walker::new(
            MemoryLister::new()
                .with_file("/a", 10)
                .with_file("/b/c", 5)
                .with_file("/b/d/e", 1),
        )
    }

    #[tokio::test]
    async fn test_state_from_framework_fields() {
        let request: EnumerationRequest =
            serde_json::from_value(json!({ "path": "/b", "recursive": true })).unwrap();

        let state = read_file_paths(&walker(), request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(state.id, "/b");
        assert!(state.recursive);

        let value = serde_json::to_value(&state).unwrap();
        let mut list = value["path_list"].as_array().unwrap().clone();
        list.sort_by_key(|r| r["path"].as_str().unwrap().to_owned());
        assert_eq!(
            list,
            vec![
                json!({ "path": "/b/c", "file_size": 5 }),
                json!({ "path": "/b/d/e", "file_size": 1 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_reads_agree() {
        let walker = walker();
        let request = EnumerationRequest::new("/", true);
        let cancel = CancellationToken::new();

        let first = read_file_paths(&walker, request.clone(), &cancel).await.unwrap();
        let second = read_file_paths(&walker, request, &cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(walker.lister().list_calls(), 6);
    }

    #[tokio::test]
    async fn test_failed_read_has_no_state() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = read_file_paths(&walker(), EnumerationRequest::new("/", true), &cancel).await;

        assert_eq!(result, Err(Error::Cancelled));
    }
}
