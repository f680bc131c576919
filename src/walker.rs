//! Recursive enumeration of a remote tree.
//!
//! The walker lists the root, keeps every file it is given and, when recursion is
//! enabled, expands directories level by level. Sibling directories of one level are
//! listed concurrently up to [`WalkOptions::concurrency`]. The walk is all-or-nothing:
//! the first failure, cancellation or guard violation discards everything collected.

use std::{collections::HashSet, time::Duration};

use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    entry::PathEntry,
    error::{Error, TraversalViolation},
    lister::Lister,
    utils,
};

pub type WalkResult<T> = Result<T, Error>;

/// Root and recursion flag of one enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationRequest {
    pub path: String,
    pub recursive: bool,
}

impl EnumerationRequest {
    pub fn new<P: Into<String>>(path: P, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}

/// Walk tuning.
/// Default: depth limit 256, 8 concurrent listings, no deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    pub max_depth: usize,
    pub concurrency: usize,
    pub deadline: Option<Duration>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            concurrency: 8,
            deadline: None,
        }
    }
}

impl WalkOptions {
    /// Maximum number of directory levels below the root
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Maximum number of listings in flight. Zero is treated as one
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Time limit for the whole walk
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Enumerates files of a remote store through a [`Lister`]
pub struct Walker<L> {
    lister: L,
    options: WalkOptions,
}

impl<L: Lister> Walker<L> {
    pub fn new(lister: L) -> Self {
        Self::with_options(lister, WalkOptions::default())
    }

    pub fn with_options(lister: L, options: WalkOptions) -> Self {
        Self { lister, options }
    }

    #[must_use]
    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    #[must_use]
    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// Returns every file below `root`, expanding subdirectories if `recursive`.
    pub async fn enumerate(&self, root: &str, recursive: bool) -> WalkResult<Vec<PathEntry>> {
        self.enumerate_until(
            &EnumerationRequest::new(root, recursive),
            &CancellationToken::new(),
        )
        .await
    }

    /// Same as [`Walker::enumerate`] but gives up with [`Error::Cancelled`] as soon as
    /// `cancel` fires or the configured deadline passes. In-flight listings are dropped.
    pub async fn enumerate_until(
        &self,
        request: &EnumerationRequest,
        cancel: &CancellationToken,
    ) -> WalkResult<Vec<PathEntry>> {
        if request.path.is_empty() {
            return Err(Error::InvalidRequest("root path is empty".to_owned()));
        }

        let walk = async {
            match self.options.deadline {
                Some(deadline) => time::timeout(deadline, self.walk(request))
                    .await
                    .map_err(|_| Error::Cancelled)?,
                None => self.walk(request).await,
            }
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = walk => result,
        };

        match &result {
            Ok(files) => info!("{}: found {} files", request.path, files.len()),
            Err(err) => warn!("walk of {} aborted: {}", request.path, err),
        }

        result
    }

    async fn walk(&self, request: &EnumerationRequest) -> WalkResult<Vec<PathEntry>> {
        let mut files = vec![];
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![request.path.clone()];
        let mut depth = 0;

        let _ = visited.insert(utils::normalize(&request.path).to_owned());

        while !frontier.is_empty() {
            if depth > self.options.max_depth {
                return Err(Error::Traversal {
                    path: frontier.swap_remove(0),
                    violation: TraversalViolation::DepthExceeded(self.options.max_depth),
                });
            }

            let listings: Vec<(String, Vec<PathEntry>)> = stream::iter(frontier)
                .map(|dir| async move {
                    debug!("listing {} at depth {}", dir, depth);
                    match self.lister.list(&dir).await {
                        Ok(entries) => Ok((dir, entries)),
                        Err(err) => Err(err.at(dir)),
                    }
                })
                .buffer_unordered(self.options.concurrency.max(1))
                .try_collect()
                .await?;

            frontier = vec![];

            for (dir, entries) in listings {
                for entry in entries {
                    if !entry.is_dir() {
                        files.push(entry);
                        continue;
                    }

                    if !request.recursive {
                        trace!("skipping directory {}", entry.path());
                        continue;
                    }

                    if !utils::is_descendant(&dir, entry.path()) {
                        return Err(Error::Traversal {
                            path: entry.path().to_owned(),
                            violation: TraversalViolation::NotDescendant { parent: dir },
                        });
                    }

                    if !visited.insert(utils::normalize(entry.path()).to_owned()) {
                        return Err(Error::Traversal {
                            path: entry.path().to_owned(),
                            violation: TraversalViolation::Revisited,
                        });
                    }

                    frontier.push(entry.path().to_owned());
                }
            }

            depth += 1;
        }

        Ok(files)
    }
}

#[cfg(test)]
mod test_walker {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{error::ListError, memory::MemoryLister, record::project};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn store() -> MemoryLister {
        MemoryLister::new()
            .with_file("/a", 10)
            .with_file("/b/c", 5)
            .with_file("/b/d/e", 1)
    }

    fn paths(entries: &[PathEntry]) -> Vec<&str> {
        let mut paths: Vec<&str> = entries.iter().map(PathEntry::path).collect();
        paths.sort_unstable();
        paths
    }

    #[tokio::test]
    async fn test_non_recursive_skips_directories() {
        init();
        let walker = Walker::new(store());

        let files = walker.enumerate("/", false).await.unwrap();

        assert_eq!(files, vec![PathEntry::file("/a", 10)]);
        assert_eq!(walker.lister().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_recursive_finds_every_file() {
        init();
        let walker = Walker::new(store());

        let files = walker.enumerate("/", true).await.unwrap();

        assert_eq!(paths(&files), ["/a", "/b/c", "/b/d/e"]);
        assert!(files.iter().all(|f| !f.is_dir()));
        assert_eq!(walker.lister().list_calls(), 3);
    }

    #[tokio::test]
    async fn test_subtree_root() {
        let walker = Walker::new(store());
        let files = walker.enumerate("/b/", true).await.unwrap();
        assert_eq!(paths(&files), ["/b/c", "/b/d/e"]);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let walker = Walker::new(store());
        let result = walker.enumerate("/missing", true).await;
        assert_eq!(
            result,
            Err(Error::NotFound {
                path: "/missing".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_root_is_rejected() {
        let walker = Walker::new(store());
        let result = walker.enumerate("", true).await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(walker.lister().list_calls(), 0);
    }

    #[tokio::test]
    async fn test_nested_failure_aborts_walk() {
        let walker = Walker::new(store().fail_at("/b/d", ListError::PermissionDenied));

        let result = walker.enumerate("/", true).await;

        assert_eq!(
            result,
            Err(Error::Transport {
                path: "/b/d".to_owned(),
                source: ListError::PermissionDenied,
            })
        );
    }

    #[tokio::test]
    async fn test_failure_below_is_ignored_without_recursion() {
        let walker = Walker::new(store().fail_at("/b", ListError::RateLimited));
        let files = walker.enumerate("/", false).await.unwrap();
        assert_eq!(paths(&files), ["/a"]);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let walker = Walker::with_options(store(), WalkOptions::default().max_depth(1));

        let result = walker.enumerate("/", true).await;

        assert_eq!(
            result,
            Err(Error::Traversal {
                path: "/b/d".to_owned(),
                violation: TraversalViolation::DepthExceeded(1),
            })
        );
    }

    #[tokio::test]
    async fn test_depth_limit_reached_exactly() {
        let walker = Walker::with_options(store(), WalkOptions::default().max_depth(2));
        let files = walker.enumerate("/", true).await.unwrap();
        assert_eq!(files.len(), 3);
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let lister = store().with_extra_entry("/b/d", PathEntry::dir("/b/d/"));
        let walker = Walker::new(lister);

        let result = walker.enumerate("/", true).await;

        assert!(matches!(
            result,
            Err(Error::Traversal {
                violation: TraversalViolation::NotDescendant { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_directory_is_detected() {
        let lister = store().with_extra_entry("/b", PathEntry::dir("/b/d"));
        let walker = Walker::new(lister);

        let result = walker.enumerate("/", true).await;

        assert_eq!(
            result,
            Err(Error::Traversal {
                path: "/b/d".to_owned(),
                violation: TraversalViolation::Revisited,
            })
        );
    }

    #[tokio::test]
    async fn test_cancellation() {
        let walker = Walker::new(store().with_latency(Duration::from_secs(30)));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let _ = tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = walker
            .enumerate_until(&EnumerationRequest::new("/", true), &cancel)
            .await;

        assert_eq!(result, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_deadline() {
        let options = WalkOptions::default().deadline(Duration::from_millis(20));
        let walker = Walker::with_options(store().with_latency(Duration::from_secs(30)), options);

        assert_eq!(walker.enumerate("/", true).await, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_sequential_and_concurrent_agree() {
        let lister = Arc::new(
            (0..20).fold(MemoryLister::new(), |store, i| {
                store
                    .with_file(format!("/d{i}/f"), i)
                    .with_file(format!("/d{i}/sub/g"), i * 2)
            }),
        );

        let sequential =
            Walker::with_options(lister.clone(), WalkOptions::default().concurrency(1));
        let concurrent = Walker::with_options(lister, WalkOptions::default().concurrency(16));

        let sequential = project(sequential.enumerate("/", true).await.unwrap());
        let concurrent = project(concurrent.enumerate("/", true).await.unwrap());

        assert_eq!(sequential.len(), 40);
        assert_eq!(sequential, concurrent);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: WalkOptions = serde_json::from_str(r#"{ "concurrency": 2 }"#).unwrap();
        assert_eq!(options, WalkOptions::default().concurrency(2));
    }
}
