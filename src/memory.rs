use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::time;

use crate::{
    entry::PathEntry,
    error::ListError,
    lister::{list_all_pages, ListResult, Lister, Page, PagedLister},
    utils,
};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File {
        size: u64,
        modified: Option<DateTime<Utc>>,
    },
}

/// In-memory store tree.
///
/// Parents are created implicitly. Listing a directory returns its direct children in
/// path order, listing a file returns the file itself and listing anything else fails
/// with [`ListError::NotFound`].
#[derive(Debug)]
pub struct MemoryLister {
    nodes: BTreeMap<String, Node>,
    extras: HashMap<String, Vec<PathEntry>>,
    failures: HashMap<String, ListError>,
    latency: Option<Duration>,
    page_size: Option<usize>,
    calls: AtomicUsize,
}

impl Default for MemoryLister {
    fn default() -> Self {
        Self::new()
    }
}

fn parent(path: &str) -> Option<&str> {
    let path = utils::normalize(path);
    match path.rfind('/') {
        _ if path == "/" => None,
        Some(0) => Some("/"),
        Some(index) => Some(&path[..index]),
        None => None,
    }
}

impl MemoryLister {
    /// Creates a store containing only the root directory
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        let _ = nodes.insert("/".to_owned(), Node::Dir);

        Self {
            nodes,
            extras: HashMap::new(),
            failures: HashMap::new(),
            latency: None,
            page_size: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn insert(&mut self, path: &str, node: Node) {
        let mut current = parent(path);
        while let Some(dir) = current {
            let _ = self.nodes.entry(dir.to_owned()).or_insert(Node::Dir);
            current = parent(dir);
        }

        let _ = self.nodes.insert(utils::normalize(path).to_owned(), node);
    }

    /// Adds a file of `size` bytes
    #[must_use]
    pub fn with_file<P: AsRef<str>>(mut self, path: P, size: u64) -> Self {
        self.insert(
            path.as_ref(),
            Node::File {
                size,
                modified: None,
            },
        );
        self
    }

    /// Adds a file with a modification time
    #[must_use]
    pub fn with_file_modified<P: AsRef<str>>(
        mut self,
        path: P,
        size: u64,
        modified: DateTime<Utc>,
    ) -> Self {
        self.insert(
            path.as_ref(),
            Node::File {
                size,
                modified: Some(modified),
            },
        );
        self
    }

    /// Adds an empty directory
    #[must_use]
    pub fn with_dir<P: AsRef<str>>(mut self, path: P) -> Self {
        self.insert(path.as_ref(), Node::Dir);
        self
    }

    /// Appends a raw entry to every listing of `path`, as a misbehaving store would.
    #[must_use]
    pub fn with_extra_entry<P: AsRef<str>>(mut self, path: P, entry: PathEntry) -> Self {
        self.extras
            .entry(utils::normalize(path.as_ref()).to_owned())
            .or_default()
            .push(entry);
        self
    }

    /// Makes every listing of `path` fail with `error`
    #[must_use]
    pub fn fail_at<P: AsRef<str>>(mut self, path: P, error: ListError) -> Self {
        let _ = self
            .failures
            .insert(utils::normalize(path.as_ref()).to_owned(), error);
        self
    }

    /// Delays every page by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Splits listings into pages of at most `size` entries
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Number of pages served so far
    pub fn list_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn entries(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        let path = utils::normalize(path);

        if let Some(error) = self.failures.get(path) {
            return Err(error.clone());
        }

        match self.nodes.get(path) {
            None => Err(ListError::NotFound),
            Some(Node::File { size, modified }) => {
                Ok(vec![PathEntry::file(path, *size).with_modified(*modified)])
            }
            Some(Node::Dir) => {
                let mut entries: Vec<PathEntry> = self
                    .nodes
                    .iter()
                    .filter(|(child, _)| utils::is_child(path, child))
                    .map(|(child, node)| match node {
                        Node::Dir => PathEntry::dir(child.as_str()),
                        Node::File { size, modified } => {
                            PathEntry::file(child.as_str(), *size).with_modified(*modified)
                        }
                    })
                    .collect();

                if let Some(extras) = self.extras.get(path) {
                    entries.extend(extras.iter().cloned());
                }

                Ok(entries)
            }
        }
    }
}

#[async_trait]
impl PagedLister for MemoryLister {
    async fn list_page(&self, path: &str, cursor: Option<&str>) -> ListResult<Page> {
        if let Some(latency) = self.latency {
            time::sleep(latency).await;
        }

        let _ = self.calls.fetch_add(1, Ordering::SeqCst);

        let offset = match cursor {
            None => 0,
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| ListError::UnexpectedBehavior(format!("bad cursor {cursor}")))?,
        };

        let mut entries = self.entries(path)?;
        let total = entries.len();
        let end = self
            .page_size
            .map_or(total, |size| offset.saturating_add(size).min(total));

        let entries: Vec<PathEntry> = entries.drain(offset.min(total)..end).collect();

        Ok(Page {
            entries,
            next: (end < total).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl Lister for MemoryLister {
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        list_all_pages(self, path).await
    }
}
