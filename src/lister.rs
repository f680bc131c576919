//! Listing capability used by the walker.
//!
//! A store only needs to answer one question: what are the direct children of a path.
//! Stores that answer it in pages implement [`PagedLister`] and are wrapped in [`Paged`].

use std::collections::HashSet;

use crate::{entry::PathEntry, error::ListError};

pub type ListResult<T> = Result<T, ListError>;

/// Lists the direct children of a remote path. This is `async_trait`
#[async_trait]
pub trait Lister: Send + Sync {
    /// Returns every direct child of `path`, each tagged as file or directory.
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>>;
}

#[async_trait]
impl<L: Lister + ?Sized> Lister for &L {
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        (**self).list(path).await
    }
}

#[async_trait]
impl<L: Lister + ?Sized> Lister for std::sync::Arc<L> {
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        (**self).list(path).await
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entries: Vec<PathEntry>,
    /// Cursor of the following page, `None` once the listing is complete
    pub next: Option<String>,
}

/// A store whose listing arrives in pages
#[async_trait]
pub trait PagedLister: Send + Sync {
    async fn list_page(&self, path: &str, cursor: Option<&str>) -> ListResult<Page>;
}

/// Drains every page of the listing of `path`.
pub async fn list_all_pages<P>(lister: &P, path: &str) -> ListResult<Vec<PathEntry>>
where
    P: PagedLister + ?Sized,
{
    let mut entries = vec![];
    let mut cursor: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let page = lister.list_page(path, cursor.as_deref()).await?;
        entries.extend(page.entries);

        match page.next {
            None => break,
            Some(next) if !seen.insert(next.clone()) => {
                return Err(ListError::UnexpectedBehavior(format!(
                    "listing of {path} repeated cursor {next}"
                )));
            }
            Some(next) => cursor = Some(next),
        }
    }

    trace!("listed {} entries of {}", entries.len(), path);

    Ok(entries)
}

/// Turns a [`PagedLister`] into a [`Lister`]
#[derive(Debug, Clone)]
pub struct Paged<P>(pub P);

#[async_trait]
impl<P: PagedLister> Lister for Paged<P> {
    async fn list(&self, path: &str) -> ListResult<Vec<PathEntry>> {
        list_all_pages(&self.0, path).await
    }
}
