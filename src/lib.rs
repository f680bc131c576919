//! Read-only enumeration of remote hierarchical file stores.
//!
//! A [`Walker`] lists a root path through any [`Lister`], optionally expands every
//! subdirectory, and hands back the files it found. [`project`] turns those into a
//! duplicate-free [`PathSet`] of `(path, file_size)` records.

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod entry;
mod error;
/// Listing capability
pub mod lister;
/// In-memory store
pub mod memory;
pub mod record;
/// `file_paths` data source
pub mod source;
#[cfg(feature = "sftp")]
pub mod sftp;
mod utils;
pub mod walker;

pub use entry::PathEntry;
pub use error::{Error, ListError, TraversalViolation};
pub use lister::{Lister, Page, Paged, PagedLister};
pub use memory::MemoryLister;
pub use record::{project, Fingerprint, PathRecord, PathSet};
pub use source::{read_file_paths, FilePaths};
pub use walker::{EnumerationRequest, WalkOptions, Walker};

pub use tokio_util::sync::CancellationToken;
