use thiserror::Error;

/// Errors reported by a [`Lister`](crate::lister::Lister) for a single listing call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// The listed path does not exist
    #[error("No such file or directory")]
    NotFound,
    /// Credentials were rejected or the path is not readable
    #[error("Permission denied")]
    PermissionDenied,
    /// The store refused the request because of request rate
    #[error("Rate limited")]
    RateLimited,
    /// Time limit for receiving the listing exceeded
    #[error("Timeout")]
    Timeout,
    /// Any errors related to I/O
    #[error("I/O: {0}")]
    IO(String),
    /// Occurs when the store behaves in a way the listing contract does not allow
    #[error("{0}")]
    UnexpectedBehavior(String),
}

impl ListError {
    /// Attaches the path whose listing failed.
    #[must_use]
    pub fn at<P: Into<String>>(self, path: P) -> Error {
        let path = path.into();
        match self {
            Self::NotFound => Error::NotFound { path },
            source => Error::Transport { path, source },
        }
    }
}

impl From<std::io::Error> for ListError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::IO(error.to_string()),
        }
    }
}

/// Backend contract violations caught while expanding directories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalViolation {
    #[error("maximum depth of {0} exceeded")]
    DepthExceeded(usize),
    #[error("directory reported more than once")]
    Revisited,
    #[error("directory is not below {parent}")]
    NotDescendant { parent: String },
}

/// Enum for enumeration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The root or an intermediate directory does not exist
    #[error("{path}: No such file or directory")]
    NotFound { path: String },
    /// Network, authentication or backend failure while listing `path`
    #[error("{path}: {source}")]
    Transport { path: String, source: ListError },
    /// A traversal guard tripped at `path`
    #[error("{path}: {violation}")]
    Traversal {
        path: String,
        violation: TraversalViolation,
    },
    /// The walk was cancelled or ran past its deadline
    #[error("Cancelled")]
    Cancelled,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns the path at which the walk failed, if the error is tied to one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path }
            | Self::Transport { path, .. }
            | Self::Traversal { path, .. } => Some(path),
            Self::Cancelled | Self::InvalidRequest(_) => None,
        }
    }
}
