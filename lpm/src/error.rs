//! Error type for the route-table tool.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by loading, persisting and querying route tables.
#[derive(Debug, Error)]
pub enum Error {
    /// A mapping line could not be parsed. Loading skips such lines.
    #[error("mapping line {line}: {reason}")]
    MalformedMappingLine {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The mapping file is missing or unreadable.
    #[error("cannot read mapping file {}: {source}", path.display())]
    SourceFileUnreadable {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Neither address family holds a route.
    #[error("the mapping holds no routes")]
    EmptyTable,

    /// Trie-level failure (encoding, persisted file corruption).
    #[error(transparent)]
    Trie(#[from] lpm_trie::Error),

    /// Reading queries or writing answers failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::EmptyTable => crate::EXIT_MAPPING_EMPTY,
            _ => crate::EXIT_FAILURE,
        }
    }
}
