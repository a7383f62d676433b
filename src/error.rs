//! Errors raised by the key codec and the persistence layer.

use std::io;

use thiserror::Error;

/// Result type for trie operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for trie operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An address or prefix could not be turned into a fixed-length bit string.
    #[error("cannot encode {input:?}: {reason}")]
    InvalidKeyEncoding {
        /// The offending text.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A persisted trie is structurally invalid.
    #[error("persisted trie is corrupt at byte {offset}: {reason}")]
    PersistedFileCorrupt {
        /// Byte offset where parsing gave up.
        offset: usize,
        /// What was wrong at that offset.
        reason: &'static str,
    },

    /// The header's node count disagrees with the records in the body.
    #[error("persisted trie declares {declared} nodes but holds {actual}")]
    NodeCountMismatch {
        /// Count from the `_N_` header.
        declared: usize,
        /// Records actually present.
        actual: usize,
    },

    /// Reading or writing a persisted trie failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True when a persisted file should be thrown away and regenerated.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Error::PersistedFileCorrupt { .. } | Error::NodeCountMismatch { .. }
        )
    }

    pub(crate) fn invalid_key(input: &str, reason: &'static str) -> Self {
        Error::InvalidKeyEncoding {
            input: input.to_owned(),
            reason,
        }
    }
}
