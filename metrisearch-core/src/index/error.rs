//! Index error types.

use metrisearch_types::{DocId, TokenizeError};
use thiserror::Error;

use crate::postings::PostingsError;

/// Errors returned by index backends.
///
/// Every variant names the backend that raised it, as returned by
/// [`Index::name`](crate::index::Index::name).
#[derive(Error, Debug)]
pub enum IndexError {
    /// A metric name could not be tokenized; the rebuild was aborted.
    #[error("{index}: cannot tokenize {name:?}: {source}")]
    Tokenize {
        /// Backend name.
        index: String,
        /// The offending raw metric name.
        name: String,
        /// Why tokenization failed.
        #[source]
        source: TokenizeError,
    },

    /// The postings engine returned a document the published generation has
    /// no metric for.
    #[error("{index} query: document {doc} is missing from the document-to-metric map")]
    UnmappedDocument {
        /// Backend name.
        index: String,
        /// The unmappable document.
        doc: DocId,
    },

    /// The postings engine failed to build or decode.
    #[error("{index}: postings error: {source}")]
    Postings {
        /// Backend name.
        index: String,
        /// Underlying engine error.
        #[source]
        source: PostingsError,
    },

    /// A raw metric name is too long to keep in the generation's name store.
    #[error("{index}: metric name of {len} bytes exceeds the name store limit")]
    NameTooLong {
        /// Backend name.
        index: String,
        /// Length of the rejected name in bytes.
        len: usize,
    },

    /// Any other backend-specific failure.
    #[error("{index}: {source}")]
    Backend {
        /// Backend name.
        index: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl IndexError {
    /// Name of the backend that raised the error.
    pub fn index(&self) -> &str {
        match self {
            IndexError::Tokenize { index, .. }
            | IndexError::UnmappedDocument { index, .. }
            | IndexError::Postings { index, .. }
            | IndexError::NameTooLong { index, .. }
            | IndexError::Backend { index, .. } => index,
        }
    }
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
