//! Index backends.
//!
//! Every backend answers "which metrics match this query" through the
//! [`Index`] trait, so a planner can fan one query out over several backends
//! and combine the answers with [`union`](crate::algebra::union) and
//! [`intersect`](crate::algebra::intersect).
//!
//! The [`TextIndex`] is the backend over tokenized metric names. It is rebuilt
//! from a full snapshot and publishes each rebuild as one immutable
//! [`Generation`]:
//!
//! ```text
//!   materialize(names)                 query(tokens)
//!         |                                 |
//!   [ PostingsWriter ] --compile-->   load current ----> Arc<Generation>
//!   (mutex, one rebuild)              (lock-free)        postings + doc->metric
//!         |                                               + metric->name
//!         +------------- store new Arc<Generation> ------------^
//! ```

mod error;
mod generation;
mod text;

pub use error::{IndexError, IndexResult};
pub use generation::Generation;
pub use text::{IndexCounters, TextIndex, TEXT_INDEX_NAME};

use std::sync::Arc;

use metrisearch_types::{Metric, Tag};

/// A queryable index backend.
///
/// `Q` is the backend's query vocabulary. Tag backends use the default
/// [`Tag`]; the [`TextIndex`] is queried with term ids.
pub trait Index<Q = Tag>: Send + Sync {
    /// Returns the metrics matching every element of `query`.
    ///
    /// Result order is backend-specific; sort before combining.
    fn query(&self, query: &[Q]) -> Result<Vec<Metric>, IndexError>;

    /// Stable, human-readable backend name for diagnostics.
    fn name(&self) -> &str;
}

impl<Q, I: Index<Q> + ?Sized> Index<Q> for Arc<I> {
    fn query(&self, query: &[Q]) -> Result<Vec<Metric>, IndexError> {
        (**self).query(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<Q, I: Index<Q> + ?Sized> Index<Q> for Box<I> {
    fn query(&self, query: &[Q]) -> Result<Vec<Metric>, IndexError> {
        (**self).query(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
