//! Indexing core of the metrisearch service.
//!
//! - [`algebra`]: k-way union and intersection over sorted identifier sets.
//! - [`analyzer`]: splits raw metric names into term identifiers.
//! - [`postings`]: append-only write structure, compiled read structure and
//!   multi-term AND queries.
//! - [`index`]: the [`Index`] contract and the versioned [`TextIndex`], whose
//!   rebuilds publish a whole new [`Generation`] without blocking queries.

pub mod algebra;
pub mod analyzer;
pub mod arena;
pub mod index;
pub mod postings;

pub use algebra::{intersect, union};
pub use analyzer::{MetricTokenizer, Tokenize};
pub use index::{Generation, Index, IndexCounters, IndexError, TextIndex};
pub use postings::{CompiledPostings, PostingsStats, PostingsWriter};

pub use metrisearch_types::{
    hash_metric, hash_metrics, hash_tag, hash_tags, DocId, IndexConfig, Metric, Tag, TermId,
    TokenizeError, TokenizeFailurePolicy, TokenizerConfig,
};
