//! Metric name analysis.
//!
//! A metric name such as `servers.ams4.web01.cpu.user` is split on its
//! separator byte and every segment is hashed to a [`TermId`]. The resulting
//! term sequence is what the postings engine indexes and queries.
//!
//! [`TermId`]: metrisearch_types::TermId

pub mod tokenizer;

pub use tokenizer::{MetricTokenizer, Tokenize};
