//! One immutable, published version of the text index.

use metrisearch_types::{DocId, Metric};
use rustc_hash::FxHashMap;

use crate::arena::NameArena;
use crate::postings::{CompiledPostings, PostingsStats};

/// Compiled postings plus both identifier mappings, built together by one
/// rebuild and published as a single unit.
///
/// Documents are dense, so the document-to-metric map is a vector indexed by
/// [`DocId`]; raw names live in a [`NameArena`] whose slots are the same
/// document ids.
#[derive(Debug, Default)]
pub struct Generation {
    pub(crate) number: u64,
    pub(crate) postings: CompiledPostings,
    pub(crate) doc_metrics: Vec<Metric>,
    pub(crate) metric_docs: FxHashMap<Metric, DocId>,
    pub(crate) names: NameArena,
}

impl Generation {
    /// The empty generation a new index starts with.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sequence number: 0 for the initial empty generation, then one more
    /// per successful rebuild.
    #[inline(always)]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Number of indexed documents.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.doc_metrics.len()
    }

    /// Returns `true` if nothing is indexed.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.doc_metrics.is_empty()
    }

    /// The compiled read structure.
    #[inline(always)]
    pub fn postings(&self) -> &CompiledPostings {
        &self.postings
    }

    /// Metric assigned to `doc`, if any.
    #[inline(always)]
    pub fn metric_for(&self, doc: DocId) -> Option<Metric> {
        self.doc_metrics.get(doc as usize).copied()
    }

    /// Raw name of `metric`. When a name was indexed more than once the last
    /// occurrence wins.
    pub fn metric_name(&self, metric: Metric) -> Option<&str> {
        let doc = *self.metric_docs.get(&metric)?;
        self.names.get(doc)
    }

    /// Number of distinct metrics.
    pub fn num_metrics(&self) -> usize {
        self.metric_docs.len()
    }

    /// Iterates `(metric, raw name)` pairs of distinct metrics in no
    /// particular order.
    pub fn metric_names(&self) -> impl Iterator<Item = (Metric, &str)> + '_ {
        self.metric_docs
            .iter()
            .filter_map(|(&metric, &doc)| Some((metric, self.names.get(doc)?)))
    }

    /// Statistics of the compiled postings.
    pub fn stats(&self) -> PostingsStats {
        self.postings.stats()
    }

    /// Maps documents to metrics, preserving order.
    ///
    /// Fails with the first document that has no metric.
    pub(crate) fn docs_to_metrics(&self, docs: &[DocId]) -> Result<Vec<Metric>, DocId> {
        let mut metrics = Vec::with_capacity(docs.len());
        for &doc in docs {
            metrics.push(self.metric_for(doc).ok_or(doc)?);
        }
        Ok(metrics)
    }
}
