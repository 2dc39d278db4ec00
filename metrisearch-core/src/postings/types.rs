//! Postings types and constants.

use metrisearch_types::{DocId, TermId};

/// Below this many (term, document) pairs a comparison sort beats radix.
pub const RADIX_SORT_THRESHOLD: usize = 512;

/// One (term, document) pair recorded by the write structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TermEntry {
    pub term: TermId,
    pub doc_id: DocId,
}

/// Location of one term's encoded posting list in the compiled data buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TermBlock {
    pub term: TermId,
    /// Byte offset into `CompiledPostings::data`.
    pub offset: u32,
    /// Encoded length in bytes.
    pub bytes: u32,
    /// Number of documents in the list.
    pub docs: u32,
}

/// Append-only write structure.
///
/// Documents receive dense ids from zero in insertion order. Nothing is
/// queryable until the writer is compiled into a [`CompiledPostings`].
#[derive(Debug, Default)]
pub struct PostingsWriter {
    pub(crate) entries: Vec<TermEntry>,
    pub(crate) next_doc: DocId,
}

/// Immutable, query-optimized postings.
///
/// Blocks are sorted by term; each block's list is strictly ascending and
/// stored delta + varint encoded in one shared buffer.
#[derive(Debug, Default, Clone)]
pub struct CompiledPostings {
    pub(crate) blocks: Vec<TermBlock>,
    pub(crate) data: Vec<u8>,
    pub(crate) num_documents: usize,
    pub(crate) total_postings: usize,
}

impl CompiledPostings {
    /// An index with no documents; every query is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of documents the writer held when compiled.
    #[inline(always)]
    #[must_use]
    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    /// Number of distinct terms.
    #[inline(always)]
    #[must_use]
    pub fn num_terms(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no documents were compiled.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_documents == 0
    }
}
