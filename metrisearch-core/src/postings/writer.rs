//! Document insertion into the write structure.

use metrisearch_types::{DocId, TermId};

use crate::postings::types::{PostingsWriter, TermEntry};
use crate::postings::PostingsError;

impl PostingsWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `pairs` (term, document) pairs.
    pub fn with_capacity(pairs: usize) -> Self {
        Self {
            entries: Vec::with_capacity(pairs),
            next_doc: 0,
        }
    }

    /// Adds a tokenized document and returns its id.
    ///
    /// Repeated terms within one document are recorded once at compile time.
    ///
    /// # Errors
    ///
    /// Returns `PostingsError::TooManyDocuments` once the `u32` id space is
    /// exhausted.
    #[inline]
    pub fn add_document(&mut self, terms: &[TermId]) -> Result<DocId, PostingsError> {
        let doc_id = self.next_doc;
        let next = doc_id
            .checked_add(1)
            .ok_or(PostingsError::TooManyDocuments)?;

        self.entries
            .extend(terms.iter().map(|&term| TermEntry { term, doc_id }));
        self.next_doc = next;
        Ok(doc_id)
    }

    /// Number of documents added since the last clear.
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_doc as usize
    }

    /// Returns `true` if no documents were added since the last clear.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_doc == 0
    }

    /// Number of recorded (term, document) pairs.
    #[inline(always)]
    #[must_use]
    pub fn pending_pairs(&self) -> usize {
        self.entries.len()
    }

    /// Empties the writer, keeping its allocation for the next rebuild.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_doc = 0;
    }
}
