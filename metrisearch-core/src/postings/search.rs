//! Multi-term AND queries over compiled postings.

use metrisearch_types::{DocId, TermId};
use smallvec::SmallVec;

use crate::postings::codec::decode_list;
use crate::postings::types::{CompiledPostings, TermBlock};
use crate::postings::PostingsError;

/// Queries with more terms than this spill the block list to the heap.
const INLINE_QUERY_TERMS: usize = 16;

impl CompiledPostings {
    /// Returns the documents containing every one of `terms`, ascending.
    ///
    /// An empty term list, or any term absent from the index, yields no
    /// documents. Lists are intersected shortest first so the candidate set
    /// only shrinks.
    ///
    /// # Errors
    ///
    /// Returns a [`PostingsError`] if an encoded list fails to decode.
    pub fn query(&self, terms: &[TermId]) -> Result<Vec<DocId>, PostingsError> {
        if terms.is_empty() || self.blocks.is_empty() {
            return Ok(Vec::new());
        }

        let mut lists: SmallVec<[TermBlock; INLINE_QUERY_TERMS]> =
            SmallVec::with_capacity(terms.len());
        for &term in terms {
            match self.find_block(term) {
                Some(idx) => lists.push(self.blocks[idx]),
                None => return Ok(Vec::new()),
            }
        }

        lists.sort_unstable_by_key(|b| (b.docs, b.term));
        lists.dedup_by_key(|b| b.term);

        let seed = lists[0];
        let mut candidates = Vec::with_capacity(seed.docs as usize);
        decode_list(self.block_bytes(&seed), seed.docs as usize, &mut candidates)?;

        let mut scratch = Vec::new();
        for block in &lists[1..] {
            scratch.clear();
            decode_list(self.block_bytes(block), block.docs as usize, &mut scratch)?;
            Self::hard_intersect(&mut candidates, &scratch);

            if candidates.is_empty() {
                break;
            }
        }

        Ok(candidates)
    }

    /// Returns the decoded posting list of one term, or an empty list.
    pub fn postings(&self, term: TermId) -> Result<Vec<DocId>, PostingsError> {
        let mut out = Vec::new();
        if let Some(idx) = self.find_block(term) {
            let block = self.blocks[idx];
            decode_list(self.block_bytes(&block), block.docs as usize, &mut out)?;
        }
        Ok(out)
    }

    /// Number of documents containing `term`.
    #[inline]
    #[must_use]
    pub fn document_frequency(&self, term: TermId) -> usize {
        self.find_block(term)
            .map_or(0, |idx| self.blocks[idx].docs as usize)
    }

    /// Keeps only the candidates also present in `postings`.
    #[inline(always)]
    fn hard_intersect(candidates: &mut Vec<DocId>, postings: &[DocId]) {
        let mut write_idx = 0usize;
        let mut posting_idx = 0usize;

        for read_idx in 0..candidates.len() {
            let doc_id = candidates[read_idx];

            while posting_idx < postings.len() && postings[posting_idx] < doc_id {
                posting_idx += 1;
            }

            if posting_idx < postings.len() && postings[posting_idx] == doc_id {
                candidates[write_idx] = doc_id;
                write_idx += 1;
                posting_idx += 1;
            }
        }

        candidates.truncate(write_idx);
    }

    #[inline(always)]
    pub(crate) fn find_block(&self, term: TermId) -> Option<usize> {
        self.blocks.binary_search_by_key(&term, |b| b.term).ok()
    }
}
