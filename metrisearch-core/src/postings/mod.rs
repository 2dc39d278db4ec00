//! Postings engine.
//!
//! The text index needs three things from its postings layer: an append-only
//! structure to add tokenized documents to, a compile step producing an
//! immutable read structure, and an AND query over that read structure.
//!
//! Memory Layout:
//! - The write side is a flat `Vec` of (term, document) pairs, sorted only at
//!   compile time (radix sort for large builds)
//! - The read side keeps one block per term, sorted by term for binary
//!   search, and all posting lists delta + varint encoded in one buffer
//!
//! Threading:
//! - [`CompiledPostings`] is immutable and freely shared across threads.
//! - [`PostingsWriter`] is single-owner; the text index guards it so only one
//!   rebuild uses it at a time.

mod builder;
mod codec;
mod search;
mod stats;
mod types;
mod writer;

pub use stats::PostingsStats;
pub use types::{CompiledPostings, PostingsWriter, RADIX_SORT_THRESHOLD};

/// Errors raised by the postings engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PostingsError {
    /// An encoded list ended in the middle of a varint.
    #[error("posting list truncated inside a varint")]
    Truncated,
    /// A varint or a document id does not fit in 32 bits.
    #[error("posting list value overflows u32")]
    VarintOverflow,
    /// An encoded list decoded to a different length than recorded.
    #[error("posting list decoded to {actual} documents, expected {expected}")]
    CountMismatch {
        /// Length recorded in the block directory.
        expected: usize,
        /// Length actually decoded.
        actual: usize,
    },
    /// The writer ran out of document ids.
    #[error("document id space exhausted")]
    TooManyDocuments,
    /// Encoded postings grew past the 4 GiB addressable by block offsets.
    #[error("encoded postings exceed 4 GiB")]
    DataTooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::types::TermEntry;
    use metrisearch_types::DocId;

    fn compiled(docs: &[&[u32]]) -> CompiledPostings {
        let mut writer = PostingsWriter::new();
        for terms in docs {
            writer.add_document(terms).expect("should add doc");
        }
        writer.compile().expect("should compile")
    }

    #[test]
    fn doc_ids_are_dense() {
        let mut writer = PostingsWriter::new();
        assert_eq!(writer.add_document(&[1, 2]), Ok(0));
        assert_eq!(writer.add_document(&[2, 3]), Ok(1));
        assert_eq!(writer.add_document(&[]), Ok(2));
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.pending_pairs(), 4);
    }

    #[test]
    fn and_query() {
        let idx = compiled(&[&[1, 2, 3], &[1, 3], &[2, 3], &[4]]);
        assert_eq!(idx.query(&[1]), Ok(vec![0, 1]));
        assert_eq!(idx.query(&[3]), Ok(vec![0, 1, 2]));
        assert_eq!(idx.query(&[1, 3]), Ok(vec![0, 1]));
        assert_eq!(idx.query(&[2, 3]), Ok(vec![0, 2]));
        assert_eq!(idx.query(&[1, 2, 3]), Ok(vec![0]));
        assert_eq!(idx.query(&[1, 4]), Ok(vec![]));
    }

    #[test]
    fn query_term_order_is_irrelevant() {
        let idx = compiled(&[&[5, 6, 7], &[5, 7], &[7]]);
        assert_eq!(idx.query(&[7, 5]), idx.query(&[5, 7]));
        assert_eq!(idx.query(&[7, 7, 5]), Ok(vec![0, 1]));
    }

    #[test]
    fn unknown_term_matches_nothing() {
        let idx = compiled(&[&[1], &[2]]);
        assert_eq!(idx.query(&[99]), Ok(vec![]));
        assert_eq!(idx.query(&[1, 99]), Ok(vec![]));
    }

    #[test]
    fn empty_query_matches_nothing() {
        let idx = compiled(&[&[1], &[2]]);
        assert_eq!(idx.query(&[]), Ok(vec![]));
    }

    #[test]
    fn empty_index() {
        let idx = CompiledPostings::empty();
        assert!(idx.is_empty());
        assert_eq!(idx.query(&[1]), Ok(vec![]));
        assert_eq!(idx.stats().compression_ratio(), 1.0);
    }

    #[test]
    fn repeated_terms_in_a_document_post_once() {
        let idx = compiled(&[&[8, 8, 8], &[8]]);
        assert_eq!(idx.document_frequency(8), 2);
        assert_eq!(idx.postings(8), Ok(vec![0, 1]));
        assert_eq!(idx.stats().total_postings, 2);
    }

    #[test]
    fn writer_survives_compile_until_cleared() {
        let mut writer = PostingsWriter::new();
        writer.add_document(&[1]).expect("should add doc");
        let first = writer.compile().expect("should compile");
        assert_eq!(first.num_documents(), 1);

        writer.clear();
        assert!(writer.is_empty());
        assert_eq!(writer.add_document(&[2]), Ok(0));
        let second = writer.compile().expect("should compile");
        assert_eq!(second.query(&[1]), Ok(vec![]));
        assert_eq!(second.query(&[2]), Ok(vec![0]));
        // the first compiled structure is unaffected
        assert_eq!(first.query(&[1]), Ok(vec![0]));
    }

    #[test]
    fn blocks_sorted_by_term_and_lists_ascending() {
        let docs: Vec<Vec<u32>> = (0..200u32).map(|i| vec![i % 7, 100 + i % 3]).collect();
        let refs: Vec<&[u32]> = docs.iter().map(Vec::as_slice).collect();
        let idx = compiled(&refs);

        for w in idx.blocks.windows(2) {
            assert!(w[0].term < w[1].term, "blocks must be sorted by term");
        }
        for block in &idx.blocks {
            let list = idx.postings(block.term).expect("should decode");
            assert_eq!(list.len(), block.docs as usize);
            for w in list.windows(2) {
                assert!(w[0] < w[1], "posting list must be strictly sorted");
            }
        }
    }

    #[test]
    fn radix_sort_correctness() {
        let n = RADIX_SORT_THRESHOLD * 4;
        let mut entries: Vec<TermEntry> = (0..n as u32)
            .map(|i| TermEntry {
                term: i.wrapping_mul(2_654_435_761) % 97,
                doc_id: i / 3,
            })
            .collect();

        let mut reference = entries.clone();
        reference.sort_unstable_by(|a, b| {
            a.term
                .cmp(&b.term)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        PostingsWriter::sort_entries(&mut entries);

        for (i, (got, want)) in entries.iter().zip(reference.iter()).enumerate() {
            assert_eq!(
                (got.term, got.doc_id),
                (want.term, want.doc_id),
                "Mismatch at index {i}"
            );
        }
    }

    #[test]
    fn large_build_matches_small_build() {
        let docs: Vec<Vec<u32>> = (0..1000u32)
            .map(|i| vec![u32::MAX - (i % 13), i % 5, 1 << 20])
            .collect();
        let refs: Vec<&[u32]> = docs.iter().map(Vec::as_slice).collect();
        let idx = compiled(&refs);

        let expected: Vec<DocId> = (0..1000u32).filter(|i| i % 13 == 2 && i % 5 == 4).collect();
        assert_eq!(idx.query(&[u32::MAX - 2, 4, 1 << 20]), Ok(expected));
        assert_eq!(idx.document_frequency(1 << 20), 1000);
    }

    #[test]
    fn stats_report_sizes() {
        let docs: Vec<Vec<u32>> = (0..100u32).map(|i| vec![i % 10, 500]).collect();
        let refs: Vec<&[u32]> = docs.iter().map(Vec::as_slice).collect();
        let stats = compiled(&refs).stats();

        assert_eq!(stats.num_documents, 100);
        assert_eq!(stats.num_terms, 11);
        assert_eq!(stats.total_postings, 200);
        assert!(stats.encoded_bytes < stats.total_postings * 4);
        assert!(stats.compression_ratio() < 1.0);
        assert_eq!(
            stats.memory_usage_bytes(),
            stats.num_terms * 16 + stats.encoded_bytes
        );
        assert!(format!("{stats}").contains("100 docs"));
    }
}
