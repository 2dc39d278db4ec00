//! Statistics for compiled postings.

use metrisearch_types::DocId;

use crate::postings::types::CompiledPostings;

/// A snapshot of postings statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostingsStats {
    /// Number of documents.
    pub num_documents: usize,
    /// Number of distinct terms.
    pub num_terms: usize,
    /// Total number of (term, document) postings.
    pub total_postings: usize,
    /// Size of the encoded posting lists in bytes.
    pub encoded_bytes: usize,
}

impl CompiledPostings {
    /// Returns postings statistics.
    pub fn stats(&self) -> PostingsStats {
        PostingsStats {
            num_documents: self.num_documents,
            num_terms: self.blocks.len(),
            total_postings: self.total_postings,
            encoded_bytes: self.data.len(),
        }
    }
}

impl PostingsStats {
    /// Encoded size relative to storing every posting as a raw `u32`.
    ///
    /// 1.0 for an empty index.
    pub fn compression_ratio(&self) -> f32 {
        let raw = self.total_postings * std::mem::size_of::<DocId>();
        if raw == 0 {
            1.0
        } else {
            self.encoded_bytes as f32 / raw as f32
        }
    }

    /// Approximate heap usage: block directory plus encoded lists.
    pub fn memory_usage_bytes(&self) -> usize {
        let blocks_size = self.num_terms * std::mem::size_of::<u32>() * 4;
        blocks_size + self.encoded_bytes
    }
}

impl core::fmt::Display for PostingsStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} docs, {} terms, {} postings, {} bytes encoded ({:.1}%)",
            self.num_documents,
            self.num_terms,
            self.total_postings,
            self.encoded_bytes,
            self.compression_ratio() * 100.0
        )
    }
}
