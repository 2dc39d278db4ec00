//! Compilation of the write structure into immutable postings.

use crate::postings::codec::DeltaEncoder;
use crate::postings::types::{
    CompiledPostings, PostingsWriter, TermBlock, TermEntry, RADIX_SORT_THRESHOLD,
};
use crate::postings::PostingsError;

impl PostingsWriter {
    /// Compiles everything added so far into a [`CompiledPostings`].
    ///
    /// Sorts the pending pairs by term in place, then encodes one block per
    /// distinct term in a single scan. The writer keeps its documents; call
    /// [`clear`](Self::clear) to start the next build.
    ///
    /// # Errors
    ///
    /// Returns `PostingsError::DataTooLarge` if the encoded postings exceed
    /// 4 GiB.
    pub fn compile(&mut self) -> Result<CompiledPostings, PostingsError> {
        Self::sort_entries(&mut self.entries);
        let mut compiled = Self::build_blocks_from_sorted(&self.entries)?;
        compiled.num_documents = self.len();
        Ok(compiled)
    }

    /// Orders entries by term, then document.
    ///
    /// Documents are appended with ascending ids, so entries already arrive
    /// ordered by document. A stable sort on the term alone therefore yields
    /// (term, document) order, which lets the radix path skip the four
    /// document-byte passes.
    pub(crate) fn sort_entries(entries: &mut [TermEntry]) {
        if entries.len() < RADIX_SORT_THRESHOLD {
            entries.sort_unstable_by(|a, b| {
                a.term
                    .cmp(&b.term)
                    .then_with(|| a.doc_id.cmp(&b.doc_id))
            });
            return;
        }

        let dummy = TermEntry { term: 0, doc_id: 0 };
        let mut aux = vec![dummy; entries.len()];

        Self::radix_pass(entries, &mut aux, |e| e.term as u8);
        Self::radix_pass(&aux, entries, |e| (e.term >> 8) as u8);
        Self::radix_pass(entries, &mut aux, |e| (e.term >> 16) as u8);
        Self::radix_pass(&aux, entries, |e| (e.term >> 24) as u8);
    }

    #[inline(always)]
    fn radix_pass(src: &[TermEntry], dst: &mut [TermEntry], key_fn: impl Fn(&TermEntry) -> u8) {
        let mut hist = [0usize; 256];
        let mut offsets = [0usize; 256];

        for entry in src {
            hist[key_fn(entry) as usize] += 1;
        }

        let mut sum = 0usize;
        for (h, off) in hist.iter().zip(offsets.iter_mut()) {
            *off = sum;
            sum += h;
        }

        for entry in src {
            let k = key_fn(entry) as usize;
            dst[offsets[k]] = *entry;
            offsets[k] += 1;
        }
    }

    pub(crate) fn build_blocks_from_sorted(
        entries: &[TermEntry],
    ) -> Result<CompiledPostings, PostingsError> {
        let mut compiled = CompiledPostings::default();
        let Some(first) = entries.first() else {
            return Ok(compiled);
        };

        compiled.data.reserve(entries.len());

        let mut current_term = first.term;
        let mut block_start = 0usize;
        let mut block_docs = 0u32;
        let mut encoder = DeltaEncoder::new();

        for entry in entries {
            if entry.term != current_term {
                compiled.push_block(current_term, block_start, block_docs)?;
                current_term = entry.term;
                block_start = compiled.data.len();
                block_docs = 0;
                encoder = DeltaEncoder::new();
            }

            if encoder.push(entry.doc_id, &mut compiled.data) {
                block_docs += 1;
            }
        }
        compiled.push_block(current_term, block_start, block_docs)?;

        Ok(compiled)
    }
}

impl CompiledPostings {
    fn push_block(&mut self, term: u32, start: usize, docs: u32) -> Result<(), PostingsError> {
        let offset = u32::try_from(start).map_err(|_| PostingsError::DataTooLarge)?;
        let bytes =
            u32::try_from(self.data.len() - start).map_err(|_| PostingsError::DataTooLarge)?;
        self.blocks.push(TermBlock {
            term,
            offset,
            bytes,
            docs,
        });
        self.total_postings += docs as usize;
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn block_bytes(&self, block: &TermBlock) -> &[u8] {
        let start = block.offset as usize;
        &self.data[start..start + block.bytes as usize]
    }
}
