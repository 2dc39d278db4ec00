//! Posting list encoding.
//!
//! Each compiled posting list is a strictly ascending run of [`DocId`]s stored
//! as delta + varint bytes:
//!
//! - the first document id is written as-is, every following one as the gap
//!   to its predecessor, so dense lists turn into runs of small numbers
//! - each number is a protobuf-style varint: 7 data bits per byte, high bit
//!   set while more bytes follow (1 byte below 128, at most 5 for a `u32`)
//!
//! ```text
//! docs:   [100, 105, 110, 300]
//! gaps:   [100,   5,   5, 190]
//! bytes:  [0x64, 0x05, 0x05, 0xbe, 0x01]
//! ```

use metrisearch_types::DocId;

use crate::postings::PostingsError;

/// Appends `value` as a varint to `out`.
#[inline(always)]
pub(crate) fn write_varint(mut value: u32, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads one varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
#[inline(always)]
pub(crate) fn read_varint(buf: &[u8]) -> Result<(u32, usize), PostingsError> {
    let mut result: u32 = 0;
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 32 {
            return Err(PostingsError::VarintOverflow);
        }
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(PostingsError::Truncated)
}

/// Incremental encoder for one ascending posting list.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DeltaEncoder {
    last: Option<DocId>,
}

impl DeltaEncoder {
    /// Starts a new list.
    #[inline(always)]
    pub(crate) const fn new() -> Self {
        Self { last: None }
    }

    /// Appends `doc_id`, skipping it when equal to the previous one.
    ///
    /// Returns whether a posting was written. Ids must arrive ascending.
    #[inline(always)]
    pub(crate) fn push(&mut self, doc_id: DocId, out: &mut Vec<u8>) -> bool {
        match self.last {
            Some(last) if last == doc_id => false,
            Some(last) => {
                debug_assert!(doc_id > last, "posting list must be ascending");
                write_varint(doc_id - last, out);
                self.last = Some(doc_id);
                true
            }
            None => {
                write_varint(doc_id, out);
                self.last = Some(doc_id);
                true
            }
        }
    }
}

/// Decodes exactly `count` postings from `bytes`, appending to `out`.
pub(crate) fn decode_list(
    bytes: &[u8],
    count: usize,
    out: &mut Vec<DocId>,
) -> Result<(), PostingsError> {
    out.reserve(count);
    let base = out.len();

    let mut i = 0usize;
    let mut prev: Option<DocId> = None;
    while i < bytes.len() {
        let (value, used) = read_varint(&bytes[i..])?;
        i += used;
        let doc_id = match prev {
            None => value,
            Some(p) => p.checked_add(value).ok_or(PostingsError::VarintOverflow)?,
        };
        out.push(doc_id);
        prev = Some(doc_id);
    }

    let decoded = out.len() - base;
    if decoded != count {
        return Err(PostingsError::CountMismatch {
            expected: count,
            actual: decoded,
        });
    }
    Ok(())
}
