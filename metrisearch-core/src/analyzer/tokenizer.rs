//! Metric Name Tokenizer
//!
//! Splits a raw metric name into segments and turns each segment into a
//! [`TermId`]. Segments are borrowed byte slices of the input and are hashed
//! in place, so tokenizing allocates nothing beyond the output vector.
//!
//! ```text
//! "servers.ams4.cpu"  ->  ["servers", "ams4", "cpu"]  ->  [t0, t1, t2]
//! ```
//!
//! ## The Input Contract
//!
//! Unlike free text, metric names are machine generated, so anything odd is
//! treated as malformed rather than cleaned up:
//!
//! - the name must be non-empty and at most `max_name_len` bytes
//! - no control characters (0x00-0x1F, 0x7F)
//! - no empty segments, i.e. no leading, trailing or doubled separator
//!
//! A malformed name produces a [`TokenizeError`]; the text index decides
//! whether that aborts the rebuild.

use memchr::memchr_iter;
use metrisearch_types::{hash_term, TermId, TokenizeError, TokenizerConfig};

/// Turns a raw metric name into term identifiers.
///
/// Implementations must be deterministic: the same name always yields the
/// same terms, in the same order, both at rebuild time and at query time.
pub trait Tokenize: Send + Sync {
    /// Appends the terms of `raw` to `out`.
    ///
    /// On error `out` may hold a partial prefix; callers discard it.
    fn tokenize_into(&self, raw: &str, out: &mut Vec<TermId>) -> Result<(), TokenizeError>;

    /// Returns the terms of `raw`.
    fn tokenize(&self, raw: &str) -> Result<Vec<TermId>, TokenizeError> {
        let mut out = Vec::new();
        self.tokenize_into(raw, &mut out)?;
        Ok(out)
    }
}

const MAX_STORABLE_NAME_LEN: usize = u16::MAX as usize;

/// Separator-splitting tokenizer for hierarchical metric names.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricTokenizer {
    config: TokenizerConfig,
}

impl MetricTokenizer {
    /// Creates a tokenizer with the given configuration.
    ///
    /// `max_name_len` is clamped to 65535 bytes, the longest name a
    /// generation can store.
    #[inline]
    pub const fn new(mut config: TokenizerConfig) -> Self {
        if config.max_name_len > MAX_STORABLE_NAME_LEN {
            config.max_name_len = MAX_STORABLE_NAME_LEN;
        }
        Self { config }
    }

    /// Returns the active configuration.
    #[inline(always)]
    pub const fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Checks the input contract without producing any terms.
    pub fn validate(&self, raw: &str) -> Result<(), TokenizeError> {
        let bytes = raw.as_bytes();
        if bytes.is_empty() {
            return Err(TokenizeError::Empty);
        }
        if bytes.len() > self.config.max_name_len {
            return Err(TokenizeError::TooLong {
                len: bytes.len(),
                max_len: self.config.max_name_len,
            });
        }
        if let Some(offset) = bytes
            .iter()
            .position(|&b| matches!(b, 0x00..=0x1F | 0x7F))
        {
            return Err(TokenizeError::ControlCharacter {
                byte: bytes[offset],
                offset,
            });
        }

        let sep = self.config.separator;
        let mut start = 0usize;
        for i in memchr_iter(sep, bytes) {
            if i == start {
                return Err(TokenizeError::EmptySegment { offset: start });
            }
            start = i + 1;
        }
        if start == bytes.len() {
            return Err(TokenizeError::EmptySegment { offset: start });
        }

        Ok(())
    }

    /// Validates `raw` and emits each segment's bytes in order.
    pub fn segments<'n, F>(&self, raw: &'n str, mut emit: F) -> Result<(), TokenizeError>
    where
        F: FnMut(&'n [u8]),
    {
        self.validate(raw)?;

        let bytes = raw.as_bytes();
        let mut start = 0usize;

        for i in memchr_iter(self.config.separator, bytes) {
            emit(&bytes[start..i]);
            start = i + 1;
        }
        emit(&bytes[start..]);

        Ok(())
    }
}

impl Tokenize for MetricTokenizer {
    fn tokenize_into(&self, raw: &str, out: &mut Vec<TermId>) -> Result<(), TokenizeError> {
        self.segments(raw, |segment| out.push(hash_term(segment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(input: &str) -> Vec<&[u8]> {
        let mut out = Vec::new();
        MetricTokenizer::default()
            .segments(input, |text| out.push(text))
            .expect("valid metric name");
        out
    }

    #[test]
    fn single_segment() {
        assert_eq!(segments("uptime"), vec![&b"uptime"[..]]);
    }

    #[test]
    fn segments_in_name_order() {
        let out = segments("servers.ams4.web01.cpu");
        assert_eq!(
            out,
            vec![&b"servers"[..], &b"ams4"[..], &b"web01"[..], &b"cpu"[..]]
        );
    }

    #[test]
    fn segments_are_slices_of_input() {
        let input = String::from("a.bb.ccc");
        let base = input.as_ptr() as usize;
        let end = base + input.len();

        MetricTokenizer::default()
            .segments(&input, |text| {
                let ptr = text.as_ptr() as usize;
                assert!(ptr >= base && ptr < end);
            })
            .expect("valid metric name");
    }

    #[test]
    fn terms_are_segment_hashes() {
        let terms = MetricTokenizer::default()
            .tokenize("a.b.c")
            .expect("valid metric name");
        assert_eq!(
            terms,
            vec![hash_term(b"a"), hash_term(b"b"), hash_term(b"c")]
        );
    }

    #[test]
    fn tokenize_into_appends() {
        let t = MetricTokenizer::default();
        let mut out = vec![42];
        t.tokenize_into("x.y", &mut out).expect("valid metric name");
        assert_eq!(out, vec![42, hash_term(b"x"), hash_term(b"y")]);
    }

    #[test]
    fn repeated_segments_repeat_terms() {
        let terms = MetricTokenizer::default()
            .tokenize("cpu.cpu")
            .expect("valid metric name");
        assert_eq!(terms[0], terms[1]);
    }

    #[test]
    fn rejects_empty() {
        let t = MetricTokenizer::default();
        assert_eq!(t.tokenize(""), Err(TokenizeError::Empty));
    }

    #[test]
    fn rejects_empty_segments() {
        let t = MetricTokenizer::default();
        assert_eq!(
            t.tokenize(".a.b"),
            Err(TokenizeError::EmptySegment { offset: 0 })
        );
        assert_eq!(
            t.tokenize("a..b"),
            Err(TokenizeError::EmptySegment { offset: 2 })
        );
        assert_eq!(
            t.tokenize("a.b."),
            Err(TokenizeError::EmptySegment { offset: 4 })
        );
        assert_eq!(t.tokenize("."), Err(TokenizeError::EmptySegment { offset: 0 }));
    }

    #[test]
    fn rejects_control_characters() {
        let t = MetricTokenizer::default();
        assert_eq!(
            t.tokenize("a.b\x00c"),
            Err(TokenizeError::ControlCharacter {
                byte: 0x00,
                offset: 3
            })
        );
        assert!(t.tokenize("a\tb").is_err());
        assert!(t.tokenize("a.b\x7f").is_err());
    }

    #[test]
    fn rejects_oversized_names() {
        let t = MetricTokenizer::new(TokenizerConfig {
            max_name_len: 8,
            ..TokenizerConfig::default()
        });
        assert!(t.tokenize("abc.defg").is_ok());
        assert_eq!(
            t.tokenize("abc.defgh"),
            Err(TokenizeError::TooLong { len: 9, max_len: 8 })
        );
    }

    #[test]
    fn max_name_len_is_clamped_to_storable_length() {
        let t = MetricTokenizer::new(TokenizerConfig {
            max_name_len: 1 << 20,
            ..TokenizerConfig::default()
        });
        assert_eq!(t.config().max_name_len, u16::MAX as usize);

        let name = format!("a.{}", "b".repeat(70_000));
        assert_eq!(
            t.tokenize(&name),
            Err(TokenizeError::TooLong {
                len: 70_002,
                max_len: u16::MAX as usize
            })
        );
    }

    #[test]
    fn custom_separator() {
        let t = MetricTokenizer::new(TokenizerConfig::prometheus());
        let out = t.tokenize("node_cpu_seconds").expect("valid metric name");
        assert_eq!(out.len(), 3);
        // dots are ordinary bytes under a different separator
        assert_eq!(t.tokenize("a.b").map(|v| v.len()), Ok(1));
    }

    #[test]
    fn non_ascii_segments() {
        let out = segments("temp.café.kitchen");
        assert_eq!(out[1], "café".as_bytes());
    }
}
