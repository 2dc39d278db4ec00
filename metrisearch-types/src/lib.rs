//! Core types for the metrisearch index.
//!
//! This crate holds the vocabulary shared by every index backend:
//!
//! - **Identifiers**: [`Metric`] and [`Tag`] are 64-bit hashes of raw strings,
//!   kept as distinct types so the two namespaces can never be compared.
//! - **Hashing**: deterministic `xxh3` based derivation of those identifiers.
//! - **Configuration**: tokenizer and index settings with sensible defaults.
//! - **Errors**: the tokenization failure type reported by analyzers.

#![warn(missing_docs)]

use core::fmt;

use xxhash_rust::xxh3::xxh3_64;

/// Postings-engine document identifier.
///
/// Assigned densely from zero by the write structure. A `DocId` has no meaning
/// outside the index generation that produced it.
pub type DocId = u32;

/// Identifier of one token of a tokenized metric name.
pub type TermId = u32;

macro_rules! hashed_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Derives the identifier for a raw string.
            #[inline]
            #[must_use]
            pub fn of(raw: &str) -> Self {
                Self(xxh3_64(raw.as_bytes()))
            }

            /// Returns the underlying hash value.
            #[inline(always)]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            #[inline(always)]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            #[inline(always)]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, ":{:016x}"), self.0)
            }
        }
    };
}

hashed_id!(
    /// Identifier of a raw metric name such as `"servers.ams4.cpu.user"`.
    ///
    /// Distinct strings are assumed not to collide; a collision silently merges
    /// two metrics and is not detected.
    Metric,
    "metric"
);

hashed_id!(
    /// Identifier of a raw descriptive tag such as `"datacenter:ams4"`.
    Tag,
    "tag"
);

/// Hashes a raw metric name.
#[inline]
pub fn hash_metric(raw: &str) -> Metric {
    Metric::of(raw)
}

/// Hashes metric names, preserving length and order.
pub fn hash_metrics<S: AsRef<str>>(raw: &[S]) -> Vec<Metric> {
    raw.iter().map(|s| Metric::of(s.as_ref())).collect()
}

/// Hashes a raw tag.
#[inline]
pub fn hash_tag(raw: &str) -> Tag {
    Tag::of(raw)
}

/// Hashes tags, preserving length and order.
pub fn hash_tags<S: AsRef<str>>(raw: &[S]) -> Vec<Tag> {
    raw.iter().map(|s| Tag::of(s.as_ref())).collect()
}

/// Hashes one token of a metric name to a [`TermId`].
///
/// Uses the low 32 bits of the same `xxh3` hash as the 64-bit identifiers.
#[inline]
pub fn hash_term(token: &[u8]) -> TermId {
    xxh3_64(token) as TermId
}

/// Reasons a raw metric name cannot be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    /// The name has no bytes at all.
    #[error("metric name is empty")]
    Empty,
    /// The name exceeds the configured maximum length.
    #[error("metric name too long: {len} bytes (max: {max_len} bytes)")]
    TooLong {
        /// Actual length in bytes.
        len: usize,
        /// Configured maximum in bytes.
        max_len: usize,
    },
    /// Two separators are adjacent, or the name starts or ends with one.
    #[error("empty segment at byte offset {offset}")]
    EmptySegment {
        /// Byte offset where the empty segment starts.
        offset: usize,
    },
    /// The name contains a control character.
    #[error("control character 0x{byte:02x} at byte offset {offset}")]
    ControlCharacter {
        /// The offending byte.
        byte: u8,
        /// Its byte offset.
        offset: usize,
    },
}

/// Metric name tokenizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenizerConfig {
    /// Byte that separates the segments of a metric name.
    /// Default: `b'.'` (graphite style `a.b.c`).
    pub separator: u8,
    /// Longest accepted metric name in bytes.
    /// Default: 65535, the limit of the raw-name arena.
    pub max_name_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::graphite()
    }
}

impl TokenizerConfig {
    /// Dot-separated names, as produced by graphite/carbon pipelines.
    pub const fn graphite() -> Self {
        Self {
            separator: b'.',
            max_name_len: u16::MAX as usize,
        }
    }

    /// Underscore-separated names, as produced by prometheus exporters.
    pub const fn prometheus() -> Self {
        Self {
            separator: b'_',
            max_name_len: u16::MAX as usize,
        }
    }
}

/// What a rebuild does when a metric name fails to tokenize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenizeFailurePolicy {
    /// Abort the whole rebuild and keep the previous generation published.
    #[default]
    Abort,
    /// Log and skip the offending name, indexing the rest.
    Skip,
}

/// Text index settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexConfig {
    /// Behaviour on malformed metric names. Default: [`TokenizeFailurePolicy::Abort`].
    pub tokenize_failure: TokenizeFailurePolicy,
    /// Initial capacity, in (term, document) pairs, of the write structure.
    pub writer_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl IndexConfig {
    /// Any malformed name aborts the rebuild.
    pub const fn strict() -> Self {
        Self {
            tokenize_failure: TokenizeFailurePolicy::Abort,
            writer_capacity: 64 * 1024,
        }
    }

    /// Malformed names are skipped with a warning.
    pub const fn lenient() -> Self {
        Self {
            tokenize_failure: TokenizeFailurePolicy::Skip,
            writer_capacity: 64 * 1024,
        }
    }
}
