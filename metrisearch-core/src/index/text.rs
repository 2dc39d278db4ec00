//! Versioned full-text index over tokenized metric names.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use arc_swap::ArcSwap;
use metrisearch_types::{hash_metrics, IndexConfig, Metric, TermId, TokenizeFailurePolicy};
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, warn};

use crate::analyzer::{MetricTokenizer, Tokenize};
use crate::arena::NameArena;
use crate::index::error::IndexError;
use crate::index::generation::Generation;
use crate::index::Index;
use crate::postings::{PostingsError, PostingsWriter};

/// Name reported in diagnostics and errors.
pub const TEXT_INDEX_NAME: &str = "postings text index";

/// Text index over metric names, rebuilt wholesale and queried lock-free.
///
/// Readers load the current [`Generation`] through one atomic pointer and
/// never touch the write path, so a query always sees a complete generation:
/// postings and both mappings from the same rebuild. A superseded generation
/// is freed when its last in-flight query drops it.
///
/// Rebuilds take the write structure's mutex for their whole duration, which
/// also serializes two rebuilds racing each other. Queries never block on it.
pub struct TextIndex<T: Tokenize = MetricTokenizer> {
    current: ArcSwap<Generation>,
    writer: Mutex<PostingsWriter>,
    tokenizer: T,
    config: IndexConfig,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    rebuilds: AtomicU64,
    aborted_rebuilds: AtomicU64,
    queries: AtomicU64,
    consistency_errors: AtomicU64,
}

/// Operational counters of a [`TextIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCounters {
    /// Rebuilds that published a generation.
    pub rebuilds: u64,
    /// Rebuilds abandoned on an error.
    pub aborted_rebuilds: u64,
    /// Queries executed, successful or not.
    pub queries: u64,
    /// Queries that hit an unmappable document.
    pub consistency_errors: u64,
}

impl Default for TextIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TextIndex {
    /// Creates an empty index with the default tokenizer and configuration.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Creates an empty index with the default tokenizer.
    pub fn with_config(config: IndexConfig) -> Self {
        Self::with_tokenizer(MetricTokenizer::default(), config)
    }
}

impl<T: Tokenize> TextIndex<T> {
    /// Creates an empty index with a custom tokenizer.
    pub fn with_tokenizer(tokenizer: T, config: IndexConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(Generation::empty()),
            writer: Mutex::new(PostingsWriter::with_capacity(config.writer_capacity)),
            tokenizer,
            config,
            counters: Counters::default(),
        }
    }

    /// Backend name used in errors.
    #[inline(always)]
    pub fn name(&self) -> &str {
        TEXT_INDEX_NAME
    }

    /// Active configuration.
    #[inline(always)]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The tokenizer used for rebuilds and text queries.
    #[inline(always)]
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Rebuilds the index from a full snapshot of raw metric names and
    /// publishes it as the new generation.
    ///
    /// Returns the number of names processed. The previous generation is
    /// replaced, never merged with.
    ///
    /// # Errors
    ///
    /// Under [`TokenizeFailurePolicy::Abort`] a single malformed name aborts
    /// the rebuild with `IndexError::Tokenize`; nothing is published and the
    /// previous generation keeps serving queries. Callers must treat this as
    /// fatal for the rebuild, not retry name by name. A name the tokenizer
    /// accepts but the name store cannot hold (over 65535 bytes) follows the
    /// same policy and fails with `IndexError::NameTooLong`.
    pub fn materialize<S: AsRef<str>>(&self, raw_metrics: &[S]) -> Result<usize, IndexError> {
        let started = Instant::now();
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => {
                // the writer is cleared before every build, so a panicked
                // rebuild leaves nothing behind that the next one would read
                warn!(index = self.name(), "recovering writer after a panicked rebuild");
                self.writer.clear_poison();
                poisoned.into_inner()
            }
        };

        debug!(
            index = self.name(),
            names = raw_metrics.len(),
            "materializing text index"
        );

        writer.clear();
        let built = self.build_generation(&mut writer, raw_metrics);
        writer.clear();

        let generation = match built {
            Ok(generation) => generation,
            Err(err) => {
                drop(writer);
                self.counters
                    .aborted_rebuilds
                    .fetch_add(1, Ordering::Relaxed);
                error!(index = self.name(), error = %err, "rebuild aborted");
                return Err(err);
            }
        };

        let number = generation.number;
        let documents = generation.len();
        let stats = generation.stats();

        // publish before releasing the writer so the next rebuild numbers
        // itself after this generation
        self.current.store(Arc::new(generation));
        self.counters.rebuilds.fetch_add(1, Ordering::Relaxed);
        drop(writer);

        info!(
            index = self.name(),
            generation = number,
            documents,
            terms = stats.num_terms,
            encoded_bytes = stats.encoded_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "published generation"
        );

        Ok(raw_metrics.len())
    }

    fn build_generation<S: AsRef<str>>(
        &self,
        writer: &mut PostingsWriter,
        raw_metrics: &[S],
    ) -> Result<Generation, IndexError> {
        let hashed = hash_metrics(raw_metrics);
        let text_bytes: usize = raw_metrics.iter().map(|s| s.as_ref().len()).sum();

        let mut doc_metrics = Vec::with_capacity(raw_metrics.len());
        let mut metric_docs =
            FxHashMap::with_capacity_and_hasher(raw_metrics.len(), Default::default());
        let mut names = NameArena::with_capacity(text_bytes, raw_metrics.len());
        let mut terms: Vec<TermId> = Vec::with_capacity(16);
        let mut skipped = 0usize;

        for (raw, &metric) in raw_metrics.iter().zip(&hashed) {
            let raw = raw.as_ref();

            terms.clear();
            if let Err(source) = self.tokenizer.tokenize_into(raw, &mut terms) {
                match self.config.tokenize_failure {
                    TokenizeFailurePolicy::Abort => {
                        return Err(IndexError::Tokenize {
                            index: self.name().to_owned(),
                            name: raw.to_owned(),
                            source,
                        });
                    }
                    TokenizeFailurePolicy::Skip => {
                        warn!(
                            index = self.name(),
                            name = raw,
                            error = %source,
                            "skipping metric name"
                        );
                        skipped += 1;
                        continue;
                    }
                }
            }

            let Some(slot) = names.push(raw) else {
                match self.config.tokenize_failure {
                    TokenizeFailurePolicy::Abort => {
                        return Err(IndexError::NameTooLong {
                            index: self.name().to_owned(),
                            len: raw.len(),
                        });
                    }
                    TokenizeFailurePolicy::Skip => {
                        warn!(
                            index = self.name(),
                            len = raw.len(),
                            "skipping metric name too long for the name store"
                        );
                        skipped += 1;
                        continue;
                    }
                }
            };
            let doc = writer
                .add_document(&terms)
                .map_err(|source| self.postings_error(source))?;
            debug_assert_eq!(slot, doc, "name slots track document ids");

            doc_metrics.push(metric);
            metric_docs.insert(metric, doc);
        }

        if skipped > 0 {
            warn!(index = self.name(), skipped, "rebuild skipped malformed names");
        }

        let postings = writer
            .compile()
            .map_err(|source| self.postings_error(source))?;

        Ok(Generation {
            number: self.current.load().number + 1,
            postings,
            doc_metrics,
            metric_docs,
            names,
        })
    }

    /// Returns the metrics whose names contain every one of `tokens`.
    ///
    /// Reads the latest published generation without blocking. Results come
    /// in document order, which is not metric order; sort before feeding them
    /// to [`algebra`](crate::algebra).
    ///
    /// # Errors
    ///
    /// `IndexError::UnmappedDocument` if the postings returned a document the
    /// generation cannot map to a metric.
    pub fn query(&self, tokens: &[TermId]) -> Result<Vec<Metric>, IndexError> {
        self.counters.queries.fetch_add(1, Ordering::Relaxed);

        let generation = self.current.load();
        let docs = generation
            .postings
            .query(tokens)
            .map_err(|source| self.postings_error(source))?;

        generation.docs_to_metrics(&docs).map_err(|doc| {
            self.counters
                .consistency_errors
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                index = self.name(),
                generation = generation.number,
                doc,
                "document missing from document-to-metric map"
            );
            IndexError::UnmappedDocument {
                index: self.name().to_owned(),
                doc,
            }
        })
    }

    /// Tokenizes `text` like a metric name and queries with its terms.
    pub fn query_text(&self, text: &str) -> Result<Vec<Metric>, IndexError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|source| IndexError::Tokenize {
                index: self.name().to_owned(),
                name: text.to_owned(),
                source,
            })?;
        self.query(&tokens)
    }

    /// Snapshot of the current generation.
    ///
    /// Holding it keeps that generation alive after newer ones are published.
    pub fn generation(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Raw name of `metric` in the current generation.
    pub fn metric_name(&self, metric: Metric) -> Option<String> {
        self.current.load().metric_name(metric).map(str::to_owned)
    }

    /// Returns the operational counters.
    pub fn counters(&self) -> IndexCounters {
        IndexCounters {
            rebuilds: self.counters.rebuilds.load(Ordering::Relaxed),
            aborted_rebuilds: self.counters.aborted_rebuilds.load(Ordering::Relaxed),
            queries: self.counters.queries.load(Ordering::Relaxed),
            consistency_errors: self.counters.consistency_errors.load(Ordering::Relaxed),
        }
    }

    fn postings_error(&self, source: PostingsError) -> IndexError {
        IndexError::Postings {
            index: self.name().to_owned(),
            source,
        }
    }

    #[cfg(test)]
    pub(crate) fn publish(&self, generation: Generation) {
        self.current.store(Arc::new(generation));
    }
}

impl<T: Tokenize> Index<TermId> for TextIndex<T> {
    fn query(&self, query: &[TermId]) -> Result<Vec<Metric>, IndexError> {
        TextIndex::<T>::query(self, query)
    }

    fn name(&self) -> &str {
        TextIndex::<T>::name(self)
    }
}
