//! Text Index Integration Tests
//!
//! Drives the public API end to end: rebuild from a snapshot, query by
//! tokens, combine with other backends, and query while rebuilds publish new
//! generations from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use metrisearch_core::index::{Index, IndexError, TEXT_INDEX_NAME};
use metrisearch_core::{
    hash_metric, hash_metrics, intersect, union, IndexConfig, Metric, MetricTokenizer, TermId,
    TextIndex, Tokenize, TokenizerConfig,
};

fn terms(index: &TextIndex, text: &str) -> Vec<TermId> {
    index.tokenizer().tokenize(text).expect("valid metric name")
}

fn sorted(mut metrics: Vec<Metric>) -> Vec<Metric> {
    metrics.sort_unstable();
    metrics
}

// =============================================================================
// Rebuild and Query
// =============================================================================

#[test]
fn rebuild_round_trip() {
    let names = [
        "servers.ams4.web01.cpu.user",
        "servers.ams4.web01.cpu.system",
        "servers.ams4.db01.cpu.user",
        "servers.fra1.web01.cpu.user",
        "servers.fra1.web01.mem.used",
    ];

    let index = TextIndex::new();
    assert_eq!(index.materialize(&names).expect("should materialize"), names.len());

    let found = sorted(index.query(&terms(&index, "web01.cpu.user")).expect("query"));
    let expected = sorted(hash_metrics(&[
        "servers.ams4.web01.cpu.user",
        "servers.fra1.web01.cpu.user",
    ]));
    assert_eq!(found, expected);

    for name in names {
        assert_eq!(
            index.query(&terms(&index, name)).expect("query"),
            vec![hash_metric(name)],
            "full name must find exactly itself"
        );
        assert_eq!(index.metric_name(hash_metric(name)).as_deref(), Some(name));
    }
}

#[test]
fn rebuild_replaces_instead_of_merging() {
    let index = TextIndex::new();
    index
        .materialize(&["app.requests.count", "app.errors.count"])
        .expect("should materialize");
    index
        .materialize(&["app.latency.p99"])
        .expect("should materialize");

    assert!(index.query_text("requests").expect("query").is_empty());
    assert!(index.query_text("count").expect("query").is_empty());
    assert_eq!(
        index.query_text("app").expect("query"),
        vec![hash_metric("app.latency.p99")]
    );

    let generation = index.generation();
    assert_eq!(generation.number(), 2);
    assert_eq!(generation.len(), 1);
}

#[test]
fn aborted_rebuild_keeps_serving_previous_generation() {
    let index = TextIndex::new();
    index.materialize(&["a.b", "c.d"]).expect("should materialize");
    let before = index.generation();

    let err = index
        .materialize(&["a.b", "c.d", "broken."])
        .expect_err("trailing separator aborts the rebuild");
    assert!(matches!(err, IndexError::Tokenize { .. }));
    assert_eq!(err.index(), TEXT_INDEX_NAME);

    let after = index.generation();
    assert!(Arc::ptr_eq(&before, &after), "nothing was published");
    assert_eq!(index.query_text("c").expect("query"), vec![hash_metric("c.d")]);
}

#[test]
fn prometheus_style_names() {
    let index = TextIndex::with_tokenizer(
        MetricTokenizer::new(TokenizerConfig::prometheus()),
        IndexConfig::strict(),
    );
    index
        .materialize(&[
            "node_cpu_seconds_total",
            "node_memory_bytes",
            "process_cpu_seconds_total",
        ])
        .expect("should materialize");

    let found = sorted(index.query_text("cpu_seconds").expect("query"));
    let expected = sorted(hash_metrics(&["node_cpu_seconds_total", "process_cpu_seconds_total"]));
    assert_eq!(found, expected);
}

#[test]
fn combines_with_other_results() {
    let index = TextIndex::new();
    index
        .materialize(&["svc.api.latency", "svc.api.errors", "svc.db.latency"])
        .expect("should materialize");

    let latency = sorted(index.query_text("latency").expect("query"));
    let api = sorted(index.query_text("api").expect("query"));

    assert_eq!(intersect(&[&latency, &api]), vec![hash_metric("svc.api.latency")]);
    assert_eq!(union(&[&latency, &api]).len(), 3);
}

#[test]
fn usable_as_a_trait_object() {
    let index: Arc<dyn Index<TermId>> = {
        let text = TextIndex::new();
        text.materialize(&["x.y"]).expect("should materialize");
        Arc::new(text)
    };
    let query = MetricTokenizer::default().tokenize("y").expect("valid metric name");
    assert_eq!(index.name(), TEXT_INDEX_NAME);
    assert_eq!(index.query(&query).expect("query"), vec![hash_metric("x.y")]);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Readers racing a writer that alternates between two disjoint snapshots
/// must always see one snapshot in full, never a mix of the two.
#[test]
fn queries_never_observe_a_torn_generation() {
    const READERS: usize = 4;
    const REBUILDS: usize = 200;

    let gen_a: Vec<String> = (0..300).map(|i| format!("shared.alpha.host{i}")).collect();
    let gen_b: Vec<String> = (0..500).map(|i| format!("shared.beta.host{i}")).collect();

    let index = Arc::new(TextIndex::new());
    index.materialize(&gen_a).expect("should materialize");

    let query = terms(&index, "shared");
    let expect_a = hash_metrics(&gen_a);
    let expect_b = hash_metrics(&gen_b);

    let done = Arc::new(AtomicBool::new(false));
    let start = Arc::new(Barrier::new(READERS + 1));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let index = Arc::clone(&index);
            let done = Arc::clone(&done);
            let start = Arc::clone(&start);
            let query = query.clone();
            let (expect_a, expect_b) = (expect_a.clone(), expect_b.clone());
            thread::spawn(move || {
                start.wait();
                let mut seen = 0usize;
                while !done.load(Ordering::Acquire) {
                    let found = index.query(&query).expect("query must not fail");
                    assert!(
                        found == expect_a || found == expect_b,
                        "torn read: {} metrics",
                        found.len()
                    );
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    start.wait();
    for i in 0..REBUILDS {
        let snapshot = if i % 2 == 0 { &gen_b } else { &gen_a };
        index.materialize(snapshot).expect("should materialize");
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().expect("reader panicked");
    }

    assert_eq!(index.generation().number(), 1 + REBUILDS as u64);
    assert_eq!(index.counters().consistency_errors, 0);
}

#[test]
fn concurrent_rebuilds_are_serialized() {
    const WRITERS: usize = 4;
    const ROUNDS: usize = 25;

    let index = Arc::new(TextIndex::new());
    let start = Arc::new(Barrier::new(WRITERS));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let index = Arc::clone(&index);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                let names: Vec<String> = (0..100).map(|i| format!("writer{w}.metric{i}")).collect();
                start.wait();
                for _ in 0..ROUNDS {
                    index.materialize(&names).expect("should materialize");
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().expect("writer panicked");
    }

    // the last rebuild wins whole: exactly one writer's snapshot is visible
    let generation = index.generation();
    assert_eq!(generation.number(), (WRITERS * ROUNDS) as u64);
    assert_eq!(index.counters().rebuilds, generation.number());
    assert_eq!(generation.len(), 100);
    let visible = (0..WRITERS)
        .filter(|w| {
            !index
                .query_text(&format!("writer{w}"))
                .expect("query")
                .is_empty()
        })
        .count();
    assert_eq!(visible, 1);
}
