//! Text Index Rebuild Benchmark
//!
//! Measures how long a full rebuild of the text index takes for a realistic
//! metric name snapshot, and how fast AND queries run against the published
//! generation.
//!
//! ## Usage
//!
//! ```bash
//! # One metric name per line
//! ./target/release/rebuild_bench /path/to/metric_names.txt
//!
//! # Generate a synthetic snapshot of N names instead
//! ./target/release/rebuild_bench --synthetic 2000000
//!
//! # Pick the separator (graphite '.' is the default)
//! ./target/release/rebuild_bench /path/to/names.txt prometheus
//! ```
//!
//! Set `RUST_LOG=metrisearch_core=debug` to see per-rebuild log lines.
//!
//! ## Example Output
//!
//! ```text
//! === Materialize ===
//! --------------------------------
//! Mode        : Materialize
//! Elapsed     : 1.204 s
//! Names       : 2_000_000
//! Names/sec   : 1_661_129
//! --------------------------------
//! ```

use std::env;
use std::fs;
use std::time::{Duration, Instant};

use metrisearch_core::{IndexConfig, MetricTokenizer, TermId, TextIndex, Tokenize, TokenizerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WARMUP_RUNS: usize = 1;
const MEASURE_RUNS: usize = 5;
const QUERY_SAMPLE: usize = 1000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metrisearch_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: rebuild_bench <path> [graphite|prometheus]");
        eprintln!("       rebuild_bench --synthetic <count> [graphite|prometheus]");
        std::process::exit(1);
    }

    let (names, rest) = if args[1] == "--synthetic" {
        let count: usize = args
            .get(2)
            .map(|s| s.parse::<usize>())
            .transpose()?
            .unwrap_or(1_000_000);
        (synthetic_names(count), args.get(3))
    } else {
        let text = fs::read_to_string(&args[1])?;
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();
        (names, args.get(2))
    };

    let tokenizer_config = match rest.map(String::as_str) {
        Some("prometheus") => TokenizerConfig::prometheus(),
        _ => TokenizerConfig::graphite(),
    };

    let text_bytes: u64 = names.iter().map(|n| n.len() as u64).sum();
    println!("Names:     {}", fmt_count(names.len() as u64));
    println!("Text size: {}\n", fmt_bytes(text_bytes));

    let index = TextIndex::with_tokenizer(
        MetricTokenizer::new(tokenizer_config),
        IndexConfig::lenient(),
    );

    bench_materialize(&index, &names)?;
    bench_query(&index, &names)?;

    println!("Generation: {}", index.generation().number());
    println!("Postings:   {}", index.generation().stats());
    Ok(())
}

fn bench_materialize(
    index: &TextIndex,
    names: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Materialize ===");

    for _ in 0..WARMUP_RUNS {
        index.materialize(names)?;
    }

    let mut total = Duration::ZERO;
    for _ in 0..MEASURE_RUNS {
        let start = Instant::now();
        index.materialize(names)?;
        total += start.elapsed();
    }

    print_perf("Materialize", "Names", total / MEASURE_RUNS as u32, names.len() as u64);
    Ok(())
}

fn bench_query(index: &TextIndex, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Query ===");

    // two-term queries built from the tail of sampled names
    let step = (names.len() / QUERY_SAMPLE).max(1);
    let queries: Vec<Vec<TermId>> = names
        .iter()
        .step_by(step)
        .filter_map(|name| index.tokenizer().tokenize(name).ok())
        .map(|terms| terms[terms.len().saturating_sub(2)..].to_vec())
        .collect();

    let mut hits = 0u64;
    let start = Instant::now();
    for _ in 0..MEASURE_RUNS {
        for query in &queries {
            hits += index.query(query)?.len() as u64;
        }
    }
    let elapsed = start.elapsed();
    std::hint::black_box(hits);

    print_perf(
        "Query",
        "Queries",
        elapsed,
        (queries.len() * MEASURE_RUNS) as u64,
    );
    println!("Hits        : {}\n", fmt_count(hits / MEASURE_RUNS as u64));
    Ok(())
}

fn synthetic_names(count: usize) -> Vec<String> {
    const DCS: [&str; 4] = ["ams4", "fra1", "iad2", "sin3"];
    const METRICS: [&str; 6] = [
        "cpu.user",
        "cpu.system",
        "mem.used",
        "disk.read",
        "disk.write",
        "net.rx",
    ];

    (0..count)
        .map(|i| {
            format!(
                "servers.{}.host{:05}.{}",
                DCS[i % DCS.len()],
                (i / METRICS.len()) % 50_000,
                METRICS[i % METRICS.len()]
            )
        })
        .collect()
}

fn print_perf(label: &str, unit: &str, elapsed: Duration, count: u64) {
    let secs = elapsed.as_secs_f64();

    println!("--------------------------------");
    println!("Mode        : {}", label);
    println!("Elapsed     : {:.3} s", secs);
    println!("{:<12}: {}", unit, fmt_count(count));
    println!(
        "{:<12}: {}",
        format!("{unit}/sec"),
        fmt_count((count as f64 / secs) as u64)
    );
    println!("--------------------------------\n");
}

fn fmt_bytes(b: u64) -> String {
    if b >= 1024 * 1024 * 1024 {
        format!("{:.2} GiB", b as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if b >= 1024 * 1024 {
        format!("{:.2} MiB", b as f64 / (1024.0 * 1024.0))
    } else if b >= 1024 {
        format!("{:.2} KiB", b as f64 / 1024.0)
    } else {
        format!("{} B", b)
    }
}

fn fmt_count(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);

    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
