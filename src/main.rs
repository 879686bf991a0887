// src/main.rs
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use futures::future::join_all;
use geomatch_lib::gazetteer::{load_gazetteer, GazetteerHandle};
use geomatch_lib::matching::{Deadline, LocationResolver, Unbounded};
use geomatch_lib::models::{ExtractionContext, ResolutionContext};
use geomatch_lib::utils::get_memory_usage;
use geomatch_lib::utils::progress_config::ProgressConfig;
use geomatch_lib::utils::resolver_config::ResolverConfig;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Resolve extracted place-name mentions and coordinates against a gazetteer.
#[derive(Parser, Debug)]
#[command(name = "geo_matching", version, about)]
struct Args {
    /// Gazetteer dump, one JSON place record per line
    #[arg(long)]
    gazetteer: PathBuf,

    /// Documents to resolve, one JSON extraction context per line
    #[arg(long)]
    documents: PathBuf,

    /// Where to write resolution results (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Documents resolved concurrently
    #[arg(long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Per-document refinement budget in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,
}

fn read_documents(path: &Path) -> Result<Vec<ExtractionContext>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open documents file {}", path.display()))?;
    let mut documents = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read document line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let document: ExtractionContext = serde_json::from_str(&line)
            .with_context(|| format!("Malformed extraction context on line {}", number + 1))?;
        documents.push(document);
    }
    Ok(documents)
}

fn resolve_document(
    resolver: &LocationResolver,
    document: &ExtractionContext,
    deadline_ms: Option<u64>,
) -> Result<ResolutionContext> {
    let result = match deadline_ms {
        Some(ms) => resolver.resolve_locations_with(document, &Deadline::after(Duration::from_millis(ms))),
        None => resolver.resolve_locations_with(document, &Unbounded),
    };
    result.context("Failed to resolve document")
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();
    let args = Args::parse();
    let started_at = Utc::now();
    info!("Starting gazetteer resolution run");

    let config = ResolverConfig::from_env();
    config.log_config();
    let progress_config = ProgressConfig::from_env();

    let load_start = Instant::now();
    let index = load_gazetteer(&args.gazetteer)?;
    info!(
        "Gazetteer fingerprint {} ({} places, {} containment cycles) loaded in {:.2?}",
        index.fingerprint(),
        index.len(),
        index.containment_cycles(),
        load_start.elapsed()
    );
    if progress_config.should_show_memory() {
        info!("Memory after gazetteer load: {} MB", get_memory_usage());
    }
    let handle = GazetteerHandle::new(index);
    let resolver = LocationResolver::new(handle, config);

    let documents = read_documents(&args.documents)?;
    info!("Loaded {} documents from {}", documents.len(), args.documents.display());

    let workers = args.workers.max(1);
    let pb = progress_config.create_bar(documents.len() as u64, "Resolving documents...");
    let mut results: Vec<ResolutionContext> = Vec::with_capacity(documents.len());

    for chunk in documents.chunks(workers) {
        let tasks = chunk.iter().cloned().map(|document| {
            let resolver = resolver.clone();
            let deadline_ms = args.deadline_ms;
            tokio::task::spawn_blocking(move || resolve_document(&resolver, &document, deadline_ms))
        });
        for joined in join_all(tasks).await {
            let resolved = joined.context("A resolution worker panicked")??;
            results.push(resolved);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = &pb {
            if progress_config.should_show_memory() {
                pb.set_message(format!("Resolving documents (Memory: {} MB)", get_memory_usage()));
            }
        }
    }
    if let Some(pb) = &pb {
        pb.finish_with_message("Resolution complete");
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for result in &results {
        serde_json::to_writer(&mut writer, result).context("Failed to serialize result")?;
        writer.write_all(b"\n").context("Failed to write result")?;
    }
    writer.flush().context("Failed to flush results")?;

    let resolved: usize = results
        .iter()
        .map(|r| r.locations.iter().filter(|l| l.is_resolved()).count())
        .sum();
    let mentions: usize = results.iter().map(|r| r.locations.len()).sum();
    let invalid: usize = results
        .iter()
        .map(|r| r.coordinates.iter().filter(|c| c.is_invalid()).count())
        .sum();
    let stopped_early = results.iter().filter(|r| r.stopped_early).count();

    info!("=== Resolution Summary ===");
    info!("Documents: {}", results.len());
    info!("Mentions resolved: {}", resolved);
    info!("Mentions unresolved: {}", mentions - resolved);
    info!("Invalid coordinates: {}", invalid);
    if stopped_early > 0 {
        warn!("{} document(s) stopped refining at their deadline", stopped_early);
    }
    let elapsed = Utc::now() - started_at;
    info!(
        "Total execution time: {:.2}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    if progress_config.should_show_memory() {
        info!("Final memory usage: {} MB", get_memory_usage());
    }

    info!("Resolution run completed successfully!");
    Ok(())
}
