use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use plan_catalog::{IngestConfig, PlanCatalogService, QuoteConfig};

#[derive(Parser, Debug)]
#[command(name = "plan-catalog", version)]
#[command(about = "Ingest a region's plan, rate and factor documents into a quoting catalog")]
struct Args {
    /// Directory holding one subdirectory per region
    root: PathBuf,

    /// Region to ingest, e.g. `ma`
    region: String,

    /// Write the resulting catalog to this JSON file
    snapshot: Option<PathBuf>,

    /// Parse the files of each stage one at a time
    #[arg(long)]
    sequential: bool,

    /// Worker threads for parallel parsing (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Draw a progress bar per stage
    #[arg(long)]
    progress: bool,
}

impl Args {
    fn ingest_config(&self) -> IngestConfig {
        let mut config = IngestConfig {
            parallel_files: !self.sequential,
            show_progress: self.progress,
            ..IngestConfig::default()
        };
        if let Some(workers) = self.workers {
            config.worker_threads = workers;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let service = PlanCatalogService::new(args.ingest_config(), QuoteConfig::default());

    let start = Instant::now();
    let summary = service
        .ingest_region_async(args.root.clone(), args.region.clone())
        .await
        .with_context(|| {
            format!(
                "ingesting region '{}' under {}",
                args.region,
                args.root.display()
            )
        })?;

    if !summary.is_clean() {
        warn!(
            "{} records failed during ingestion of '{}'",
            summary.failures().count(),
            args.region
        );
    }
    info!("{}", service.stats()?);

    if let Some(path) = &args.snapshot {
        service
            .write_snapshot(path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
    }

    info!("Finished in {:?}", start.elapsed());
    Ok(())
}
