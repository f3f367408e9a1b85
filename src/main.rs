use anyhow::Result;
use clap::Parser;
use csv_ingest::{cli::Args, IngestConfig, Ingestor, Session};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) parse args before touching any file or catalog ──────────
    let args = Args::parse();

    // ─── 2) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 3) open the session and ingest on the blocking pool ─────────
    let config = IngestConfig::default();
    let dataset = args.input_file;
    info!(dataset = %dataset, data_root = %config.data_root.display(), "startup");

    let start = Instant::now();
    let report = tokio::task::spawn_blocking(move || {
        let session = Session::from_config(&config);
        Ingestor::new(&session, &config).run(&dataset)
    })
    .await??;

    info!(
        table = %report.table,
        rows = report.rows,
        columns = ?report.columns,
        elapsed = ?start.elapsed(),
        "all done"
    );
    Ok(())
}
