use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ratewatch::{Collector, Emitter, FileSource, PollSource, Settings, StreamSource};

/// Stream sources are drained at this pace regardless of `--refresh`
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "ratewatch")]
#[command(about = "Enrich polled cluster statistics with rates and latencies")]
#[command(group(ArgGroup::new("input").required(true).args(["file", "replay", "stdin"])))]
struct Args {
    /// Settings file (TOML); missing is fine
    #[arg(short, long, default_value = "ratewatch.toml")]
    config: PathBuf,

    /// JSON file holding one poll, re-read whenever it changes
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Newline-delimited JSON polls to replay, then exit
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Read newline-delimited JSON polls from stdin
    #[arg(long)]
    stdin: bool,

    /// Monitored target name (overrides settings)
    #[arg(short, long)]
    target: Option<String>,

    /// File check interval, e.g. "500ms", "2s" (overrides settings)
    #[arg(short, long)]
    refresh: Option<String>,

    /// Write enriched JSON lines here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut settings = Settings::load(&args.config)?;
    if let Some(target) = args.target.clone() {
        settings.target = target;
    }
    if let Some(refresh) = args.refresh.clone() {
        settings.refresh = refresh;
    }

    let rules = settings.rule_set()?;
    let refresh = settings.refresh_interval()?;
    info!(
        rules = rules.len(),
        target_name = %settings.target,
        "starting ratewatch"
    );

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let mut emitter = Emitter::new(writer);
    let collector = Collector::new(rules);

    // Build a tokio runtime for the stream sources and the refresh timer
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let (source, interval): (Box<dyn PollSource>, Duration) = if let Some(path) = &args.file {
            (Box::new(FileSource::new(path)), refresh)
        } else if let Some(path) = &args.replay {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let source = StreamSource::spawn(file, &path.display().to_string());
            (Box::new(source), STREAM_POLL_INTERVAL)
        } else {
            let source = StreamSource::spawn(tokio::io::stdin(), "stdin");
            (Box::new(source), STREAM_POLL_INTERVAL)
        };

        run(source, &collector, &mut emitter, &settings.target, interval).await
    })?;

    info!(lines = emitter.written(), "ratewatch stopped");
    Ok(())
}

/// Feed every poll from the source through the collector until the source
/// is exhausted or the process is interrupted.
async fn run<W: Write>(
    mut source: Box<dyn PollSource>,
    collector: &Collector,
    emitter: &mut Emitter<W>,
    target: &str,
    interval: Duration,
) -> Result<()> {
    info!(source = source.description(), "reading polls");

    let mut ticker = tokio::time::interval(interval);
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }

        while let Some(poll) = source.poll() {
            let enriched = collector.process(target, poll);
            emitter.emit(&enriched)?;
        }

        // Only log an error when it changes
        let error = source.error();
        if error != last_error {
            if let Some(message) = &error {
                warn!(source = source.description(), error = %message, "source error");
            }
            last_error = error;
        }

        if source.is_exhausted() {
            info!(source = source.description(), "source exhausted");
            break;
        }
    }

    Ok(())
}
