//! CLI entry point for the download orchestrator.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use dlmux::engine::{ALL_ENGINES, detect_available_engines};
use dlmux::{
    Config, ControlChannel, Dispatcher, DownloadTask, Engine, ProgressTracker, ProviderKind,
    classify, validate,
};

mod cli;
mod ui;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if args.engines {
        print_engine_catalog();
        return Ok(());
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    let available = detect_available_engines(&search_path);

    if args.detect {
        if available.is_empty() {
            println!("no download engines installed");
        }
        for engine in &available {
            println!("{} ({})", engine.descriptor().name, engine.binary());
        }
        return Ok(());
    }

    if args.urls.is_empty() {
        info!("No URLs provided. Pass them as arguments.");
        info!("Example: dlmux https://example.com/file.zip");
        return Ok(());
    }

    let mut config = Config::default();
    if let Some(dir) = args.dir.clone() {
        config.download_dir = dir;
    }
    config.connections = args.connections;
    config.split = args.split;
    config.rpc_port = args.rpc_port;
    config.rpc_secret = args.rpc_secret.clone();

    // Advisory only: report the accelerator service when it is reachable.
    if let Some(channel) = ControlChannel::from_config(&config) {
        if let Some(version) = channel.engine_version().await {
            info!(version, "accelerator control channel reachable");
        }
    }

    let requested_engine = match args.engine.as_deref() {
        Some(name) => Some(name.parse::<Engine>()?),
        None => None,
    };

    let dispatcher = Dispatcher::new(config);
    let show_progress = !args.quiet;
    let mut completed = 0usize;
    let mut failed = 0usize;

    for url in &args.urls {
        let reason = validate(url)?;
        let provider = classify(url);
        debug!(url, reason, provider = %provider, "URL accepted");

        let engine = requested_engine.unwrap_or_else(|| auto_select(provider, &available));
        info!(url, engine = %engine, "starting download");

        // An explicit output name only makes sense for a single transfer.
        let output_name = if args.urls.len() == 1 {
            args.output.clone()
        } else {
            None
        };

        let mut task = DownloadTask::new(url.clone(), engine, output_name);
        let tracker = ProgressTracker::new(1);
        let bar = ui::attach_progress_bar(&tracker, show_progress);

        let ok = dispatcher.execute_with_tracker(&mut task, Some(&tracker)).await;
        bar.finish_and_clear();

        if ok {
            completed += 1;
            info!(url, progress = task.progress(), "download completed");
        } else {
            failed += 1;
            warn!(url, error = task.error().unwrap_or("unknown"), "download failed");
        }
    }

    info!(
        completed,
        failed,
        total = completed + failed,
        "all downloads processed"
    );

    if failed > 0 {
        anyhow::bail!("{failed} download(s) failed");
    }
    Ok(())
}

/// Picks an engine for a URL nobody chose one for: the provider-specific
/// tool for Mega links, otherwise the first installed general-purpose
/// engine, preferring the accelerator.
fn auto_select(provider: ProviderKind, available: &[Engine]) -> Engine {
    if provider == ProviderKind::Mega {
        return Engine::Mega;
    }
    [Engine::Aria2, Engine::Wget, Engine::Curl]
        .into_iter()
        .find(|engine| available.contains(engine))
        .unwrap_or(Engine::Aria2)
}

/// Renders the static engine catalog as plain terminal text.
fn print_engine_catalog() {
    for engine in ALL_ENGINES {
        let descriptor = engine.descriptor();
        println!("{} ({})", descriptor.name, engine.id());
        println!("  {}", descriptor.description);
        println!("  pros: {}", descriptor.pros.join(", "));
        println!("  cons: {}", descriptor.cons.join(", "));
        println!(
            "  max connections: {} | resume: {} | best for: {}",
            descriptor.max_connections,
            if descriptor.supports_resume { "yes" } else { "no" },
            descriptor.best_for
        );
        println!();
    }
}
