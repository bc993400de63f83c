use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use ytgrab::cli::{Cli, Commands};
use ytgrab::core::{config, init_logger};
use ytgrab::download::{CoordinatorConfig, DownloadCoordinator, MediaInfo, ShutdownMode, YtDlpSource};

/// Entry point for the local ytgrab harness
///
/// Parses CLI arguments, builds a coordinator backed by yt-dlp and runs the
/// requested command.
///
/// # Errors
/// Returns an error if logging cannot be initialized or the command fails.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env before any config static is read
    let _ = dotenv();

    let cli = Cli::parse_args();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    let mut coordinator_config = CoordinatorConfig::from_env();
    if let Some(workers) = cli.workers {
        coordinator_config = coordinator_config.with_workers(workers);
    }
    if let Some(output) = cli.output.as_deref() {
        coordinator_config = coordinator_config.with_output_dir(config::expand_path(output));
    }

    let coordinator = DownloadCoordinator::new(Arc::new(YtDlpSource::new()), coordinator_config);

    let outcome = match cli.command {
        Commands::Info { url, json } => run_info(&coordinator, &url, json).await,
        Commands::Download {
            url,
            format_id,
            requester,
        } => run_download(&coordinator, &url, &format_id, requester).await,
    };

    coordinator.shutdown(ShutdownMode::Drain).await;
    outcome
}

async fn run_info(coordinator: &DownloadCoordinator, url: &str, json: bool) -> Result<()> {
    let info = coordinator
        .fetch_info(url)
        .await
        .map_err(|e| anyhow::anyhow!("No downloadable video found at {}: {}", url, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(&info);
    }
    Ok(())
}

fn print_info(info: &MediaInfo) {
    println!("Title: {}", info.title);
    println!("Duration: {}", info.duration_display());
    println!("Renditions:");
    for row in info.renditions.rows(config::selection::ROW_WIDTH) {
        let cells: Vec<String> = row
            .iter()
            .map(|d| format!("{} [{}]", d.button_caption(), d.format_id))
            .collect();
        println!("  {}", cells.join("   "));
    }
}

async fn run_download(coordinator: &DownloadCoordinator, url: &str, format_id: &str, requester: String) -> Result<()> {
    log::info!("Downloading {} format {} for {}", url, format_id, requester);
    let path = coordinator
        .download_rendition(url, format_id, requester)
        .await
        .map_err(|e| anyhow::anyhow!("Download failed: {}", e))?;
    println!("{}", path.display());
    Ok(())
}
