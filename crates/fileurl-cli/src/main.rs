//! fileurl CLI - One-shot file and URL analysis
//!
//! Runs a single analysis and prints the result as pretty JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fileurl_core::{analyze_path, AnalyzerConfig, Fetcher};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fileurl")]
#[command(about = "Analyze a local path or a remote URL", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Size ceiling in bytes for local files (overrides MAX_FILE_SIZE)
    #[arg(long, global = true)]
    max_file_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a file, or every file under a directory
    Path {
        /// File or directory to analyze
        path: PathBuf,
    },

    /// Fetch a URL and analyze its body
    Url {
        /// http or https URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = AnalyzerConfig::from_env();
    if let Some(bytes) = cli.max_file_size {
        config = config.with_max_file_size(bytes);
    }

    let failed = match cli.command {
        Command::Path { path } => {
            tracing::info!("Analyzing path: {}", path.display());
            let analysis = analyze_path(&path, config.max_file_size).await;
            print_json(&analysis)?;
            analysis.error_message().is_some()
        }
        Command::Url { url } => {
            tracing::info!("Analyzing URL: {}", url);
            let fetcher = Fetcher::new(&config);
            let analysis = fetcher.fetch_and_classify(&url, config.max_url_size).await;
            print_json(&analysis)?;
            analysis.is_error()
        }
    };

    Ok(if failed {
        tracing::warn!("Analysis reported an error");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
