//! fileurl MCP Server - Binary entry point
//!
//! Speaks JSON-RPC on stdin/stdout; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use fileurl_core::AnalyzerConfig;
use fileurl_mcp::{MCPServer, NoteStore, ServerConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fileurl-mcp")]
#[command(about = "MCP server that analyzes local files and remote URLs", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Size ceiling in bytes for local files (overrides MAX_FILE_SIZE)
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let mut analyzer = AnalyzerConfig::from_env();
    if let Some(bytes) = cli.max_file_size {
        analyzer = analyzer.with_max_file_size(bytes);
    }

    tracing::info!("Starting fileurl MCP server");
    tracing::info!("  Max file size: {} bytes", analyzer.max_file_size);
    tracing::info!("  Fetch timeout: {:?}", analyzer.fetch_timeout);

    let server = MCPServer::new(ServerConfig { analyzer }, Arc::new(NoteStore::new()));
    server.listen_stdio().await?;

    Ok(())
}
