use anyhow::Result;
use axum::Router;
use clap::Parser;
use mdsearch_core::config::LoaderConfig;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use mdsearch_server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Corpus root directory
    #[arg(long, default_value = ".")]
    root: String,
    /// File extensions to index (repeatable, defaults to md and mdx)
    #[arg(long = "ext")]
    extensions: Vec<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let mut loader = LoaderConfig::new(&args.root);
    if !args.extensions.is_empty() {
        loader = loader.with_extensions(&args.extensions);
    }
    let app: Router = build_app(loader)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, root = %args.root, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
