mod cli;
mod logger;

use anyhow::Context;
use bookshelf_core::{Catalog, Server, ServerConfig};
use clap::Parser;
use cli::Args;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose, args.log_format);

    let config = args.server_config();
    config.validate().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let catalog = Catalog::fixtures(config.catalog_layout).context("failed to build catalog")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(run(config, Arc::new(catalog)))
}

async fn run(config: ServerConfig, catalog: Arc<Catalog>) -> anyhow::Result<()> {
    let server = Server::new(config, catalog)?;
    let listener = server
        .bind()
        .with_context(|| format!("failed to bind {}:{}", server.config().hostname, server.config().port))?;

    server.serve(listener, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
