use std::sync::Arc;

use args::Args;
use clap::Parser;
use funnel_core::{Engine, FunnelServer};
use rmcp::{ServiceExt, transport::stdio};

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args);

    let config = args.config()?;
    let engine = Arc::new(Engine::initialize(&config, commands::all()).await?);
    let server = FunnelServer::new(engine);

    log::info!("funnel is ready, serving over stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

/// The set of in-process command plugins this build ships. Currently empty;
/// a real deployment would register its own [`funnel_core::command::Command`]
/// implementations here.
mod commands {
    use std::sync::Arc;

    use funnel_core::command::Command;

    pub fn all() -> Vec<Arc<dyn Command>> {
        Vec::new()
    }
}
