use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod context;
mod exec;
mod fallback;
mod llm;
mod pipeline;
mod util;
mod web;

use crate::config::{AppConfig, CliArgs};
use crate::context::QueryContext;
use crate::llm::SqlTranslator;
use crate::pipeline::QueryPipeline;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Static prompt context, built once and shared read-only
    let ctx = QueryContext::seed();

    info!("Initializing SQL translator with backend: {}", config.llm.backend);
    let translator = SqlTranslator::new(&config.llm)?;

    // Live executor when Supabase credentials are present, mock otherwise
    let executor = exec::build_executor(&config.database);

    let pipeline = QueryPipeline::new(translator, executor, ctx);
    let app_state = Arc::new(AppState::new(config.clone(), pipeline));

    // Start the web server
    info!(
        "Starting text2query server on {}:{}",
        config.web.host, config.web.port
    );
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(std::io::Error::other(e.to_string()).into());
        }
    }

    Ok(())
}
