use std::sync::Arc;

use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod upstream;

use upstream::{CompletionClient, GroqClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Without a key every relay call would fail, so refuse to start
    let api_key = cfg.resolve_api_key()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, api_key))
}

async fn async_main(cfg: config::Config, api_key: String) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::bind_listener(addr)?;

    let upstream: Arc<dyn CompletionClient> = Arc::new(GroqClient::new(&cfg.upstream, api_key)?);

    logger::log_server_start(&addr, &cfg);
    let state = Arc::new(config::AppState::new(cfg, upstream));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    server::serve(listener, state, shutdown).await;

    logger::log_shutdown();
    Ok(())
}
