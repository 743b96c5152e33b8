use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    let routes = handler::build_route_table(&cfg.routing)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let state = Arc::new(config::AppState::new(cfg, routes));

    // Any error here (a taken port included) exits non-zero
    runtime.block_on(server::run(state)).map_err(|e| {
        logger::log_error(&e.to_string());
        e.into()
    })
}
