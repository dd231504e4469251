use code_engine_hook::actions::ShellActionRunner;
use code_engine_hook::api;
use code_engine_hook::code_engine::HttpCodeEngine;
use code_engine_hook::logging::{FileLogger, setup_logging};
use code_engine_hook::{AppState, Settings, parse_port};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{self, error, info};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger = settings.log_dir.clone().map(FileLogger::new);
    let _log_guard = setup_logging(settings.debug, file_logger.as_ref());

    let port = parse_port(std::env::args().skip(1));
    let bind_address = SocketAddr::from(([0, 0, 0, 0], port));

    let state = Arc::new(AppState {
        runner: Arc::new(ShellActionRunner::new(settings.action_timeout)),
        code_engine: Arc::new(HttpCodeEngine::new(settings.code_engine.clone())),
        settings,
    });

    info!("Using repository config at {:?}", state.settings.repos_json_path);
    info!("Uploading code from {:?}", state.settings.code_engine_file_path);
    if state.settings.use_proxy_fix {
        info!("Trusting X-Forwarded-For from reverse proxy");
    }

    let app = api::router(state);

    let listener = match tokio::net::TcpListener::bind(bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", bind_address);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
