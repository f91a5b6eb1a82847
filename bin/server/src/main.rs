//! Process entry point: configuration, tracing, backend client, router.

mod config;
mod error;
mod routes;

use config::ServerConfig;
use inner_circle_backend::BackendClient;
use inner_circle_gate::Gate;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment. The backend URL and key are
    // required; starting without them is a configuration error, not
    // something to handle per-request.
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let client = BackendClient::new(&config.backend).expect("failed to build backend client");
    let gate = Gate::from_client(client);

    let app = routes::router(gate).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!(addr = %config.listen_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install ctrl-c handler");
        })
        .await
        .expect("server error");
}
