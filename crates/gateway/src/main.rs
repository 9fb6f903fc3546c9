use mendline_gateway::GatewayConfig;

#[tokio::main]
async fn main() {
    mendline_observability::init("info");

    let config = GatewayConfig::from_env();
    let port = config.port;

    let app = mendline_gateway::build_app(config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind 0.0.0.0:{port}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
