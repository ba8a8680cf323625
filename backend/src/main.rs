use backend::{app, AppState, FileRoster, FileStore};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let roster_path = env::var("ROSTER_PATH").unwrap_or_else(|_| "roster.json".to_string());
    let mapping_path = env::var("MAPPING_PATH").unwrap_or_else(|_| "mapped.json".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let state = AppState::new(
        Arc::new(FileRoster::new(roster_path)),
        Arc::new(FileStore::new(mapping_path)),
    );

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "starting lottery server");
    axum::serve(
        tokio::net::TcpListener::bind(&addr).await.expect("bind"),
        app(state),
    )
    .await
    .expect("server error");
}
