use std::net::SocketAddr;
use std::sync::Arc;

use provia_api::{app, state::AppState};
use provia_store::{
    DbClient, EventBus, PgBuyerDirectory, PgCatalogStore, PgOrderRepository,
    PgRequisitionRepository, PgStockRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provia_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = provia_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Provia API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let app_state = AppState {
        stock_repo: Arc::new(PgStockRepository::new(db.pool.clone())),
        order_repo: Arc::new(PgOrderRepository::new(db.pool.clone())),
        requisition_repo: Arc::new(PgRequisitionRepository::new(db.pool.clone())),
        catalogs: Arc::new(PgCatalogStore::new(db.pool.clone())),
        buyers: Arc::new(PgBuyerDirectory::new(db.pool.clone())),
        events: EventBus::default(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
