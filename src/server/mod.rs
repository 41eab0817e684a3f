//! Mock data REST backend
//!
//! Serves the investments and recommendations collections the dashboard
//! consumes while the real platform services are offline. State is seeded
//! in memory and reset on restart.

use axum::{
    Router,
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod routes;

use routes::{Investment, Recommendation};

/// Server state: mock collections plus their id counters
pub struct AppState {
    pub investments: RwLock<Collection<Investment>>,
    pub recommendations: RwLock<Collection<Recommendation>>,
}

/// A mock resource collection with server-assigned ids
pub struct Collection<T> {
    pub rows: Vec<T>,
    next: i64,
}

impl<T> Collection<T> {
    pub fn new(rows: Vec<T>, next: i64) -> Self {
        Self { rows, next }
    }

    /// Hand out the next id. Ids are never reused after a delete.
    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl AppState {
    /// State seeded with the stock mock rows
    pub fn seeded() -> Self {
        Self {
            investments: RwLock::new(Collection::new(Investment::seed(), 3)),
            recommendations: RwLock::new(Collection::new(Recommendation::seed(), 3)),
        }
    }
}

/// Run the mock data API on the given port until shutdown
pub async fn start_server(port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::seeded());

    let app = Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/v1/investments",
            get(routes::list_investments).post(routes::create_investment),
        )
        .route(
            "/api/v1/investments/{id}",
            get(routes::get_investment)
                .put(routes::update_investment)
                .delete(routes::delete_investment),
        )
        .route(
            "/api/v1/recommendations",
            get(routes::list_recommendations).post(routes::create_recommendation),
        )
        .route(
            "/api/v1/recommendations/{id}",
            get(routes::get_recommendation)
                .put(routes::update_recommendation)
                .delete(routes::delete_recommendation),
        )
        .fallback_service(ServeDir::new("ui/dist"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting mock data API on {}", addr);
    println!("🌍 Mock data API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
