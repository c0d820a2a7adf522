use axum::Router;

pub mod equipment;
pub mod invoices;
pub mod stats;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/equipment", equipment::router())
        .nest("/invoice", invoices::router())
        .nest("/stats", stats::router())
}
