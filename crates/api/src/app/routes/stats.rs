use std::sync::Arc;

use axum::{Json, Router, extract::Extension, response::IntoResponse, routing::get};

use surgistock_inventory::stats;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/summary", get(summary))
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match stats::summarize(services.equipment.as_ref()) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
