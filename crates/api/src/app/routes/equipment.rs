use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, put},
};

use surgistock_core::EquipmentId;
use surgistock_inventory::{EquipmentFilter, EquipmentPatch, NewEquipment};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_equipment).post(create_equipment))
        .route("/:id", put(update_equipment).delete(delete_equipment))
        .route("/:id/status", patch(adjust_status))
}

pub async fn list_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListEquipmentQuery>,
) -> axum::response::Response {
    // A present-but-empty parameter (`?category=`) means "no filter", the
    // same as omitting it.
    let mut filter = EquipmentFilter {
        search: query.search.filter(|s| !s.is_empty()),
        ..Default::default()
    };
    if let Some(category) = query.category.filter(|s| !s.is_empty()) {
        filter.category = match category.parse() {
            Ok(c) => Some(c),
            Err(e) => return errors::domain_error_to_response(e),
        };
    }
    if let Some(status) = query.status.filter(|s| !s.is_empty()) {
        filter.status = match status.parse() {
            Ok(s) => Some(s),
            Err(e) => return errors::domain_error_to_response(e),
        };
    }

    match services.equipment.list(&filter) {
        Ok(records) => {
            let body: Vec<_> = records.iter().map(dto::equipment_response).collect();
            Json(body).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewEquipment>,
) -> axum::response::Response {
    match services.equipment.create(body) {
        Ok(record) => {
            (StatusCode::CREATED, Json(dto::equipment_response(&record))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<EquipmentPatch>,
) -> axum::response::Response {
    let id: EquipmentId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.equipment.update(id, &body) {
        Ok(record) => Json(dto::equipment_response(&record)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EquipmentId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.equipment.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn adjust_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStatusRequest>,
) -> axum::response::Response {
    let id: EquipmentId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.equipment.adjust_status(id, body.status, body.change) {
        Ok(record) => Json(dto::equipment_response(&record)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
