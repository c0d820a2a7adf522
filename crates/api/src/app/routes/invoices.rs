use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use surgistock_invoicing::{FinalizeError, InvoiceDraft};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(finalize_invoice).get(list_invoices))
}

pub async fn finalize_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<InvoiceDraft>,
) -> axum::response::Response {
    match services.finalizer.finalize(body) {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "invoice": invoice,
            })),
        )
            .into_response(),
        Err(FinalizeError::Rejected(e)) => errors::domain_error_to_response(e),
        // The invoice is durable; the caller reconciles the named items.
        Err(FinalizeError::Partial {
            invoice,
            deducted,
            failures,
        }) => {
            let failed: Vec<_> = failures
                .iter()
                .map(|f| {
                    json!({
                        "id": f.equipment_id,
                        "error": errors::error_code(&f.reason),
                        "message": f.reason.to_string(),
                    })
                })
                .collect();

            (
                StatusCode::MULTI_STATUS,
                Json(json!({
                    "success": false,
                    "error": "partial_deduction",
                    "message": "invoice saved but some stock deductions failed",
                    "invoice": invoice,
                    "deducted": deducted,
                    "failed": failed,
                })),
            )
                .into_response()
        }
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListInvoicesQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(dto::DEFAULT_INVOICE_LIMIT);
    match services.invoices.recent(limit) {
        Ok(invoices) => Json(invoices).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
