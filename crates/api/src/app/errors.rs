use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use surgistock_core::DomainError;

/// Stable machine-readable code for a domain error.
pub fn error_code(err: &DomainError) -> &'static str {
    match err {
        DomainError::Validation(_) => "validation_error",
        DomainError::InvariantViolation(_) => "invariant_violation",
        DomainError::StatusMismatch { .. } => "status_mismatch",
        DomainError::InvalidId(_) => "invalid_id",
        DomainError::NotFound => "not_found",
        DomainError::Conflict(_) => "conflict",
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = error_code(&err);
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, code, msg)
        }
        // Carries both computed totals so the client can offer to auto-sync
        // the available count.
        DomainError::StatusMismatch {
            status_total,
            quantity,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": code,
                "message": err.to_string(),
                "statusTotal": status_total,
                "quantity": quantity,
            })),
        )
            .into_response(),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, code, "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, code, msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
