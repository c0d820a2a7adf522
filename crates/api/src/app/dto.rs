use serde::Deserialize;
use serde_json::json;

use surgistock_inventory::{EquipmentRecord, StatusBucket};

// -------------------------
// Request DTOs
// -------------------------

/// Query string for `GET /equipment`. Values are parsed (and rejected with
/// 400) in the handler so unknown categories/statuses are loud, not ignored.
#[derive(Debug, Deserialize)]
pub struct ListEquipmentQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Body of `PATCH /equipment/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct AdjustStatusRequest {
    pub status: StatusBucket,
    pub change: i64,
}

/// Query string for `GET /invoice`.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub limit: Option<usize>,
}

pub const DEFAULT_INVOICE_LIMIT: usize = 10;

// -------------------------
// Response mapping
// -------------------------

/// Equipment record plus the derived `totalCost` (never stored).
pub fn equipment_response(record: &EquipmentRecord) -> serde_json::Value {
    json!({
        "id": record.id,
        "name": record.name,
        "category": record.category,
        "unit": record.unit,
        "hsnCode": record.hsn_code,
        "quantity": record.quantity,
        "costPerUnit": record.cost_per_unit,
        "statusCounts": record.status_counts,
        "notes": record.notes,
        "totalCost": record.total_cost(),
        "createdAt": record.created_at,
        "updatedAt": record.updated_at,
    })
}
