use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use surgistock_core::{DomainError, DomainResult, EquipmentId};

/// Fixed category set for surgical inventory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Instruments,
    Consumables,
    Diagnostic,
    Furniture,
    Electronics,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Instruments,
        Category::Consumables,
        Category::Diagnostic,
        Category::Furniture,
        Category::Electronics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Instruments => "Instruments",
            Category::Consumables => "Consumables",
            Category::Diagnostic => "Diagnostic",
            Category::Furniture => "Furniture",
            Category::Electronics => "Electronics",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Instruments" => Ok(Category::Instruments),
            "Consumables" => Ok(Category::Consumables),
            "Diagnostic" => Ok(Category::Diagnostic),
            "Furniture" => Ok(Category::Furniture),
            "Electronics" => Ok(Category::Electronics),
            other => Err(DomainError::validation(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

/// One of the three status buckets units are tracked under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Available,
    InUse,
    Maintenance,
}

impl core::str::FromStr for StatusBucket {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(StatusBucket::Available),
            "in_use" => Ok(StatusBucket::InUse),
            "maintenance" => Ok(StatusBucket::Maintenance),
            other => Err(DomainError::validation(format!(
                "unknown status bucket '{other}'"
            ))),
        }
    }
}

/// Per-status unit counts.
///
/// Invariant I1 (enforced at the record level, not here):
/// `available + in_use + maintenance == quantity`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub available: i64,
    pub in_use: i64,
    pub maintenance: i64,
}

impl StatusCounts {
    /// Counts for a freshly created record: everything available.
    pub fn all_available(quantity: i64) -> Self {
        Self {
            available: quantity,
            in_use: 0,
            maintenance: 0,
        }
    }

    /// Sum of the three buckets; `None` when the sum overflows `i64`.
    pub fn total(&self) -> Option<i64> {
        self.available
            .checked_add(self.in_use)?
            .checked_add(self.maintenance)
    }

    pub fn bucket(&self, bucket: StatusBucket) -> i64 {
        match bucket {
            StatusBucket::Available => self.available,
            StatusBucket::InUse => self.in_use,
            StatusBucket::Maintenance => self.maintenance,
        }
    }

    pub fn bucket_mut(&mut self, bucket: StatusBucket) -> &mut i64 {
        match bucket {
            StatusBucket::Available => &mut self.available,
            StatusBucket::InUse => &mut self.in_use,
            StatusBucket::Maintenance => &mut self.maintenance,
        }
    }
}

/// One inventory line item and its stock counts.
///
/// Monetary amounts are integer minor currency units (paise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRecord {
    pub id: EquipmentId,
    pub name: String,
    pub category: Category,
    /// Display unit code (e.g. "UNT", "PCS", "BOX").
    pub unit: String,
    pub hsn_code: String,
    pub quantity: i64,
    pub cost_per_unit: u64,
    pub status_counts: StatusCounts,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EquipmentRecord {
    /// Derived, never stored: `quantity * costPerUnit`.
    pub fn total_cost(&self) -> u64 {
        (self.quantity.max(0) as u64).saturating_mul(self.cost_per_unit)
    }

    /// Check the record-level stock invariants (quantity and buckets
    /// non-negative, I1 sum).
    pub fn check_stock_invariants(&self) -> DomainResult<()> {
        check_stock(self.quantity, &self.status_counts)
    }
}

fn check_stock(quantity: i64, counts: &StatusCounts) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    if counts.available < 0 || counts.in_use < 0 || counts.maintenance < 0 {
        return Err(DomainError::validation("status counts cannot be negative"));
    }
    let total = counts
        .total()
        .ok_or_else(|| DomainError::validation("status counts overflow"))?;
    if total != quantity {
        return Err(DomainError::status_mismatch(total, quantity));
    }
    Ok(())
}

/// Fields supplied when creating a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    pub name: String,
    pub category: Category,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub hsn_code: String,
    pub quantity: i64,
    pub cost_per_unit: u64,
    /// Defaults to `available = quantity` when omitted.
    #[serde(default)]
    pub status_counts: Option<StatusCounts>,
    #[serde(default)]
    pub notes: String,
}

fn default_unit() -> String {
    "UNT".to_string()
}

impl NewEquipment {
    /// Validate and build the record. Fails without side effects.
    pub fn into_record(self, id: EquipmentId, now: DateTime<Utc>) -> DomainResult<EquipmentRecord> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let status_counts = self
            .status_counts
            .unwrap_or_else(|| StatusCounts::all_available(self.quantity));
        check_stock(self.quantity, &status_counts)?;

        Ok(EquipmentRecord {
            id,
            name: self.name,
            category: self.category,
            unit: self.unit,
            hsn_code: self.hsn_code,
            quantity: self.quantity,
            cost_per_unit: self.cost_per_unit,
            status_counts,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update; absent fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub unit: Option<String>,
    pub hsn_code: Option<String>,
    pub quantity: Option<i64>,
    pub cost_per_unit: Option<u64>,
    pub status_counts: Option<StatusCounts>,
    pub notes: Option<String>,
}

impl EquipmentPatch {
    /// Merge onto `record` and re-validate the *merged* result.
    ///
    /// On failure the original record is untouched; an I1 violation surfaces
    /// as `StatusMismatch` carrying both computed totals.
    pub fn apply_to(
        &self,
        record: &EquipmentRecord,
        now: DateTime<Utc>,
    ) -> DomainResult<EquipmentRecord> {
        let mut merged = record.clone();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            merged.name = name.clone();
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(unit) = &self.unit {
            merged.unit = unit.clone();
        }
        if let Some(hsn_code) = &self.hsn_code {
            merged.hsn_code = hsn_code.clone();
        }
        if let Some(quantity) = self.quantity {
            merged.quantity = quantity;
        }
        if let Some(cost_per_unit) = self.cost_per_unit {
            merged.cost_per_unit = cost_per_unit;
        }
        if let Some(status_counts) = self.status_counts {
            merged.status_counts = status_counts;
        }
        if let Some(notes) = &self.notes {
            merged.notes = notes.clone();
        }

        merged.check_stock_invariants()?;
        merged.updated_at = now;
        Ok(merged)
    }
}
