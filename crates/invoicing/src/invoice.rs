use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use surgistock_core::{DomainError, DomainResult, EquipmentId, InvoiceId};

/// One invoice line: a snapshot of the equipment at sale time.
///
/// `id` references the equipment record that was sold, but invoices stay
/// valid historical records even after that record is edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[serde(rename = "id")]
    pub equipment_id: EquipmentId,
    pub name: String,
    pub qty: i64,
    /// Price in smallest currency unit (paise).
    pub unit_price: u64,
    pub amount: u64,
}

/// Caller-supplied invoice content, validated before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub invoice_no: String,
    pub date: String,
    pub due_date: String,
    #[serde(default)]
    pub bill_to: String,
    #[serde(default)]
    pub bill_address: String,
    #[serde(default)]
    pub ship_to: String,
    #[serde(default)]
    pub ship_address: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: u64,
    pub gst: u64,
    pub total: u64,
}

impl InvoiceDraft {
    /// Validate line math and totals with exact integer arithmetic.
    pub fn validate(&self) -> DomainResult<()> {
        if self.invoice_no.trim().is_empty() {
            return Err(DomainError::validation("invoiceNo cannot be empty"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("invoice must contain at least one item"));
        }

        let mut computed_subtotal: u64 = 0;
        for item in &self.items {
            if item.qty <= 0 {
                return Err(DomainError::validation(format!(
                    "item '{}' has non-positive qty",
                    item.name
                )));
            }
            let expected_amount = (item.qty as u64)
                .checked_mul(item.unit_price)
                .ok_or_else(|| DomainError::validation("line amount overflows"))?;
            if item.amount != expected_amount {
                return Err(DomainError::validation(format!(
                    "item '{}' amount {} does not equal qty * unitPrice ({})",
                    item.name, item.amount, expected_amount
                )));
            }
            computed_subtotal = computed_subtotal
                .checked_add(expected_amount)
                .ok_or_else(|| DomainError::validation("subtotal overflows"))?;
        }

        if self.subtotal != computed_subtotal {
            return Err(DomainError::validation(format!(
                "subtotal {} does not equal sum of line amounts ({computed_subtotal})",
                self.subtotal
            )));
        }
        let expected_total = self
            .subtotal
            .checked_add(self.gst)
            .ok_or_else(|| DomainError::validation("total overflows"))?;
        if self.total != expected_total {
            return Err(DomainError::validation(format!(
                "total {} does not equal subtotal + gst ({expected_total})",
                self.total
            )));
        }

        Ok(())
    }
}

/// A finalized invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_no: String,
    pub date: String,
    pub due_date: String,
    pub bill_to: String,
    pub bill_address: String,
    pub ship_to: String,
    pub ship_address: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: u64,
    pub gst: u64,
    pub total: u64,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn from_draft(draft: InvoiceDraft, id: InvoiceId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            invoice_no: draft.invoice_no,
            date: draft.date,
            due_date: draft.due_date,
            bill_to: draft.bill_to,
            bill_address: draft.bill_address,
            ship_to: draft.ship_to,
            ship_address: draft.ship_address,
            items: draft.items,
            subtotal: draft.subtotal,
            gst: draft.gst,
            total: draft.total,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(name: &str, qty: i64, unit_price: u64) -> InvoiceItem {
        InvoiceItem {
            equipment_id: EquipmentId::new(),
            name: name.to_string(),
            qty,
            unit_price,
            amount: (qty.max(0) as u64) * unit_price,
        }
    }

    fn draft(items: Vec<InvoiceItem>, gst: u64) -> InvoiceDraft {
        let subtotal: u64 = items.iter().map(|i| i.amount).sum();
        InvoiceDraft {
            invoice_no: "GTSAL000123".to_string(),
            date: "2025-04-01".to_string(),
            due_date: "2025-04-15".to_string(),
            bill_to: "City Hospital".to_string(),
            bill_address: String::new(),
            ship_to: String::new(),
            ship_address: String::new(),
            items,
            subtotal,
            gst,
            total: subtotal + gst,
        }
    }

    #[test]
    fn consistent_draft_validates() {
        draft(vec![item("Scalpel", 2, 100), item("Gauze", 5, 20)], 15)
            .validate()
            .unwrap();
    }

    #[test]
    fn empty_items_rejected() {
        let err = draft(vec![], 0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_qty_rejected() {
        let err = draft(vec![item("Scalpel", 0, 100)], 0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn tampered_totals_rejected() {
        let mut bad_amount = draft(vec![item("Scalpel", 2, 100)], 10);
        bad_amount.items[0].amount += 1;
        bad_amount.subtotal += 1;
        bad_amount.total += 1;
        assert!(bad_amount.validate().is_err());

        let mut bad_subtotal = draft(vec![item("Scalpel", 2, 100)], 10);
        bad_subtotal.subtotal += 1;
        assert!(bad_subtotal.validate().is_err());

        let mut bad_total = draft(vec![item("Scalpel", 2, 100)], 10);
        bad_total.total += 1;
        assert!(bad_total.validate().is_err());
    }

    proptest! {
        #[test]
        fn totals_built_from_lines_always_validate(
            lines in proptest::collection::vec((1i64..50, 1u64..100_000), 1..10),
            gst in 0u64..1_000_000,
        ) {
            let items: Vec<InvoiceItem> = lines
                .into_iter()
                .enumerate()
                .map(|(i, (qty, unit_price))| item(&format!("Line {i}"), qty, unit_price))
                .collect();
            prop_assert!(draft(items, gst).validate().is_ok());
        }
    }
}
