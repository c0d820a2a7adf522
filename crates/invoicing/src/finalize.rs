//! Turning a cart into a durable invoice plus the net stock deduction.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use surgistock_core::{DomainError, EquipmentId, InvoiceId};
use surgistock_inventory::EquipmentStore;

use crate::invoice::{Invoice, InvoiceDraft};
use crate::store::InvoiceStore;

/// One item whose stock deduction failed after the invoice was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionFailure {
    pub equipment_id: EquipmentId,
    pub reason: DomainError,
}

#[derive(Debug, Error)]
pub enum FinalizeError {
    /// Rejected before anything was persisted; safe to correct and resubmit.
    /// Includes a duplicate `invoiceNo` (`Conflict`), which is checked at the
    /// invoice commit so a retry can never deduct stock twice.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// The invoice committed but one or more deductions failed.
    ///
    /// The invoice is not rolled back (invoices are an append-only sales
    /// record); the caller reconciles stock manually using `failures`.
    #[error("invoice '{}' persisted but {} stock deduction(s) failed", invoice.invoice_no, failures.len())]
    Partial {
        invoice: Invoice,
        /// Items whose stock was successfully deducted.
        deducted: Vec<EquipmentId>,
        failures: Vec<DeductionFailure>,
    },
}

/// Finalizes invoices against the equipment ledger.
pub struct Finalizer {
    equipment: Arc<dyn EquipmentStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl Finalizer {
    pub fn new(equipment: Arc<dyn EquipmentStore>, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self {
            equipment,
            invoices,
        }
    }

    /// Validate, persist the invoice (the durability point), then deduct
    /// stock item by item.
    ///
    /// Each item's deduction is one atomic record update; the items are
    /// otherwise independent — a failure neither blocks nor rolls back the
    /// others. This is deliberate best-effort, not a two-phase commit.
    pub fn finalize(&self, draft: InvoiceDraft) -> Result<Invoice, FinalizeError> {
        draft.validate()?;

        let invoice = Invoice::from_draft(draft, InvoiceId::new(), Utc::now());
        self.invoices.append(invoice.clone())?;
        tracing::info!(
            invoice_no = %invoice.invoice_no,
            items = invoice.items.len(),
            total = invoice.total,
            "invoice persisted"
        );

        let mut deducted = Vec::new();
        let mut failures = Vec::new();
        for item in &invoice.items {
            match self.equipment.deduct_sold(item.equipment_id, item.qty) {
                Ok(_) => deducted.push(item.equipment_id),
                Err(reason) => failures.push(DeductionFailure {
                    equipment_id: item.equipment_id,
                    reason,
                }),
            }
        }

        if failures.is_empty() {
            Ok(invoice)
        } else {
            tracing::warn!(
                invoice_no = %invoice.invoice_no,
                failed = failures.len(),
                "invoice persisted with failed stock deductions"
            );
            Err(FinalizeError::Partial {
                invoice,
                deducted,
                failures,
            })
        }
    }
}
