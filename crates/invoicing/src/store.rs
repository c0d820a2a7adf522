//! Append-only invoice storage.

use std::sync::{Arc, RwLock};

use surgistock_core::{DomainError, DomainResult};

use crate::invoice::Invoice;

/// Durable record of finalized invoices.
///
/// Invoices are append-only; nothing edits or deletes them. `invoiceNo` is
/// unique — appending a duplicate fails with `Conflict` so a retried
/// finalization cannot create a second invoice (and deduct stock twice).
pub trait InvoiceStore: Send + Sync {
    fn append(&self, invoice: Invoice) -> DomainResult<()>;

    /// Most recent invoices, newest first.
    fn recent(&self, limit: usize) -> DomainResult<Vec<Invoice>>;
}

/// In-memory `InvoiceStore`.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<Vec<Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn append(&self, invoice: Invoice) -> DomainResult<()> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;
        if invoices.iter().any(|i| i.invoice_no == invoice.invoice_no) {
            return Err(DomainError::conflict(format!(
                "invoice '{}' already exists",
                invoice.invoice_no
            )));
        }
        invoices.push(invoice);
        Ok(())
    }

    fn recent(&self, limit: usize) -> DomainResult<Vec<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;
        Ok(invoices.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceDraft;
    use chrono::Utc;
    use surgistock_core::InvoiceId;

    fn invoice(invoice_no: &str) -> Invoice {
        Invoice::from_draft(
            InvoiceDraft {
                invoice_no: invoice_no.to_string(),
                date: "2025-04-01".to_string(),
                due_date: "2025-04-15".to_string(),
                bill_to: String::new(),
                bill_address: String::new(),
                ship_to: String::new(),
                ship_address: String::new(),
                items: Vec::new(),
                subtotal: 0,
                gst: 0,
                total: 0,
            },
            InvoiceId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let store = InMemoryInvoiceStore::new();
        for i in 0..5 {
            store.append(invoice(&format!("INV-{i}"))).unwrap();
        }

        let recent = store.recent(3).unwrap();
        let numbers: Vec<_> = recent.iter().map(|i| i.invoice_no.as_str()).collect();
        assert_eq!(numbers, ["INV-4", "INV-3", "INV-2"]);
    }

    #[test]
    fn duplicate_invoice_no_rejected() {
        let store = InMemoryInvoiceStore::new();
        store.append(invoice("INV-7")).unwrap();

        let err = store.append(invoice("INV-7")).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let remaining = store.recent(10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].invoice_no, "INV-7");
    }
}
