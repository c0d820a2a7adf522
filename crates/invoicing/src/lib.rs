//! Invoicing domain module: durable sales records and finalization.
//!
//! `finalize` is the one operation with partial-failure semantics in the
//! system: the invoice commit is the durability point, and the per-item stock
//! deduction that follows is best-effort. A failed deduction never rolls the
//! invoice back; it surfaces as [`FinalizeError::Partial`] with enough detail
//! for manual reconciliation.

pub mod finalize;
pub mod invoice;
pub mod store;

pub use finalize::{DeductionFailure, FinalizeError, Finalizer};
pub use invoice::{Invoice, InvoiceDraft, InvoiceItem};
pub use store::{InMemoryInvoiceStore, InvoiceStore};
