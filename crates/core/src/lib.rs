//! `surgistock-core` — shared domain primitives.
//!
//! Pure domain building blocks only: the error taxonomy and typed ids. No
//! storage, HTTP, or logging concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{EquipmentId, InvoiceId};
