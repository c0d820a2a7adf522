//! Inventory domain module: the equipment stock ledger.
//!
//! This crate owns the `EquipmentRecord` model and its one real invariant
//! (status counts sum to total quantity), the versioned equipment store with
//! optimistic per-record concurrency, the reservation protocol
//! (`reserve`/`release`), and the category stats rollup.
//!
//! The "cart" that drives reservations is client-held and ephemeral; the
//! store is the single source of truth for how many units are left. Callers
//! that fail partway through paired reserve/release calls can drift from the
//! store and are expected to reconcile by reloading records — the protocol
//! does not auto-correct, and repeating `reserve` reserves another unit.

pub mod equipment;
pub mod stats;
pub mod store;

pub use equipment::{
    Category, EquipmentPatch, EquipmentRecord, NewEquipment, StatusBucket, StatusCounts,
};
pub use stats::{CategoryTotals, StatsSummary, summarize};
pub use store::{EquipmentFilter, EquipmentStore, InMemoryEquipmentStore, StockStatus};
