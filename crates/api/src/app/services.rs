use std::sync::Arc;

use surgistock_inventory::{EquipmentStore, InMemoryEquipmentStore};
use surgistock_invoicing::{Finalizer, InMemoryInvoiceStore, InvoiceStore};

/// Stores and services shared by every handler.
///
/// The equipment store is the single authoritative stock ledger; the
/// finalizer holds its own handles to both stores.
pub struct AppServices {
    pub equipment: Arc<dyn EquipmentStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub finalizer: Finalizer,
}

pub fn build_services() -> AppServices {
    let equipment: Arc<dyn EquipmentStore> = InMemoryEquipmentStore::arc();
    let invoices: Arc<dyn InvoiceStore> = InMemoryInvoiceStore::arc();
    let finalizer = Finalizer::new(equipment.clone(), invoices.clone());

    AppServices {
        equipment,
        invoices,
        finalizer,
    }
}
