//! Category-level rollups over the equipment ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use surgistock_core::{DomainError, DomainResult};

use crate::equipment::Category;
use crate::store::{EquipmentFilter, EquipmentStore};

/// Totals for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    /// Number of distinct equipment records.
    pub count: u64,
    /// Sum of `quantity`.
    pub units: i64,
    /// Sum of derived `totalCost`, in minor currency units.
    pub cost: u64,
}

/// Snapshot of per-category totals.
///
/// Derived, never cached: recomputed from current records on each call, so it
/// reflects every committed mutation exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub category_totals: BTreeMap<Category, CategoryTotals>,
}

/// Roll current records up into per-category totals. Pure read.
pub fn summarize(store: &dyn EquipmentStore) -> DomainResult<StatsSummary> {
    let records = store.list(&EquipmentFilter::default())?;

    let mut category_totals: BTreeMap<Category, CategoryTotals> = BTreeMap::new();
    for record in &records {
        let totals = category_totals.entry(record.category).or_default();
        totals.count += 1;
        totals.units = totals
            .units
            .checked_add(record.quantity)
            .ok_or_else(|| DomainError::validation("unit total overflows"))?;
        totals.cost = totals
            .cost
            .checked_add(record.total_cost())
            .ok_or_else(|| DomainError::validation("cost total overflows"))?;
    }

    Ok(StatsSummary { category_totals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::NewEquipment;
    use crate::store::InMemoryEquipmentStore;

    fn seed(name: &str, category: Category, quantity: i64, cost_per_unit: u64) -> NewEquipment {
        NewEquipment {
            name: name.to_string(),
            category,
            unit: "UNT".to_string(),
            hsn_code: String::new(),
            quantity,
            cost_per_unit,
            status_counts: None,
            notes: String::new(),
        }
    }

    #[test]
    fn summarize_rolls_up_per_category() {
        let store = InMemoryEquipmentStore::new();
        store.create(seed("Scalpel", Category::Instruments, 10, 50)).unwrap();
        store.create(seed("Clamp", Category::Instruments, 4, 100)).unwrap();
        store.create(seed("Gloves", Category::Consumables, 200, 5)).unwrap();

        let summary = summarize(&store).unwrap();
        assert_eq!(
            summary.category_totals[&Category::Instruments],
            CategoryTotals {
                count: 2,
                units: 14,
                cost: 10 * 50 + 4 * 100,
            }
        );
        assert_eq!(
            summary.category_totals[&Category::Consumables],
            CategoryTotals {
                count: 1,
                units: 200,
                cost: 1000,
            }
        );
        assert!(!summary.category_totals.contains_key(&Category::Furniture));
    }

    #[test]
    fn summarize_rejects_unit_totals_that_overflow() {
        let store = InMemoryEquipmentStore::new();
        store.create(seed("Bulk A", Category::Consumables, i64::MAX, 0)).unwrap();
        store.create(seed("Bulk B", Category::Consumables, i64::MAX, 0)).unwrap();

        let err = summarize(&store).unwrap_err();
        assert_eq!(err, DomainError::validation("unit total overflows"));
    }

    #[test]
    fn summarize_reflects_mutations_immediately() {
        let store = InMemoryEquipmentStore::new();
        let before = summarize(&store).unwrap();
        assert!(before.category_totals.is_empty());

        let created = store.create(seed("Probe", Category::Instruments, 10, 50)).unwrap();
        let after_create = summarize(&store).unwrap();
        assert_eq!(after_create.category_totals[&Category::Instruments].units, 10);
        assert_eq!(after_create.category_totals[&Category::Instruments].cost, 500);

        store.deduct_sold(created.id, 4).unwrap();
        let after_sale = summarize(&store).unwrap();
        assert_eq!(after_sale.category_totals[&Category::Instruments].units, 6);
        assert_eq!(after_sale.category_totals[&Category::Instruments].cost, 300);
    }
}
