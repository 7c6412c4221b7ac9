// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Shopping list reconciliation.
//!
//! Three inputs become one row set: items the classifier flags, items a user
//! added by hand, and per-item overrides (desired quantity, unit price,
//! exclusion). The result is sorted with every tie resolved, so two reads of
//! the same rows always render identically.

use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::checked_sum;
use super::counts::Count;
use super::status::{StockStatus, classify};
use crate::models::ShoppingListOverride;

/// What the reconciler needs to know about one active item.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub item_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub reorder_level: Option<Decimal>,
    /// Latest count, `None` when the item was never counted.
    pub count: Option<Count>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Automatic,
    Manual,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Automatic => "automatic",
            Provenance::Manual => "manual",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingRow {
    pub item_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub current_qty: Decimal,
    pub reorder_level: Option<Decimal>,
    pub status: StockStatus,
    pub provenance: Provenance,
    pub desired_qty: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShoppingPlan {
    pub rows: Vec<ShoppingRow>,
    pub total: Decimal,
}

/// Count written back for a purchased row when a list is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockCount {
    pub item_id: i64,
    pub raw_value: String,
    pub value: Decimal,
    pub unit: String,
}

pub fn reconcile(
    items: &[ItemSnapshot],
    manual: &HashSet<i64>,
    overrides: &HashMap<i64, ShoppingListOverride>,
) -> ShoppingPlan {
    let excluded = |id: i64| overrides.get(&id).is_some_and(|o| o.excluded);

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    for item in items {
        let class = classify(item.count.as_ref(), item.reorder_level);
        if !class.status.needs_attention() || excluded(item.item_id) {
            continue;
        }
        seen.insert(item.item_id);
        rows.push(build_row(item, class.status, Provenance::Automatic, overrides));
    }
    for item in items {
        if !manual.contains(&item.item_id) || seen.contains(&item.item_id) {
            continue;
        }
        let class = classify(item.count.as_ref(), item.reorder_level);
        seen.insert(item.item_id);
        rows.push(build_row(item, class.status, Provenance::Manual, overrides));
    }

    rows.sort_by(display_order);
    let total = checked_sum(rows.iter().map(|r| r.amount));
    tracing::debug!(rows = rows.len(), %total, "reconciled shopping list");
    ShoppingPlan { rows, total }
}

fn build_row(
    item: &ItemSnapshot,
    status: StockStatus,
    provenance: Provenance,
    overrides: &HashMap<i64, ShoppingListOverride>,
) -> ShoppingRow {
    let current_qty = item
        .count
        .as_ref()
        .map(Count::quantity_or_zero)
        .unwrap_or(Decimal::ZERO);
    let ov = overrides.get(&item.item_id);
    let desired_qty = ov
        .and_then(|o| o.desired_qty)
        .unwrap_or_else(|| suggested_qty(status, current_qty, item.reorder_level));
    let unit_price = ov.and_then(|o| o.unit_price).unwrap_or(Decimal::ZERO);
    ShoppingRow {
        item_id: item.item_id,
        name: item.name.clone(),
        category: item.category.clone(),
        unit: item.unit.clone(),
        current_qty,
        reorder_level: item.reorder_level,
        status,
        provenance,
        desired_qty,
        unit_price,
        amount: desired_qty.checked_mul(unit_price).unwrap_or(Decimal::ZERO),
    }
}

/// Quantity to buy when the user has not said otherwise.
///
/// Low stock tops up to the threshold. Out-of-stock rows, and in-stock rows
/// a user added by hand, always ask for at least one.
pub fn suggested_qty(
    status: StockStatus,
    current_qty: Decimal,
    reorder_level: Option<Decimal>,
) -> Decimal {
    let gap = reorder_level
        .and_then(|level| level.checked_sub(current_qty))
        .map(|gap| gap.max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);
    match status {
        StockStatus::LowStock => gap,
        StockStatus::OutOfStock | StockStatus::InStock => gap.max(Decimal::ONE),
    }
}

fn fill_ratio(row: &ShoppingRow) -> Option<Decimal> {
    match row.reorder_level {
        Some(level) if level > Decimal::ZERO => row.current_qty.checked_div(level),
        _ => None,
    }
}

fn display_order(a: &ShoppingRow, b: &ShoppingRow) -> Ordering {
    let tier = |r: &ShoppingRow| u8::from(r.status != StockStatus::OutOfStock);
    tier(a)
        .cmp(&tier(b))
        .then_with(|| match (fill_ratio(a), fill_ratio(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// `None` when nothing is being bought for this row, or when the new
/// quantity does not fit in a `Decimal`.
pub fn restock_count(row: &ShoppingRow) -> Option<RestockCount> {
    if row.desired_qty <= Decimal::ZERO {
        return None;
    }
    let value = row.current_qty.checked_add(row.desired_qty)?;
    let raw_value = format!("{} {}", value.normalize(), row.unit)
        .trim()
        .to_string();
    Some(RestockCount {
        item_id: row.item_id,
        raw_value,
        value,
        unit: row.unit.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, name: &str, count: Option<Count>, level: Option<i64>) -> ItemSnapshot {
        ItemSnapshot {
            item_id: id,
            name: name.into(),
            category: None,
            unit: "pkt".into(),
            reorder_level: level.map(Decimal::from),
            count,
        }
    }

    fn known(v: i64) -> Option<Count> {
        Some(Count::Known(Decimal::from(v)))
    }

    fn ov(id: i64, qty: Option<i64>, price: Option<i64>, excluded: bool) -> ShoppingListOverride {
        ShoppingListOverride {
            item_id: id,
            desired_qty: qty.map(Decimal::from),
            unit_price: price.map(Decimal::from),
            excluded,
        }
    }

    #[test]
    fn suggestions_follow_the_classifier() {
        let items = vec![
            item(1, "Rice", known(2), Some(5)),
            item(2, "Salt", known(10), Some(5)),
            item(3, "Oil", known(0), None),
        ];
        let plan = reconcile(&items, &HashSet::new(), &HashMap::new());
        let ids: Vec<i64> = plan.rows.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(plan.rows[0].desired_qty, Decimal::ONE);
        assert_eq!(plan.rows[1].desired_qty, Decimal::from(3));
        assert_eq!(plan.total, Decimal::ZERO);
    }

    #[test]
    fn excluded_items_drop_and_manual_items_join() {
        let items = vec![
            item(1, "Rice", known(2), Some(5)),
            item(2, "Salt", known(10), Some(5)),
        ];
        let overrides = HashMap::from([(1, ov(1, Some(0), None, true))]);
        let manual = HashSet::from([2]);
        let plan = reconcile(&items, &manual, &overrides);
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].item_id, 2);
        assert_eq!(plan.rows[0].provenance, Provenance::Manual);
        assert_eq!(plan.rows[0].status, StockStatus::InStock);
        assert_eq!(plan.rows[0].desired_qty, Decimal::ONE);
    }

    #[test]
    fn manual_flag_on_a_suggested_item_keeps_it_automatic() {
        let items = vec![item(1, "Rice", known(2), Some(5))];
        let plan = reconcile(&items, &HashSet::from([1]), &HashMap::new());
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].provenance, Provenance::Automatic);
    }

    #[test]
    fn overrides_drive_quantity_price_and_total() {
        let items = vec![
            item(1, "Rice", known(2), Some(5)),
            item(2, "Oil", known(0), None),
        ];
        let overrides = HashMap::from([
            (1, ov(1, Some(4), Some(3), false)),
            (2, ov(2, None, Some(7), false)),
        ]);
        let plan = reconcile(&items, &HashSet::new(), &overrides);
        let rice = plan.rows.iter().find(|r| r.item_id == 1).unwrap();
        assert_eq!(rice.amount, Decimal::from(12));
        let oil = plan.rows.iter().find(|r| r.item_id == 2).unwrap();
        assert_eq!(oil.desired_qty, Decimal::ONE);
        assert_eq!(oil.amount, Decimal::from(7));
        assert_eq!(plan.total, Decimal::from(19));
    }

    #[test]
    fn low_stock_without_threshold_suggests_nothing() {
        let items = vec![item(1, "Mystery", None, None)];
        let plan = reconcile(&items, &HashSet::new(), &HashMap::new());
        assert_eq!(plan.rows[0].status, StockStatus::LowStock);
        assert_eq!(plan.rows[0].desired_qty, Decimal::ZERO);
    }

    #[test]
    fn ordering_is_fully_specified() {
        let items = vec![
            item(1, "beans", known(4), Some(5)),
            item(2, "Apples", known(1), Some(5)),
            item(3, "Zucchini", known(0), Some(5)),
            item(4, "avocado", known(0), None),
            item(5, "Bread", None, None),
            item(6, "Almonds", Some(Count::Unknown), None),
            item(7, "Carrots", known(1), Some(5)),
        ];
        let plan = reconcile(&items, &HashSet::new(), &HashMap::new());
        let names: Vec<&str> = plan.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Zucchini", "avocado", "Apples", "Carrots", "beans", "Almonds", "Bread"
            ]
        );
    }

    #[test]
    fn oversized_numbers_never_panic() {
        let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let mut sago = item(2, "Sago", Some(Count::Known(huge)), None);
        // ratio 5e28 / 1e-28 does not fit
        sago.reorder_level = Some(Decimal::new(1, 28));
        let items = vec![item(1, "Salt", known(0), None), sago];
        let mut salt = ov(1, None, Some(2), false);
        salt.desired_qty = Some(huge);
        let overrides = HashMap::from([(1, salt), (2, ov(2, Some(1), None, false))]);

        let plan = reconcile(&items, &HashSet::from([2]), &overrides);
        let ids: Vec<i64> = plan.rows.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(plan.rows[0].amount, Decimal::ZERO);
        assert_eq!(plan.total, Decimal::ZERO);

        let mut restock = plan.rows[1].clone();
        restock.desired_qty = huge;
        assert!(restock_count(&restock).is_none());
    }

    #[test]
    fn restock_text_carries_sum_and_unit() {
        let items = vec![item(1, "Rice", known(1), Some(3))];
        let plan = reconcile(&items, &HashSet::new(), &HashMap::new());
        let restock = restock_count(&plan.rows[0]).unwrap();
        assert_eq!(restock.raw_value, "3 pkt");
        assert_eq!(restock.value, Decimal::from(3));

        let mut zero = plan.rows[0].clone();
        zero.desired_qty = Decimal::ZERO;
        assert!(restock_count(&zero).is_none());
    }
}
