// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{accumulate, checked_sum};
use crate::models::{MovementKind, StockMovement};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockPosition {
    pub quantity: Decimal,
    pub total_value: Decimal,
}

/// Replays movements into a quantity and a cumulative cost per item.
///
/// Folding is commutative, so input order does not matter. Outgoing stock is
/// valued at the movement's own unit cost, which can push `total_value`
/// below zero; that is kept as recorded. Movements for items outside
/// `item_ids` are ignored. A quantity or value step that would overflow
/// `Decimal` contributes zero instead.
pub fn aggregate<I>(item_ids: I, movements: &[StockMovement]) -> BTreeMap<i64, StockPosition>
where
    I: IntoIterator<Item = i64>,
{
    let mut positions: BTreeMap<i64, StockPosition> = item_ids
        .into_iter()
        .map(|id| (id, StockPosition::default()))
        .collect();

    for mv in movements {
        let Some(pos) = positions.get_mut(&mv.item_id) else {
            continue;
        };
        let qty = mv.quantity.unwrap_or(Decimal::ZERO);
        let cost = mv.unit_cost.unwrap_or(Decimal::ZERO);
        let value = qty.checked_mul(cost);
        let (qty_step, value_step) = match mv.kind {
            MovementKind::In => (Some(qty), value),
            MovementKind::Out => (Some(-qty), value.map(|v| -v)),
            MovementKind::Adjust => (Some(qty), Some(Decimal::ZERO)),
        };
        let qty_landed = accumulate(&mut pos.quantity, qty_step);
        let value_landed = accumulate(&mut pos.total_value, value_step);
        if !(qty_landed && value_landed) {
            tracing::warn!(
                movement = mv.id,
                item = mv.item_id,
                "movement overflowed; folded as zero"
            );
        }
    }
    tracing::debug!(
        items = positions.len(),
        movements = movements.len(),
        "aggregated stock movements"
    );
    positions
}

pub fn total_value(positions: &BTreeMap<i64, StockPosition>) -> Decimal {
    checked_sum(positions.values().map(|p| p.total_value))
}
