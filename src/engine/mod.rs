// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure reconciliation algorithms. Nothing in here touches the store; every
//! function is a deterministic fold over rows the caller already read.

pub mod balances;
pub mod counts;
pub mod schedule;
pub mod shopping;
pub mod status;
pub mod stock;

use rust_decimal::Decimal;

/// Adds `delta` into `acc`. A step that would overflow is dropped and
/// `acc` keeps its value; returns whether the step landed.
pub(crate) fn accumulate(acc: &mut Decimal, delta: Option<Decimal>) -> bool {
    match delta.and_then(|d| acc.checked_add(d)) {
        Some(next) => {
            *acc = next;
            true
        }
        None => false,
    }
}

/// Overflow-safe sum; overflowing terms are skipped.
pub(crate) fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    let mut total = Decimal::ZERO;
    for v in values {
        if !accumulate(&mut total, Some(v)) {
            tracing::warn!(term = %v, "sum overflowed; term skipped");
        }
    }
    total
}
