// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::accumulate;
use crate::models::Receipt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunningBalance {
    pub previous_balance: Decimal,
    pub balance: Decimal,
}

/// Receipts in folding order: receipt date, then creation time, then id.
pub fn chronological(receipts: &[Receipt]) -> Vec<&Receipt> {
    let mut ordered: Vec<&Receipt> = receipts.iter().collect();
    ordered.sort_by(|a, b| {
        a.receipt_date
            .cmp(&b.receipt_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// Folds funds received minus spend into a running balance seeded at zero.
///
/// The fold always follows [`chronological`], whatever order the rows came in.
/// A receipt whose step would overflow leaves the balance unchanged.
pub fn compute_balances(receipts: &[Receipt]) -> HashMap<i64, RunningBalance> {
    let mut out = HashMap::with_capacity(receipts.len());
    let mut balance = Decimal::ZERO;
    for r in chronological(receipts) {
        let previous_balance = balance;
        let step = r.amount_received.checked_sub(r.amount);
        if !accumulate(&mut balance, step) {
            tracing::warn!(receipt = r.id, "balance overflowed; receipt folded as zero");
        }
        out.insert(
            r.id,
            RunningBalance {
                previous_balance,
                balance,
            },
        );
    }
    out
}

/// Balance after the chronologically latest receipt; zero for an empty ledger.
pub fn current_balance(receipts: &[Receipt]) -> Decimal {
    let balances = compute_balances(receipts);
    chronological(receipts)
        .last()
        .and_then(|r| balances.get(&r.id))
        .map(|b| b.balance)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceiptStatus;

    fn receipt(id: i64, date: &str, created: &str, received: i64, spent: i64) -> Receipt {
        Receipt {
            id,
            owner: "ops".into(),
            vendor: "Vendor".into(),
            category: None,
            amount: Decimal::from(spent),
            amount_received: Decimal::from(received),
            payment_method: None,
            status: ReceiptStatus::Pending,
            receipt_date: date.into(),
            created_at: created.into(),
            reference: None,
        }
    }

    #[test]
    fn fold_ignores_input_order() {
        let r1 = receipt(1, "2024-01-01", "2024-01-01 09:00:00", 1000, 200);
        let r2 = receipt(2, "2024-01-01", "2024-01-01 10:00:00", 0, 100);
        let r3 = receipt(3, "2024-01-02", "2024-01-02 08:00:00", 0, 50);
        let balances = compute_balances(&[r3, r2, r1]);

        assert_eq!(balances[&1].balance, Decimal::from(800));
        assert_eq!(balances[&1].previous_balance, Decimal::ZERO);
        assert_eq!(balances[&2].balance, Decimal::from(700));
        assert_eq!(balances[&2].previous_balance, Decimal::from(800));
        assert_eq!(balances[&3].balance, Decimal::from(650));
    }

    #[test]
    fn same_timestamp_falls_back_to_id() {
        let a = receipt(7, "2024-03-01", "2024-03-01 12:00:00", 0, 10);
        let b = receipt(4, "2024-03-01", "2024-03-01 12:00:00", 100, 0);
        let order: Vec<i64> = chronological(&[a.clone(), b.clone()])
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(order, vec![4, 7]);
        assert_eq!(compute_balances(&[a, b])[&7].balance, Decimal::from(90));
    }

    #[test]
    fn current_balance_uses_latest_chronological_record() {
        let newest = receipt(1, "2024-05-02", "2024-05-01 00:00:00", 0, 5);
        let oldest = receipt(2, "2024-05-01", "2024-05-02 00:00:00", 20, 0);
        assert_eq!(current_balance(&[newest, oldest]), Decimal::from(15));
        assert_eq!(current_balance(&[]), Decimal::ZERO);
    }

    #[test]
    fn overflowing_receipt_keeps_previous_balance() {
        let first = receipt(1, "2024-06-01", "2024-06-01 00:00:00", 10, 0);
        let mut huge = receipt(2, "2024-06-02", "2024-06-02 00:00:00", 0, 0);
        huge.amount_received = Decimal::MAX;
        let balances = compute_balances(&[first, huge]);
        assert_eq!(balances[&2].previous_balance, Decimal::from(10));
        assert_eq!(balances[&2].balance, Decimal::from(10));
    }
}
