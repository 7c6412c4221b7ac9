// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use super::counts::Count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out-of-stock",
            StockStatus::LowStock => "low-stock",
            StockStatus::InStock => "in-stock",
        }
    }

    pub fn needs_attention(&self) -> bool {
        !matches!(self, StockStatus::InStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub status: StockStatus,
    pub is_urgent: bool,
}

/// `count` is `None` when the item has never been counted.
///
/// Missing and unreadable counts both classify as low stock. Only an actual
/// zero (or negative) reading is out of stock, and only that is urgent.
pub fn classify(count: Option<&Count>, reorder_level: Option<Decimal>) -> Classification {
    let status = match count.and_then(Count::value) {
        None => StockStatus::LowStock,
        Some(qty) if qty <= Decimal::ZERO => StockStatus::OutOfStock,
        Some(qty) if reorder_level.is_some_and(|level| qty <= level) => StockStatus::LowStock,
        Some(_) => StockStatus::InStock,
    };
    Classification {
        status,
        is_urgent: status == StockStatus::OutOfStock,
    }
}
