// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StockroomError;

macro_rules! text_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StockroomError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(StockroomError::invalid($field, s)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub reorder_level: Option<Decimal>,
    pub category_id: Option<i64>,
    pub category: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
    Adjust,
}

text_enum!(MovementKind, "movement kind", {
    In => "in",
    Out => "out",
    Adjust => "adjust",
});

/// Append-only stock event. Missing or non-numeric quantity/cost decode to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub item_id: i64,
    pub kind: MovementKind,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub moved_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    Manual,
    ShoppingList,
}

text_enum!(CountSource, "count source", {
    Manual => "manual",
    ShoppingList => "shopping_list",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCount {
    pub id: i64,
    pub item_id: i64,
    pub count_date: NaiveDate,
    pub raw_value: Option<String>,
    pub value: Option<Decimal>,
    pub unit: Option<String>,
    pub source: CountSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Pending,
    Verified,
    Flagged,
}

text_enum!(ReceiptStatus, "receipt status", {
    Pending => "pending",
    Verified => "verified",
    Flagged => "flagged",
});

impl ReceiptStatus {
    pub fn can_become(self, next: ReceiptStatus) -> bool {
        use ReceiptStatus::*;
        matches!(
            (self, next),
            (Pending, Verified) | (Pending, Flagged) | (Flagged, Verified) | (Flagged, Pending)
        )
    }
}

/// A spend/funding record. Balances are derived on read, see `engine::balances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub owner: String,
    pub vendor: String,
    pub category: Option<String>,
    pub amount: Decimal,
    pub amount_received: Decimal,
    pub payment_method: Option<String>,
    pub status: ReceiptStatus,
    pub receipt_date: String,
    pub created_at: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListOverride {
    pub item_id: i64,
    pub desired_qty: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub excluded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Active,
    Done,
}

text_enum!(ListStatus, "list status", {
    Active => "active",
    Done => "done",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub status: ListStatus,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub list_id: i64,
    pub item_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub current_qty: Decimal,
    pub desired_qty: Decimal,
    pub unit_price: Decimal,
    pub status: String,
    pub provenance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

text_enum!(Recurrence, "recurrence", {
    None => "none",
    Weekly => "weekly",
    Biweekly => "biweekly",
    Monthly => "monthly",
    Quarterly => "quarterly",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub notes: Option<String>,
    pub start_at: String, // raw, normalized by engine::schedule::parse_timestamp
    pub recurrence: Recurrence,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
    Owner,
}

text_enum!(Role, "role", {
    Member => "member",
    Admin => "admin",
    Owner => "owner",
});

impl Role {
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub role: Role,
}
