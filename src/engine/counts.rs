// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Free-text stocktake parsing.
//!
//! The raw string a user typed ("1 pkt + 1 opened", "nil", "3") is the
//! source of truth; the numeric value is a derived cache. [`Count`] keeps
//! "asserted zero" and "could not read it" apart all the way downstream.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("static count pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Count {
    /// A number was recorded or extracted from the text.
    Known(Decimal),
    /// The user wrote "nil" / "none".
    AssertedZero,
    /// A row exists but its text holds no number (or is blank).
    Unknown,
}

impl Count {
    pub fn from_raw(raw: Option<&str>, pre_parsed: Option<Decimal>) -> Count {
        if let Some(v) = pre_parsed {
            return Count::Known(v);
        }
        let text = raw.unwrap_or_default().trim().to_lowercase();
        if text.is_empty() {
            return Count::Unknown;
        }
        if text == "nil" || text == "none" {
            return Count::AssertedZero;
        }
        match FIRST_NUMBER
            .find(&text)
            .and_then(|m| m.as_str().parse::<Decimal>().ok())
        {
            Some(v) => Count::Known(v),
            None => Count::Unknown,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Count::Known(v) => Some(*v),
            Count::AssertedZero => Some(Decimal::ZERO),
            Count::Unknown => None,
        }
    }

    /// Quantity to reason with when a number is required; unknown reads as empty.
    pub fn quantity_or_zero(&self) -> Decimal {
        self.value().unwrap_or(Decimal::ZERO)
    }
}

/// `None` means either no text at all or text with no readable number.
pub fn normalize(raw: Option<&str>, pre_parsed: Option<Decimal>) -> Option<Decimal> {
    Count::from_raw(raw, pre_parsed).value()
}
