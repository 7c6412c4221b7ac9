// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockroomError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Permission denied: '{actor}' may not {action}")]
    Unauthorized { actor: String, action: String },

    #[error("Invalid receipt status transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("Shopping list {0} is no longer active")]
    ListNotActive(i64),
}

impl StockroomError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        StockroomError::InvalidValue {
            field,
            value: value.into(),
        }
    }

    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        StockroomError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StockroomError>;
