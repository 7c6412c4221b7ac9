// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod alerts;
pub mod categories;
pub mod config;
pub mod counts;
pub mod doctor;
pub mod importer;
pub mod items;
pub mod members;
pub mod movements;
pub mod receipts;
pub mod reminders;
pub mod reports;
pub mod shopping;
