// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::members::require_privileged;
use crate::engine::balances::{chronological, compute_balances, current_balance};
use crate::error::StockroomError;
use crate::models::{Receipt, ReceiptStatus};
use crate::store::{self, NewReceipt, ReceiptFilter};
use crate::utils::{fmt_money, get_currency, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-status", sub)) => {
            let actor = sub.get_one::<String>("actor").unwrap();
            let raw_id = sub.get_one::<String>("id").unwrap();
            let id = raw_id
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid receipt id '{}'", raw_id))?;
            let status = sub.get_one::<String>("status").unwrap().parse::<ReceiptStatus>()?;
            set_status(conn, actor, id, status)?;
            println!("Receipt {} is {}", id, status);
        }
        Some(("balance", _)) => {
            let receipts = store::load_receipts(conn, &ReceiptFilter::default())?;
            println!(
                "Current balance: {}",
                fmt_money(&current_balance(&receipts), &get_currency(conn)?)
            );
        }
        _ => {}
    }
    Ok(())
}

fn opt_text(sub: &clap::ArgMatches, name: &str) -> Option<String> {
    sub.get_one::<String>(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let receipt = NewReceipt {
        owner: sub.get_one::<String>("owner").unwrap().trim().to_string(),
        vendor: sub.get_one::<String>("vendor").unwrap().trim().to_string(),
        category: opt_text(sub, "category"),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        amount_received: parse_decimal(sub.get_one::<String>("received").unwrap())?,
        payment_method: opt_text(sub, "method"),
        receipt_date: parse_date(sub.get_one::<String>("date").unwrap())?,
        reference: opt_text(sub, "reference"),
        created_at: None,
    };
    let id = store::insert_receipt(conn, &receipt)?;
    println!(
        "Recorded receipt {} from '{}' on {} (pending review)",
        id, receipt.vendor, receipt.receipt_date
    );
    Ok(())
}

/// Privileged. Checks authorization before touching the row, then applies a
/// conditional update so a concurrent change cannot be silently overwritten.
pub fn set_status(
    conn: &Connection,
    actor: &str,
    id: i64,
    to: ReceiptStatus,
) -> crate::error::Result<()> {
    require_privileged(conn, actor, "change receipt status")?;
    let from = store::receipt_status(conn, id)?;
    if from == to {
        return Ok(());
    }
    let transition = || StockroomError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    };
    if !from.can_become(to) {
        return Err(transition());
    }
    if store::update_receipt_status(conn, id, from, to)? == 0 {
        return Err(transition());
    }
    tracing::info!(receipt = id, actor = actor.trim(), %from, %to, "receipt status changed");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct LedgerLine {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub previous_balance: Decimal,
    pub balance: Decimal,
}

/// Balances always come from the full ledger; the filter only narrows what is shown.
/// Lines are newest first.
pub fn ledger_lines(
    conn: &Connection,
    filter: &ReceiptFilter,
) -> crate::error::Result<Vec<LedgerLine>> {
    let all = store::load_receipts(conn, &ReceiptFilter::default())?;
    let balances = compute_balances(&all);
    let from = filter.from.map(|d| d.to_string());
    let to = filter.to.map(|d| d.to_string());
    let mut lines: Vec<LedgerLine> = chronological(&all)
        .into_iter()
        .filter(|r| filter.owner.as_ref().is_none_or(|o| &r.owner == o))
        .filter(|r| from.as_ref().is_none_or(|f| &r.receipt_date >= f))
        .filter(|r| to.as_ref().is_none_or(|t| &r.receipt_date <= t))
        .map(|r| {
            let b = balances.get(&r.id).copied().unwrap_or_default();
            LedgerLine {
                receipt: r.clone(),
                previous_balance: b.previous_balance,
                balance: b.balance,
            }
        })
        .collect();
    lines.reverse();
    Ok(lines)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = ReceiptFilter {
        owner: opt_text(sub, "owner"),
        from: match sub.get_one::<String>("from") {
            Some(d) => Some(parse_date(d)?),
            None => None,
        },
        to: match sub.get_one::<String>("to") {
            Some(d) => Some(parse_date(d)?),
            None => None,
        },
    };
    let lines = ledger_lines(conn, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &lines)? {
        let rows = lines
            .into_iter()
            .map(|l| {
                vec![
                    l.receipt.id.to_string(),
                    l.receipt.receipt_date,
                    l.receipt.vendor,
                    l.receipt.category.unwrap_or_default(),
                    format!("{:.2}", l.receipt.amount),
                    format!("{:.2}", l.receipt.amount_received),
                    format!("{:.2}", l.previous_balance),
                    format!("{:.2}", l.balance),
                    l.receipt.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Date", "Vendor", "Category", "Spent", "Received", "Prev", "Balance",
                    "Status"
                ],
                rows
            )
        );
    }
    Ok(())
}
