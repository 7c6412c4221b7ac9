// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reminders::{due_reminders, now_arg};
use crate::commands::shopping::current_plan;
use crate::engine::balances::current_balance;
use crate::engine::status::{StockStatus, classify};
use crate::engine::stock::{aggregate, total_value};
use crate::models::ReceiptStatus;
use crate::store::{self, ReceiptFilter};
use crate::utils::{fmt_money, fmt_qty, get_currency, get_setting, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("stock", sub)) => stock(conn, sub)?,
        Some(("dashboard", sub)) => dashboard(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct StockLine {
    pub item_id: i64,
    pub name: String,
    pub unit: String,
    /// From the movement ledger.
    pub ledger_qty: Decimal,
    pub total_value: Decimal,
    /// From the latest stocktake, if it could be read.
    pub counted_qty: Option<Decimal>,
    pub status: StockStatus,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub lines: Vec<StockLine>,
    pub value: Decimal,
}

/// Ledger position and stocktake classification side by side, per active item.
pub fn stock_report(conn: &Connection) -> crate::error::Result<StockReport> {
    let snapshots = store::item_snapshots(conn)?;
    let movements = store::load_movements(conn, None)?;
    let positions = aggregate(snapshots.iter().map(|s| s.item_id), &movements);
    let lines = snapshots
        .into_iter()
        .map(|s| {
            let pos = positions.get(&s.item_id).copied().unwrap_or_default();
            let c = classify(s.count.as_ref(), s.reorder_level);
            StockLine {
                item_id: s.item_id,
                counted_qty: s.count.as_ref().and_then(|n| n.value()),
                name: s.name,
                unit: s.unit,
                ledger_qty: pos.quantity,
                total_value: pos.total_value,
                status: c.status,
                is_urgent: c.is_urgent,
            }
        })
        .collect();
    Ok(StockReport {
        lines,
        value: total_value(&positions),
    })
}

fn stock(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = stock_report(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let rows = report
        .lines
        .into_iter()
        .map(|l| {
            vec![
                l.name,
                format!("{} {}", fmt_qty(&l.ledger_qty), l.unit).trim().to_string(),
                l.counted_qty.as_ref().map(fmt_qty).unwrap_or_else(|| "?".into()),
                format!("{:.2}", l.total_value),
                l.status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Item", "Ledger", "Counted", "Value", "Status"], rows)
    );
    println!("Stock value: {}", fmt_money(&report.value, &ccy));
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub organization: Option<String>,
    pub currency: String,
    pub active_items: usize,
    pub out_of_stock: usize,
    pub low_stock: usize,
    pub stock_value: Decimal,
    pub balance: Decimal,
    pub pending_receipts: usize,
    pub flagged_receipts: usize,
    pub shopping_rows: usize,
    pub shopping_total: Decimal,
    pub reminders_due: usize,
}

/// One-screen summary. Everything is recomputed from stored rows.
pub fn dashboard_summary(
    conn: &Connection,
    now: DateTime<FixedOffset>,
) -> Result<Dashboard> {
    let StockReport { lines, value } = stock_report(conn)?;
    let receipts = store::load_receipts(conn, &ReceiptFilter::default())?;
    let plan = current_plan(conn)?;
    let with_status =
        |wanted: ReceiptStatus| receipts.iter().filter(|r| r.status == wanted).count();
    Ok(Dashboard {
        organization: get_setting(conn, "org_name")?,
        currency: get_currency(conn)?,
        active_items: lines.len(),
        out_of_stock: lines
            .iter()
            .filter(|l| l.status == StockStatus::OutOfStock)
            .count(),
        low_stock: lines
            .iter()
            .filter(|l| l.status == StockStatus::LowStock)
            .count(),
        stock_value: value,
        balance: current_balance(&receipts),
        pending_receipts: with_status(ReceiptStatus::Pending),
        flagged_receipts: with_status(ReceiptStatus::Flagged),
        shopping_rows: plan.rows.len(),
        shopping_total: plan.total,
        reminders_due: due_reminders(conn, None, now)?.len(),
    })
}

fn dashboard(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let d = dashboard_summary(conn, now_arg(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    if let Some(org) = &d.organization {
        println!("{}", org);
    }
    let rows = vec![
        vec!["Active items".into(), d.active_items.to_string()],
        vec!["Out of stock".into(), d.out_of_stock.to_string()],
        vec!["Low stock".into(), d.low_stock.to_string()],
        vec!["Stock value".into(), fmt_money(&d.stock_value, &d.currency)],
        vec!["Balance".into(), fmt_money(&d.balance, &d.currency)],
        vec!["Receipts pending".into(), d.pending_receipts.to_string()],
        vec!["Receipts flagged".into(), d.flagged_receipts.to_string()],
        vec![
            "Shopping list".into(),
            format!(
                "{} rows, {}",
                d.shopping_rows,
                fmt_money(&d.shopping_total, &d.currency)
            ),
        ],
        vec!["Reminders due today".into(), d.reminders_due.to_string()],
    ];
    println!("{}", pretty_table(&["", ""], rows));
    Ok(())
}
