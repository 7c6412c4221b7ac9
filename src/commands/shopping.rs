// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::shopping::{ShoppingPlan, reconcile, restock_count};
use crate::error::StockroomError;
use crate::models::CountSource;
use crate::store::{self, NewCount};
use crate::utils::{
    fmt_money, fmt_qty, get_currency, id_for_active_item, id_for_item, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("set", sub)) => {
            let item = sub.get_one::<String>("item").unwrap();
            let qty = parse_decimal(sub.get_one::<String>("qty").unwrap())?;
            let price = match sub.get_one::<String>("price") {
                Some(p) => Some(parse_decimal(p)?),
                None => None,
            };
            let item_id = id_for_active_item(conn, item)?;
            set_row(conn, item_id, qty, price)?;
            println!("'{}': want {}", item.trim(), fmt_qty(&qty));
        }
        Some(("add", sub)) => {
            let item = sub.get_one::<String>("item").unwrap();
            store::add_manual_item(conn, id_for_active_item(conn, item)?)?;
            println!("Added '{}' to the shopping list", item.trim());
        }
        Some(("remove", sub)) => {
            let item = sub.get_one::<String>("item").unwrap();
            store::exclude_item(conn, id_for_item(conn, item)?)?;
            println!("Removed '{}' from the shopping list", item.trim());
        }
        Some(("complete", sub)) => complete(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Re-reads items, counts, manual additions and overrides and reconciles them.
pub fn current_plan(conn: &Connection) -> crate::error::Result<ShoppingPlan> {
    let items = store::item_snapshots(conn)?;
    let manual = store::load_manual_items(conn)?;
    let overrides = store::load_overrides(conn)?;
    Ok(reconcile(&items, &manual, &overrides))
}

/// Idempotent row edit. An item that is not on the list yet is opted in by hand.
pub fn set_row(
    conn: &Connection,
    item_id: i64,
    desired_qty: Decimal,
    unit_price: Option<Decimal>,
) -> crate::error::Result<()> {
    let tx = conn.unchecked_transaction()?;
    store::upsert_override(&tx, item_id, desired_qty, unit_price)?;
    let plan = current_plan(&tx)?;
    if !plan.rows.iter().any(|r| r.item_id == item_id) {
        store::include_manual_item(&tx, item_id)?;
    }
    tx.commit()?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RestockOutcome {
    pub item_id: i64,
    pub name: String,
    pub raw_value: String,
    pub quantity: Decimal,
    /// `None` when the count was written.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub list_id: i64,
    pub entries: usize,
    pub total: Decimal,
    pub restocked: Vec<RestockOutcome>,
    pub cleanup_error: Option<String>,
}

impl CompletionReport {
    /// Items whose stock count must be re-entered by hand.
    pub fn needs_follow_up(&self) -> impl Iterator<Item = &RestockOutcome> {
        self.restocked.iter().filter(|o| o.error.is_some())
    }
}

/// Marks the active list done and feeds purchased quantities back as counts.
///
/// The snapshot and the `active -> done` flip share one transaction: if
/// either fails nothing is written. Count write-back and override clearing
/// run afterwards per item and never undo the completion; failures are
/// reported in the returned [`CompletionReport`].
pub fn complete_active_list(
    conn: &mut Connection,
    today: NaiveDate,
) -> crate::error::Result<CompletionReport> {
    let tx = conn.transaction()?;
    let list_id = match store::active_list(&tx)? {
        Some(list) => list.id,
        None => store::insert_list(&tx, &format!("Shopping {}", today))?,
    };
    let plan = current_plan(&tx)?;
    store::insert_entries(&tx, list_id, &plan.rows)?;
    if store::mark_list_done(&tx, list_id)? == 0 {
        return Err(StockroomError::ListNotActive(list_id));
    }
    tx.commit()?;
    tracing::info!(
        list = list_id,
        entries = plan.rows.len(),
        total = %plan.total,
        "shopping list completed"
    );

    let mut restocked = Vec::new();
    for row in &plan.rows {
        let Some(restock) = restock_count(row) else {
            continue;
        };
        let written = store::upsert_count(
            conn,
            &NewCount {
                item_id: restock.item_id,
                count_date: today,
                raw_value: restock.raw_value.clone(),
                value: Some(restock.value),
                unit: Some(restock.unit.clone()).filter(|u| !u.is_empty()),
                source: CountSource::ShoppingList,
            },
        );
        let error = written.err().map(|e| {
            tracing::warn!(item = row.item_id, error = %e, "restock count not written");
            e.to_string()
        });
        restocked.push(RestockOutcome {
            item_id: row.item_id,
            name: row.name.clone(),
            raw_value: restock.raw_value,
            quantity: restock.value,
            error,
        });
    }

    let cleanup_error = store::clear_shopping_state(conn).err().map(|e| {
        tracing::warn!(error = %e, "shopping overrides not cleared");
        e.to_string()
    });

    Ok(CompletionReport {
        list_id,
        entries: plan.rows.len(),
        total: plan.total,
        restocked,
        cleanup_error,
    })
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let plan = current_plan(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &plan)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let rows = plan
        .rows
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.category.clone().unwrap_or_default(),
                r.status.to_string(),
                format!("{} {}", fmt_qty(&r.current_qty), r.unit).trim().to_string(),
                fmt_qty(&r.desired_qty),
                format!("{:.2}", r.unit_price),
                format!("{:.2}", r.amount),
                r.provenance.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Item", "Category", "Status", "Have", "Buy", "Price", "Amount", "Source"],
            rows
        )
    );
    println!("Total: {}", fmt_money(&plan.total, &ccy));
    Ok(())
}

fn complete(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let report = complete_active_list(conn, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    println!(
        "Completed list {} with {} entries ({} restock counts)",
        report.list_id,
        report.entries,
        report.restocked.len()
    );
    let failed: Vec<Vec<String>> = report
        .needs_follow_up()
        .map(|o| vec![o.name.clone(), o.error.clone().unwrap_or_default()])
        .collect();
    if !failed.is_empty() {
        println!("Count these by hand:");
        println!("{}", pretty_table(&["Item", "Error"], failed));
    }
    if let Some(e) = &report.cleanup_error {
        println!("Warning: shopping overrides were not cleared: {}", e);
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = (sub.get_flag("json"), sub.get_flag("jsonl"));
    if let Some(raw) = sub.get_one::<String>("list") {
        let list_id = raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Invalid list id '{}'", raw))?;
        let entries = store::load_entries(conn, list_id)?;
        if !maybe_print_json(json_flag, jsonl_flag, &entries)? {
            let rows = entries
                .into_iter()
                .map(|e| {
                    vec![
                        e.name,
                        e.status,
                        fmt_qty(&e.current_qty),
                        fmt_qty(&e.desired_qty),
                        format!("{:.2}", e.unit_price),
                        e.provenance,
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Item", "Status", "Had", "Bought", "Price", "Source"], rows)
            );
        }
        return Ok(());
    }
    let lists = store::load_lists(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &lists)? {
        let rows = lists
            .into_iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.name,
                    l.status.to_string(),
                    l.created_at,
                    l.completed_at.unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Status", "Created", "Completed"], rows)
        );
    }
    Ok(())
}
