// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::MovementKind;
use crate::store;
use crate::utils::{fmt_qty, id_for_item, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("in", sub)) => record(conn, sub, MovementKind::In)?,
        Some(("out", sub)) => record(conn, sub, MovementKind::Out)?,
        Some(("adjust", sub)) => record(conn, sub, MovementKind::Adjust)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn record(conn: &Connection, sub: &clap::ArgMatches, kind: MovementKind) -> Result<()> {
    let item = sub.get_one::<String>("item").unwrap();
    let raw_qty = parse_decimal(sub.get_one::<String>("qty").unwrap())?;
    // in/out are magnitudes; only adjustments carry a sign
    let qty = match kind {
        MovementKind::Adjust => raw_qty,
        _ => raw_qty.abs(),
    };
    let cost = match sub.get_one::<String>("cost") {
        Some(raw) => Some(parse_decimal(raw)?),
        None => None,
    };
    let at = sub.get_one::<String>("at").map(|s| s.trim());
    let item_id = id_for_item(conn, item)?;
    store::insert_movement(conn, item_id, kind, qty, cost, at)?;
    println!("Recorded {} {} of '{}'", kind, qty, item.trim());
    Ok(())
}

#[derive(Serialize)]
pub struct MovementRow {
    pub moved_at: String,
    pub item: String,
    pub kind: String,
    pub quantity: String,
    pub unit_cost: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let item_id = match sub.get_one::<String>("item") {
        Some(name) => Some(id_for_item(conn, name)?),
        None => None,
    };
    let names: HashMap<i64, String> = store::load_items(conn, true)?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();
    let mut movements = store::load_movements(conn, item_id)?;
    movements.reverse();
    let data: Vec<MovementRow> = movements
        .into_iter()
        .map(|mv| MovementRow {
            moved_at: mv.moved_at,
            item: names.get(&mv.item_id).cloned().unwrap_or_default(),
            kind: mv.kind.to_string(),
            quantity: mv.quantity.as_ref().map(fmt_qty).unwrap_or_default(),
            unit_cost: mv
                .unit_cost
                .map(|c| format!("{:.2}", c))
                .unwrap_or_default(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.moved_at, r.item, r.kind, r.quantity, r.unit_cost])
            .collect();
        println!(
            "{}",
            pretty_table(&["When", "Item", "Kind", "Qty", "Unit cost"], rows)
        );
    }
    Ok(())
}
