// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::counts::normalize;
use crate::models::CountSource;
use crate::store::{self, NewCount};
use crate::utils::{fmt_qty, id_for_active_item, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let item = sub.get_one::<String>("item").unwrap();
    let raw = sub.get_one::<String>("raw").unwrap().trim().to_string();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let value = match sub.get_one::<String>("value") {
        Some(v) => Some(parse_decimal(v)?),
        None => None,
    };
    let unit = sub
        .get_one::<String>("unit")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let item_id = id_for_active_item(conn, item)?;
    store::upsert_count(
        conn,
        &NewCount {
            item_id,
            count_date: date,
            raw_value: raw.clone(),
            value,
            unit,
            source: CountSource::Manual,
        },
    )?;
    match normalize(Some(&raw), value) {
        Some(q) => println!("Counted '{}' on {}: {} ({})", item.trim(), date, raw, fmt_qty(&q)),
        None => println!(
            "Counted '{}' on {}: {} (no number found; treated as unknown)",
            item.trim(),
            date,
            raw
        ),
    }
    Ok(())
}

#[derive(Serialize)]
pub struct CountRow {
    pub date: NaiveDate,
    pub item: String,
    pub raw: String,
    pub quantity: Option<String>,
    pub source: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let to = match sub.get_one::<String>("to") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let from = match sub.get_one::<String>("from") {
        Some(d) => parse_date(d)?,
        None => to - chrono::Duration::days(30),
    };
    let names: HashMap<i64, String> = store::load_items(conn, true)?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();
    let data: Vec<CountRow> = store::load_counts_between(conn, from, to)?
        .into_iter()
        .map(|c| CountRow {
            date: c.count_date,
            item: names.get(&c.item_id).cloned().unwrap_or_default(),
            quantity: normalize(c.raw_value.as_deref(), c.value).map(|q| fmt_qty(&q)),
            raw: c.raw_value.unwrap_or_default(),
            source: c.source.to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.date.to_string(),
                    r.item,
                    r.raw,
                    r.quantity.unwrap_or_else(|| "?".into()),
                    r.source,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Item", "Counted", "Qty", "Source"], rows)
        );
    }
    Ok(())
}
