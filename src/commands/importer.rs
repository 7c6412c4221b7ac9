// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CountSource;
use crate::store::{self, NewCount};
use crate::utils::{id_for_active_item, parse_date};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::collections::{HashMap, hash_map::Entry};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("counts", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_counts(conn, path)?;
            println!("Imported {} counts from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Reads `item,date,raw[,unit]` rows and upserts one count per (item, date).
/// Any bad row aborts the whole import.
pub fn import_counts(conn: &mut Connection, path: &str) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut item_cache: HashMap<String, i64> = HashMap::new();
    let mut imported = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let rec = result?;
        let item = rec.get(0).context("item missing")?.trim().to_string();
        let date_raw = rec.get(1).context("date missing")?.trim();
        let raw = rec.get(2).context("raw count missing")?.trim().to_string();
        let unit = rec
            .get(3)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let count_date = parse_date(date_raw)
            .with_context(|| format!("Row {}: invalid count date '{}'", line + 2, date_raw))?;
        let item_id = match item_cache.entry(item.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let fetched = id_for_active_item(&tx, &item)
                    .with_context(|| format!("Row {}", line + 2))?;
                *entry.insert(fetched)
            }
        };

        store::upsert_count(
            &tx,
            &NewCount {
                item_id,
                count_date,
                raw_value: raw,
                value: None,
                unit,
                source: CountSource::Manual,
            },
        )?;
        imported += 1;
    }
    tx.commit()?;
    tracing::info!(path, rows = imported, "imported stock counts");
    Ok(imported)
}
