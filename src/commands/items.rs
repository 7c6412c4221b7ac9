// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{fmt_qty, id_for_category, id_for_item, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("deactivate", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_item(conn, name)?;
            store::deactivate_item(conn, id)?;
            println!("Deactivated '{}' (history kept)", name.trim());
        }
        Some(("set-reorder", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let level = match sub.get_one::<String>("level") {
                Some(raw) => Some(parse_decimal(raw)?),
                None => None,
            };
            let id = id_for_item(conn, name)?;
            store::set_reorder_level(conn, id, level)?;
            match level {
                Some(l) => println!("Reorder level for '{}' set to {}", name.trim(), l),
                None => println!("Reorder level for '{}' cleared", name.trim()),
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let unit = sub.get_one::<String>("unit").unwrap().trim();
    let reorder = match sub.get_one::<String>("reorder") {
        Some(raw) => Some(parse_decimal(raw)?),
        None => None,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(cat) => Some(id_for_category(conn, cat)?),
        None => None,
    };
    store::insert_item(conn, name, unit, reorder, category_id)?;
    println!("Added item '{}'", name);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let items = store::load_items(conn, sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        let rows = items
            .into_iter()
            .map(|i| {
                vec![
                    i.name,
                    i.unit,
                    i.reorder_level.as_ref().map(fmt_qty).unwrap_or_default(),
                    i.category.unwrap_or_default(),
                    if i.active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Item", "Unit", "Reorder at", "Category", "Active"], rows)
        );
    }
    Ok(())
}
