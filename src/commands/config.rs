// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_currency, get_setting, pretty_table, set_setting};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let rows = vec![
                vec!["database".into(), crate::db::db_path()?.display().to_string()],
                vec!["currency".into(), get_currency(conn)?],
                vec![
                    "org_name".into(),
                    get_setting(conn, "org_name")?.unwrap_or_default(),
                ],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set-currency", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap().trim().to_uppercase();
            set_setting(conn, "currency", &ccy)?;
            println!("Currency set to {}", ccy);
        }
        Some(("set-org", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            set_setting(conn, "org_name", name)?;
            println!("Organization set to '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
