// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reminders::{due_reminders, now_arg};
use crate::engine::status::classify;
use crate::store;
use crate::utils::{fmt_qty, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let now = now_arg(sub)?;
            let mut alerts = notifications(conn, now)?;
            if sub.get_flag("unread") {
                alerts.retain(|a| !a.read);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &alerts)? {
                let rows = alerts
                    .into_iter()
                    .map(|a| {
                        vec![
                            a.key,
                            a.title,
                            a.detail,
                            if a.urgent { "!".into() } else { String::new() },
                            if a.read { "read".into() } else { "new".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Key", "Alert", "Detail", "Urgent", "State"], rows)
                );
            }
        }
        Some(("ack", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            store::mark_read(conn, key)?;
            println!("Acknowledged {}", key.trim());
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub key: String,
    pub title: String,
    pub detail: String,
    pub urgent: bool,
    pub read: bool,
}

/// Stock key: a status change yields a fresh alert for the same item.
pub fn stock_key(item_id: i64, status: &str) -> String {
    format!("stock:{}:{}", item_id, status)
}

/// Reminder key: each occurrence day is a separate alert.
pub fn reminder_key(reminder_id: i64, day: chrono::NaiveDate) -> String {
    format!("reminder:{}:{}", reminder_id, day.format("%Y-%m-%d"))
}

/// Items needing attention, then reminders due on `now`'s day. Urgent first.
pub fn notifications(
    conn: &Connection,
    now: DateTime<FixedOffset>,
) -> crate::error::Result<Vec<Notification>> {
    let read = store::read_keys(conn)?;
    let mut out = Vec::new();

    for snap in store::item_snapshots(conn)? {
        let c = classify(snap.count.as_ref(), snap.reorder_level);
        if !c.status.needs_attention() {
            continue;
        }
        let detail = match snap.count.as_ref().and_then(|n| n.value()) {
            Some(q) => format!("{} {}", fmt_qty(&q), snap.unit).trim().to_string(),
            None => "not counted".to_string(),
        };
        let key = stock_key(snap.item_id, c.status.as_str());
        out.push(Notification {
            read: read.contains(&key),
            key,
            title: format!("{} is {}", snap.name, c.status),
            detail,
            urgent: c.is_urgent,
        });
    }

    for due in due_reminders(conn, None, now)? {
        let Some(next) = due.next else {
            continue;
        };
        let day = next.with_timezone(now.offset()).date_naive();
        let key = reminder_key(due.reminder.id, day);
        out.push(Notification {
            read: read.contains(&key),
            key,
            title: due.reminder.title,
            detail: format!("{} ({})", next.format("%H:%M"), due.reminder.owner),
            urgent: false,
        });
    }

    out.sort_by_key(|n| !n.urgent);
    Ok(out)
}
