// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::counts::normalize;
use crate::engine::schedule::parse_timestamp;
use crate::models::ReceiptStatus;
use crate::utils::{lenient_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = diagnose(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Read-only checks. Each finding is `[issue, detail]`.
pub fn diagnose(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Counts nobody can read a number from
    let mut stmt = conn.prepare(
        "SELECT i.name, s.count_date, s.raw_value, s.value FROM stock_counts s
         JOIN items i ON i.id=s.item_id ORDER BY s.count_date, i.name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let date: String = r.get(1)?;
        let raw: Option<String> = r.get(2)?;
        let value: Option<String> = r.get(3)?;
        if normalize(raw.as_deref(), lenient_decimal(value.as_deref())).is_none() {
            rows.push(vec![
                "unreadable_count".into(),
                format!("{} {} '{}'", date, name, raw.unwrap_or_default()),
            ]);
        }
    }

    // 2) Active items never counted
    let mut stmt = conn.prepare(
        "SELECT name FROM items i WHERE active=1
         AND NOT EXISTS (SELECT 1 FROM stock_counts s WHERE s.item_id=i.id) ORDER BY name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        rows.push(vec!["never_counted".into(), r.get::<_, String>(0)?]);
    }

    // 3) Receipt status outside the known set
    let mut stmt = conn.prepare("SELECT id, status FROM receipts ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let status: String = r.get(1)?;
        if status.parse::<ReceiptStatus>().is_err() {
            rows.push(vec!["bad_receipt_status".into(), format!("#{} '{}'", id, status)]);
        }
    }

    // 4) Reminder start times the scheduler would skip
    let mut stmt = conn.prepare("SELECT id, title, start_at FROM reminders ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let title: String = r.get(1)?;
        let start: String = r.get(2)?;
        if parse_timestamp(&start).is_err() {
            rows.push(vec![
                "bad_reminder_time".into(),
                format!("#{} {} '{}'", id, title, start),
            ]);
        }
    }

    // 5) More than one active list
    let active: i64 = conn.query_row(
        "SELECT COUNT(*) FROM shopping_lists WHERE status='active'",
        [],
        |r| r.get(0),
    )?;
    if active > 1 {
        rows.push(vec!["multiple_active_lists".into(), active.to_string()]);
    }

    Ok(rows)
}
