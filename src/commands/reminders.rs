// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::schedule::{is_due_today, next_occurrence, parse_timestamp};
use crate::models::{Recurrence, Reminder};
use crate::store::{self, NewReminder};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => {
            let now = now_arg(sub)?;
            let owner = sub.get_one::<String>("owner").map(|s| s.trim());
            print_schedule(sub, upcoming(conn, owner, now)?)?;
        }
        Some(("due", sub)) => {
            let now = now_arg(sub)?;
            let owner = sub.get_one::<String>("owner").map(|s| s.trim());
            print_schedule(sub, due_reminders(conn, owner, now)?)?;
        }
        _ => {}
    }
    Ok(())
}

/// `--now` override, otherwise the local clock.
pub fn now_arg(sub: &clap::ArgMatches) -> Result<DateTime<FixedOffset>> {
    match sub.get_one::<String>("now") {
        Some(raw) => parse_timestamp(raw).with_context(|| format!("Invalid --now '{}'", raw)),
        None => Ok(Local::now().fixed_offset()),
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let start = sub.get_one::<String>("start").unwrap().trim().to_string();
    // stored start times must stay parseable
    parse_timestamp(&start)?;
    let recurrence = sub
        .get_one::<String>("recurrence")
        .unwrap()
        .parse::<Recurrence>()?;
    let text = |name: &str| {
        sub.get_one::<String>(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };
    let reminder = NewReminder {
        owner: sub.get_one::<String>("owner").unwrap().trim().to_string(),
        title: sub.get_one::<String>("title").unwrap().trim().to_string(),
        notes: text("notes"),
        start_at: start,
        recurrence,
        color: text("color"),
    };
    let id = store::insert_reminder(conn, &reminder)?;
    println!("Added reminder {} '{}' ({})", id, reminder.title, recurrence);
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Scheduled {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub next: Option<DateTime<FixedOffset>>,
    pub due_today: bool,
}

/// Every reminder with its next occurrence at or after `now`.
/// Rows whose start cannot be parsed are logged and skipped.
pub fn upcoming(
    conn: &Connection,
    owner: Option<&str>,
    now: DateTime<FixedOffset>,
) -> crate::error::Result<Vec<Scheduled>> {
    let mut out = Vec::new();
    for reminder in store::load_reminders(conn, owner)? {
        let start = match parse_timestamp(&reminder.start_at) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(reminder = reminder.id, error = %e, "skipping reminder");
                continue;
            }
        };
        let next = next_occurrence(start, reminder.recurrence, now);
        let due_today = is_due_today(start, reminder.recurrence, now);
        out.push(Scheduled {
            reminder,
            next,
            due_today,
        });
    }
    out.sort_by(|a, b| match (a.next, b.next) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.reminder.id.cmp(&b.reminder.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.reminder.id.cmp(&b.reminder.id),
    });
    Ok(out)
}

pub fn due_reminders(
    conn: &Connection,
    owner: Option<&str>,
    now: DateTime<FixedOffset>,
) -> crate::error::Result<Vec<Scheduled>> {
    Ok(upcoming(conn, owner, now)?
        .into_iter()
        .filter(|s| s.due_today)
        .collect())
}

fn print_schedule(sub: &clap::ArgMatches, items: Vec<Scheduled>) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        return Ok(());
    }
    let rows = items
        .into_iter()
        .map(|s| {
            vec![
                s.reminder.id.to_string(),
                s.reminder.owner,
                s.reminder.title,
                s.reminder.recurrence.to_string(),
                s.next
                    .map(|n| n.format("%Y-%m-%d %H:%M %:z").to_string())
                    .unwrap_or_else(|| "-".into()),
                if s.due_today { "today".into() } else { String::new() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Owner", "Title", "Repeats", "Next", "Due"], rows)
    );
    Ok(())
}
