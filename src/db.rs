// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.stockroom", "Stockroom", "stockroom"));

/// Environment variable that points the CLI at a specific database file.
pub const DB_ENV: &str = "STOCKROOM_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("stockroom.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS members(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL CHECK(role IN ('owner','admin','member')),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    -- items are soft-deleted through `active`; history must stay attributable
    CREATE TABLE IF NOT EXISTS items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        unit TEXT NOT NULL DEFAULT '',
        reorder_level TEXT,
        category_id INTEGER,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS stock_movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('in','out','adjust')),
        quantity TEXT,
        unit_cost TEXT,
        moved_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(item_id) REFERENCES items(id)
    );
    CREATE INDEX IF NOT EXISTS idx_movements_item ON stock_movements(item_id);

    CREATE TABLE IF NOT EXISTS stock_counts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL,
        count_date TEXT NOT NULL,
        raw_value TEXT,
        value TEXT,
        unit TEXT,
        source TEXT NOT NULL DEFAULT 'manual',
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(item_id, count_date),
        FOREIGN KEY(item_id) REFERENCES items(id)
    );

    CREATE TABLE IF NOT EXISTS receipts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        vendor TEXT NOT NULL,
        category TEXT,
        amount TEXT NOT NULL DEFAULT '0',
        amount_received TEXT NOT NULL DEFAULT '0',
        payment_method TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        receipt_date TEXT NOT NULL,
        reference TEXT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
    );
    CREATE INDEX IF NOT EXISTS idx_receipts_date ON receipts(receipt_date);

    CREATE TABLE IF NOT EXISTS shopping_overrides(
        item_id INTEGER PRIMARY KEY,
        desired_qty TEXT,
        unit_price TEXT,
        excluded INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(item_id) REFERENCES items(id)
    );

    CREATE TABLE IF NOT EXISTS shopping_manual_items(
        item_id INTEGER PRIMARY KEY,
        added_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(item_id) REFERENCES items(id)
    );

    CREATE TABLE IF NOT EXISTS shopping_lists(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('active','done')),
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        completed_at TEXT
    );
    -- at most one active list
    CREATE UNIQUE INDEX IF NOT EXISTS idx_shopping_lists_one_active
        ON shopping_lists(status) WHERE status = 'active';

    CREATE TABLE IF NOT EXISTS shopping_list_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        list_id INTEGER NOT NULL,
        item_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        category TEXT,
        unit TEXT NOT NULL,
        current_qty TEXT NOT NULL,
        desired_qty TEXT NOT NULL,
        unit_price TEXT NOT NULL,
        status TEXT NOT NULL,
        provenance TEXT NOT NULL,
        FOREIGN KEY(list_id) REFERENCES shopping_lists(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reminders(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        title TEXT NOT NULL,
        notes TEXT,
        start_at TEXT NOT NULL,
        recurrence TEXT NOT NULL DEFAULT 'none',
        color TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS notification_reads(
        key TEXT PRIMARY KEY,
        read_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )
}
