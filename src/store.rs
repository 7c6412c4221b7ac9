// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed reads and writes against the relational store.
//!
//! Nothing here is cached: every loader re-reads raw rows so derived state is
//! always recomputed from what is actually persisted.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::engine::counts::Count;
use crate::engine::shopping::{ItemSnapshot, ShoppingRow};
use crate::error::{Result, StockroomError};
use crate::models::{
    CountSource, Item, ListStatus, Member, MovementKind, Receipt, ReceiptStatus, Recurrence,
    Reminder, Role, ShoppingList, ShoppingListEntry, ShoppingListOverride, StockCount,
    StockMovement,
};
use crate::utils::lenient_decimal;

fn decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = r.get(idx)?;
    Ok(lenient_decimal(raw.as_deref()))
}

fn enum_col<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = StockroomError>,
{
    let raw: String = r.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------- items

pub fn insert_item(
    conn: &Connection,
    name: &str,
    unit: &str,
    reorder_level: Option<Decimal>,
    category_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO items(name, unit, reorder_level, category_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            name.trim(),
            unit.trim(),
            reorder_level.map(|d| d.to_string()),
            category_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_reorder_level(conn: &Connection, item_id: i64, level: Option<Decimal>) -> Result<()> {
    let n = conn.execute(
        "UPDATE items SET reorder_level=?2 WHERE id=?1",
        params![item_id, level.map(|d| d.to_string())],
    )?;
    if n == 0 {
        return Err(StockroomError::not_found("Item", item_id));
    }
    Ok(())
}

pub fn deactivate_item(conn: &Connection, item_id: i64) -> Result<()> {
    let n = conn.execute("UPDATE items SET active=0 WHERE id=?1", params![item_id])?;
    if n == 0 {
        return Err(StockroomError::not_found("Item", item_id));
    }
    Ok(())
}

pub fn load_items(conn: &Connection, include_inactive: bool) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.name, i.unit, i.reorder_level, i.category_id, c.name, i.active
         FROM items i LEFT JOIN categories c ON i.category_id=c.id
         WHERE ?1 OR i.active=1
         ORDER BY i.name, i.id",
    )?;
    let rows = stmt.query_map(params![include_inactive], |r| {
        Ok(Item {
            id: r.get(0)?,
            name: r.get(1)?,
            unit: r.get(2)?,
            reorder_level: decimal_col(r, 3)?,
            category_id: r.get(4)?,
            category: r.get(5)?,
            active: r.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Active items joined with their latest count, ready for classification.
pub fn item_snapshots(conn: &Connection) -> Result<Vec<ItemSnapshot>> {
    let items = load_items(conn, false)?;
    let latest = load_latest_counts(conn)?;
    Ok(items
        .into_iter()
        .map(|item| {
            let count = latest
                .get(&item.id)
                .map(|c| Count::from_raw(c.raw_value.as_deref(), c.value));
            ItemSnapshot {
                item_id: item.id,
                name: item.name,
                category: item.category,
                unit: item.unit,
                reorder_level: item.reorder_level,
                count,
            }
        })
        .collect())
}

// ---------------------------------------------------------------- movements

pub fn insert_movement(
    conn: &Connection,
    item_id: i64,
    kind: MovementKind,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
    moved_at: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO stock_movements(item_id, kind, quantity, unit_cost, moved_at)
         VALUES (?1, ?2, ?3, ?4, COALESCE(?5, datetime('now')))",
        params![
            item_id,
            kind.as_str(),
            quantity.to_string(),
            unit_cost.map(|d| d.to_string()),
            moved_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_movements(conn: &Connection, item_id: Option<i64>) -> Result<Vec<StockMovement>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, kind, quantity, unit_cost, moved_at FROM stock_movements
         WHERE ?1 IS NULL OR item_id=?1
         ORDER BY moved_at, id",
    )?;
    let rows = stmt.query_map(params![item_id], |r| {
        Ok(StockMovement {
            id: r.get(0)?,
            item_id: r.get(1)?,
            kind: enum_col(r, 2)?,
            quantity: decimal_col(r, 3)?,
            unit_cost: decimal_col(r, 4)?,
            moved_at: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------- counts

#[derive(Debug, Clone)]
pub struct NewCount {
    pub item_id: i64,
    pub count_date: NaiveDate,
    pub raw_value: String,
    pub value: Option<Decimal>,
    pub unit: Option<String>,
    pub source: CountSource,
}

/// One logical count per (item, date): a later write for the same day replaces the earlier one.
pub fn upsert_count(conn: &Connection, count: &NewCount) -> Result<()> {
    conn.execute(
        "INSERT INTO stock_counts(item_id, count_date, raw_value, value, unit, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(item_id, count_date) DO UPDATE SET
            raw_value=excluded.raw_value,
            value=excluded.value,
            unit=excluded.unit,
            source=excluded.source,
            updated_at=datetime('now')",
        params![
            count.item_id,
            count.count_date,
            count.raw_value,
            count.value.map(|d| d.to_string()),
            count.unit,
            count.source.as_str()
        ],
    )?;
    Ok(())
}

fn count_from_row(r: &Row<'_>) -> rusqlite::Result<StockCount> {
    Ok(StockCount {
        id: r.get(0)?,
        item_id: r.get(1)?,
        count_date: r.get(2)?,
        raw_value: r.get(3)?,
        value: decimal_col(r, 4)?,
        unit: r.get(5)?,
        source: enum_col(r, 6)?,
    })
}

pub fn load_latest_counts(conn: &Connection) -> Result<HashMap<i64, StockCount>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, item_id, count_date, raw_value, value, unit, source FROM (
             SELECT *,
                    ROW_NUMBER() OVER (
                        PARTITION BY item_id
                        ORDER BY count_date DESC, id DESC
                    ) AS rn
             FROM stock_counts
         ) WHERE rn = 1",
    )?;
    let rows = stmt.query_map([], count_from_row)?;
    let mut out = HashMap::new();
    for row in rows {
        let c = row?;
        out.insert(c.item_id, c);
    }
    Ok(out)
}

pub fn load_counts_between(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<StockCount>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, count_date, raw_value, value, unit, source FROM stock_counts
         WHERE count_date BETWEEN ?1 AND ?2
         ORDER BY count_date, item_id",
    )?;
    let rows = stmt.query_map(params![from, to], count_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------- receipts

#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub owner: String,
    pub vendor: String,
    pub category: Option<String>,
    pub amount: Decimal,
    pub amount_received: Decimal,
    pub payment_method: Option<String>,
    pub receipt_date: NaiveDate,
    pub reference: Option<String>,
    /// Defaults to the store clock.
    pub created_at: Option<String>,
}

pub fn insert_receipt(conn: &Connection, r: &NewReceipt) -> Result<i64> {
    conn.execute(
        "INSERT INTO receipts(owner, vendor, category, amount, amount_received, payment_method,
                              status, receipt_date, reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8,
                 COALESCE(?9, strftime('%Y-%m-%d %H:%M:%f','now')))",
        params![
            r.owner,
            r.vendor,
            r.category,
            r.amount.to_string(),
            r.amount_received.to_string(),
            r.payment_method,
            r.receipt_date,
            r.reference,
            r.created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptFilter {
    pub owner: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub fn load_receipts(conn: &Connection, filter: &ReceiptFilter) -> Result<Vec<Receipt>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, vendor, category, amount, amount_received, payment_method,
                status, receipt_date, created_at, reference
         FROM receipts
         WHERE (?1 IS NULL OR owner=?1)
           AND (?2 IS NULL OR receipt_date>=?2)
           AND (?3 IS NULL OR receipt_date<=?3)",
    )?;
    let rows = stmt.query_map(params![filter.owner, filter.from, filter.to], |r| {
        Ok(Receipt {
            id: r.get(0)?,
            owner: r.get(1)?,
            vendor: r.get(2)?,
            category: r.get(3)?,
            amount: decimal_col(r, 4)?.unwrap_or(Decimal::ZERO),
            amount_received: decimal_col(r, 5)?.unwrap_or(Decimal::ZERO),
            payment_method: r.get(6)?,
            status: enum_col(r, 7)?,
            receipt_date: r.get(8)?,
            created_at: r.get(9)?,
            reference: r.get(10)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn receipt_status(conn: &Connection, id: i64) -> Result<ReceiptStatus> {
    let raw: Option<String> = conn
        .query_row("SELECT status FROM receipts WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .optional()?;
    raw.ok_or_else(|| StockroomError::not_found("Receipt", id))?
        .parse::<ReceiptStatus>()
}

/// Conditional on the status the caller observed; returns rows changed.
pub fn update_receipt_status(
    conn: &Connection,
    id: i64,
    from: ReceiptStatus,
    to: ReceiptStatus,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE receipts SET status=?3 WHERE id=?1 AND status=?2",
        params![id, from.as_str(), to.as_str()],
    )?)
}

// ---------------------------------------------------------------- reminders

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub title: String,
    pub notes: Option<String>,
    pub start_at: String,
    pub recurrence: Recurrence,
    pub color: Option<String>,
}

pub fn insert_reminder(conn: &Connection, r: &NewReminder) -> Result<i64> {
    conn.execute(
        "INSERT INTO reminders(owner, title, notes, start_at, recurrence, color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            r.owner,
            r.title,
            r.notes,
            r.start_at,
            r.recurrence.as_str(),
            r.color
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_reminders(conn: &Connection, owner: Option<&str>) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, title, notes, start_at, recurrence, color FROM reminders
         WHERE ?1 IS NULL OR owner=?1
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![owner], |r| {
        Ok(Reminder {
            id: r.get(0)?,
            owner: r.get(1)?,
            title: r.get(2)?,
            notes: r.get(3)?,
            start_at: r.get(4)?,
            recurrence: enum_col(r, 5)?,
            color: r.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------- shopping

pub fn load_overrides(conn: &Connection) -> Result<HashMap<i64, ShoppingListOverride>> {
    let mut stmt =
        conn.prepare("SELECT item_id, desired_qty, unit_price, excluded FROM shopping_overrides")?;
    let rows = stmt.query_map([], |r| {
        Ok(ShoppingListOverride {
            item_id: r.get(0)?,
            desired_qty: decimal_col(r, 1)?,
            unit_price: decimal_col(r, 2)?,
            excluded: r.get(3)?,
        })
    })?;
    let mut out = HashMap::new();
    for row in rows {
        let o = row?;
        out.insert(o.item_id, o);
    }
    Ok(out)
}

/// Writes quantity and price together; an edit always re-includes the item.
pub fn upsert_override(
    conn: &Connection,
    item_id: i64,
    desired_qty: Decimal,
    unit_price: Option<Decimal>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO shopping_overrides(item_id, desired_qty, unit_price, excluded)
         VALUES (?1, ?2, ?3, 0)
         ON CONFLICT(item_id) DO UPDATE SET
            desired_qty=excluded.desired_qty,
            unit_price=excluded.unit_price,
            excluded=0,
            updated_at=datetime('now')",
        params![
            item_id,
            desired_qty.to_string(),
            unit_price.map(|d| d.to_string())
        ],
    )?;
    Ok(())
}

/// Removal is an exclusion override, never a delete of history.
pub fn exclude_item(conn: &Connection, item_id: i64) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO shopping_overrides(item_id, desired_qty, unit_price, excluded)
         VALUES (?1, '0', NULL, 1)
         ON CONFLICT(item_id) DO UPDATE SET
            desired_qty='0',
            excluded=1,
            updated_at=datetime('now')",
        params![item_id],
    )?;
    tx.execute(
        "DELETE FROM shopping_manual_items WHERE item_id=?1",
        params![item_id],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn add_manual_item(conn: &Connection, item_id: i64) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    include_manual_item(&tx, item_id)?;
    tx.commit()?;
    Ok(())
}

/// Manual opt-in without its own transaction; the caller commits.
pub fn include_manual_item(conn: &Connection, item_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO shopping_manual_items(item_id) VALUES (?1)",
        params![item_id],
    )?;
    conn.execute(
        "UPDATE shopping_overrides SET excluded=0, desired_qty=NULL, updated_at=datetime('now')
         WHERE item_id=?1 AND excluded=1",
        params![item_id],
    )?;
    Ok(())
}

pub fn load_manual_items(conn: &Connection) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT item_id FROM shopping_manual_items")?;
    let rows = stmt.query_map([], |r| r.get::<_, i64>(0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

/// Returns the list to its fully automatic baseline.
pub fn clear_shopping_state(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM shopping_overrides", [])?;
    tx.execute("DELETE FROM shopping_manual_items", [])?;
    tx.commit()?;
    Ok(())
}

fn list_from_row(r: &Row<'_>) -> rusqlite::Result<ShoppingList> {
    Ok(ShoppingList {
        id: r.get(0)?,
        name: r.get(1)?,
        status: enum_col::<ListStatus>(r, 2)?,
        created_at: r.get(3)?,
        completed_at: r.get(4)?,
    })
}

pub fn active_list(conn: &Connection) -> Result<Option<ShoppingList>> {
    Ok(conn
        .query_row(
            "SELECT id, name, status, created_at, completed_at FROM shopping_lists
             WHERE status='active' ORDER BY id LIMIT 1",
            [],
            list_from_row,
        )
        .optional()?)
}

pub fn load_lists(conn: &Connection) -> Result<Vec<ShoppingList>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, status, created_at, completed_at FROM shopping_lists
         ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], list_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_list(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO shopping_lists(name, status) VALUES (?1, 'active')",
        params![name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_entries(conn: &Connection, list_id: i64, rows: &[ShoppingRow]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO shopping_list_entries(list_id, item_id, name, category, unit, current_qty,
                                           desired_qty, unit_price, status, provenance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for row in rows {
        stmt.execute(params![
            list_id,
            row.item_id,
            row.name,
            row.category,
            row.unit,
            row.current_qty.to_string(),
            row.desired_qty.to_string(),
            row.unit_price.to_string(),
            row.status.as_str(),
            row.provenance.as_str()
        ])?;
    }
    Ok(())
}

/// Flips `active -> done` only if the list is still active; returns rows changed.
pub fn mark_list_done(conn: &Connection, list_id: i64) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE shopping_lists SET status='done', completed_at=datetime('now')
         WHERE id=?1 AND status='active'",
        params![list_id],
    )?)
}

pub fn load_entries(conn: &Connection, list_id: i64) -> Result<Vec<ShoppingListEntry>> {
    let mut stmt = conn.prepare(
        "SELECT list_id, item_id, name, category, unit, current_qty, desired_qty, unit_price,
                status, provenance
         FROM shopping_list_entries WHERE list_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![list_id], |r| {
        Ok(ShoppingListEntry {
            list_id: r.get(0)?,
            item_id: r.get(1)?,
            name: r.get(2)?,
            category: r.get(3)?,
            unit: r.get(4)?,
            current_qty: decimal_col(r, 5)?.unwrap_or(Decimal::ZERO),
            desired_qty: decimal_col(r, 6)?.unwrap_or(Decimal::ZERO),
            unit_price: decimal_col(r, 7)?.unwrap_or(Decimal::ZERO),
            status: r.get(8)?,
            provenance: r.get(9)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------- members

pub fn member_role(conn: &Connection, name: &str) -> Result<Option<Role>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT role FROM members WHERE name=?1",
            params![name.trim()],
            |r| r.get(0),
        )
        .optional()?;
    raw.map(|s| s.parse::<Role>()).transpose()
}

pub fn load_members(conn: &Connection) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare("SELECT id, name, role FROM members ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Member {
            id: r.get(0)?,
            name: r.get(1)?,
            role: enum_col(r, 2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_members(conn: &Connection, role: Option<Role>) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM members WHERE ?1 IS NULL OR role=?1",
        params![role.map(|r| r.as_str())],
        |r| r.get(0),
    )?)
}

pub fn insert_member(conn: &Connection, name: &str, role: Role) -> Result<i64> {
    conn.execute(
        "INSERT INTO members(name, role) VALUES (?1, ?2)",
        params![name.trim(), role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_member_role(conn: &Connection, name: &str, role: Role) -> Result<()> {
    let n = conn.execute(
        "UPDATE members SET role=?2 WHERE name=?1",
        params![name.trim(), role.as_str()],
    )?;
    if n == 0 {
        return Err(StockroomError::not_found("Member", name.trim()));
    }
    Ok(())
}

// ---------------------------------------------------------------- notifications

pub fn read_keys(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT key FROM notification_reads")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

pub fn mark_read(conn: &Connection, key: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO notification_reads(key) VALUES (?1)",
        params![key.trim()],
    )?;
    Ok(())
}
