// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::str::FromStr;
use stockroom::commands::shopping::{complete_active_list, current_plan, set_row};
use stockroom::engine::shopping::Provenance;
use stockroom::engine::status::StockStatus;
use stockroom::error::StockroomError;
use stockroom::models::CountSource;
use stockroom::store::{self, NewCount};
use stockroom::{cli, commands, db};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn count(conn: &Connection, item_id: i64, date: &str, raw: &str) {
    store::upsert_count(
        conn,
        &NewCount {
            item_id,
            count_date: day(date),
            raw_value: raw.into(),
            value: None,
            unit: None,
            source: CountSource::Manual,
        },
    )
    .unwrap();
}

struct Fixture {
    conn: Connection,
    milk: i64,
    rice: i64,
    salt: i64,
}

// milk: low (1 of 4), rice: out (0 of 2), salt: fine (5 of 1)
fn setup() -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let milk = store::insert_item(&conn, "Milk", "L", Some(d("4")), None).unwrap();
    let rice = store::insert_item(&conn, "Rice", "kg", Some(d("2")), None).unwrap();
    let salt = store::insert_item(&conn, "Salt", "pkt", Some(d("1")), None).unwrap();
    count(&conn, milk, "2025-01-10", "1 L");
    count(&conn, rice, "2025-01-10", "0");
    count(&conn, salt, "2025-01-10", "5 pkt");
    Fixture {
        conn,
        milk,
        rice,
        salt,
    }
}

fn latest_raw(conn: &Connection, item_id: i64) -> (String, String) {
    conn.query_row(
        "SELECT raw_value, source FROM stock_counts WHERE item_id=?1
         ORDER BY count_date DESC, id DESC LIMIT 1",
        params![item_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .unwrap()
}

#[test]
fn out_of_stock_rows_come_first_with_suggested_quantities() {
    let f = setup();
    let plan = current_plan(&f.conn).unwrap();
    let ids: Vec<i64> = plan.rows.iter().map(|r| r.item_id).collect();
    assert_eq!(ids, vec![f.rice, f.milk]);
    assert_eq!(plan.rows[0].status, StockStatus::OutOfStock);
    assert_eq!(plan.rows[0].desired_qty, d("2"));
    assert_eq!(plan.rows[1].status, StockStatus::LowStock);
    assert_eq!(plan.rows[1].desired_qty, d("3"));
    assert!(plan.rows.iter().all(|r| r.provenance == Provenance::Automatic));
    assert_eq!(plan.total, Decimal::ZERO);
}

#[test]
fn editing_a_row_twice_is_idempotent() {
    let f = setup();
    set_row(&f.conn, f.milk, d("6"), Some(d("2.50"))).unwrap();
    let first = current_plan(&f.conn).unwrap();
    set_row(&f.conn, f.milk, d("6"), Some(d("2.50"))).unwrap();
    let second = current_plan(&f.conn).unwrap();
    assert_eq!(first.rows, second.rows);
    assert_eq!(second.total, d("15.00"));

    let overrides: i64 = f
        .conn
        .query_row("SELECT COUNT(*) FROM shopping_overrides", [], |r| r.get(0))
        .unwrap();
    assert_eq!(overrides, 1);
}

#[test]
fn editing_an_in_stock_item_adds_it_by_hand() {
    let f = setup();
    set_row(&f.conn, f.salt, d("2"), None).unwrap();
    let plan = current_plan(&f.conn).unwrap();
    let salt = plan.rows.iter().find(|r| r.item_id == f.salt).unwrap();
    assert_eq!(salt.provenance, Provenance::Manual);
    assert_eq!(salt.status, StockStatus::InStock);
    assert_eq!(salt.desired_qty, d("2"));
    // manual rows sort after the flagged ones
    assert_eq!(plan.rows.last().unwrap().item_id, f.salt);
}

#[test]
fn removed_item_can_be_added_back() {
    let f = setup();
    store::exclude_item(&f.conn, f.rice).unwrap();
    let plan = current_plan(&f.conn).unwrap();
    assert!(plan.rows.iter().all(|r| r.item_id != f.rice));

    store::add_manual_item(&f.conn, f.rice).unwrap();
    let plan = current_plan(&f.conn).unwrap();
    let rice = plan.rows.iter().find(|r| r.item_id == f.rice).unwrap();
    // still flagged by its count, and back on the suggested quantity
    assert_eq!(rice.provenance, Provenance::Automatic);
    assert_eq!(rice.desired_qty, d("2"));
}

#[test]
fn completion_snapshots_restocks_and_resets() {
    let mut f = setup();
    set_row(&f.conn, f.milk, d("3"), Some(d("1.20"))).unwrap();
    let report = complete_active_list(&mut f.conn, day("2025-02-01")).unwrap();

    assert_eq!(report.entries, 2);
    assert_eq!(report.total, d("3.60"));
    assert_eq!(report.restocked.len(), 2);
    assert_eq!(report.needs_follow_up().count(), 0);
    assert!(report.cleanup_error.is_none());

    assert_eq!(
        latest_raw(&f.conn, f.milk),
        ("4 L".to_string(), "shopping_list".to_string())
    );
    assert_eq!(latest_raw(&f.conn, f.rice).0, "2 kg");

    let lists = store::load_lists(&f.conn).unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].status.as_str(), "done");
    assert!(lists[0].completed_at.is_some());
    assert!(store::active_list(&f.conn).unwrap().is_none());

    let entries = store::load_entries(&f.conn, report.list_id).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].unit_price, d("1.20"));

    assert!(store::load_overrides(&f.conn).unwrap().is_empty());
    assert!(store::load_manual_items(&f.conn).unwrap().is_empty());
}

#[test]
fn completing_twice_on_one_day_keeps_one_count_per_item() {
    let mut f = setup();
    complete_active_list(&mut f.conn, day("2025-02-01")).unwrap();
    // milk was topped up to its threshold; buy two more
    set_row(&f.conn, f.milk, d("2"), None).unwrap();
    let second = complete_active_list(&mut f.conn, day("2025-02-01")).unwrap();

    assert_eq!(second.restocked.len(), 1);
    assert_eq!(latest_raw(&f.conn, f.milk).0, "6 L");
    let rows: i64 = f
        .conn
        .query_row(
            "SELECT COUNT(*) FROM stock_counts WHERE item_id=?1 AND count_date='2025-02-01'",
            params![f.milk],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(store::load_lists(&f.conn).unwrap().len(), 2);
}

#[test]
fn failed_status_flip_rolls_back_the_snapshot() {
    let mut f = setup();
    set_row(&f.conn, f.milk, d("3"), None).unwrap();
    f.conn
        .execute_batch(
            "CREATE TRIGGER freeze_lists BEFORE UPDATE ON shopping_lists
             BEGIN SELECT RAISE(IGNORE); END;",
        )
        .unwrap();

    let err = complete_active_list(&mut f.conn, day("2025-02-01")).unwrap_err();
    assert!(matches!(err, StockroomError::ListNotActive(_)));

    let (lists, entries): (i64, i64) = f
        .conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM shopping_lists),
                    (SELECT COUNT(*) FROM shopping_list_entries)",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!((lists, entries), (0, 0));
    assert_eq!(latest_raw(&f.conn, f.milk).0, "1 L");
    assert_eq!(store::load_overrides(&f.conn).unwrap().len(), 1);
}

#[test]
fn failed_restock_write_is_reported_not_fatal() {
    let mut f = setup();
    f.conn
        .execute_batch(&format!(
            "CREATE TRIGGER no_rice BEFORE INSERT ON stock_counts WHEN NEW.item_id = {}
             BEGIN SELECT RAISE(ABORT, 'rice counts locked'); END;",
            f.rice
        ))
        .unwrap();

    let report = complete_active_list(&mut f.conn, day("2025-02-01")).unwrap();
    let failed: Vec<i64> = report.needs_follow_up().map(|o| o.item_id).collect();
    assert_eq!(failed, vec![f.rice]);
    assert_eq!(latest_raw(&f.conn, f.milk).0, "4 L");
    assert_eq!(latest_raw(&f.conn, f.rice).0, "0");
    assert!(store::active_list(&f.conn).unwrap().is_none());
}

#[test]
fn row_edit_is_all_or_nothing() {
    let f = setup();
    f.conn
        .execute_batch(
            "CREATE TRIGGER lock_manual BEFORE INSERT ON shopping_manual_items
             BEGIN SELECT RAISE(ABORT, 'manual list locked'); END;",
        )
        .unwrap();

    // salt is in stock, so the edit has to opt it in by hand
    assert!(set_row(&f.conn, f.salt, d("9"), Some(d("3"))).is_err());
    assert!(store::load_overrides(&f.conn).unwrap().is_empty());

    count(&f.conn, f.salt, "2025-01-11", "0");
    let plan = current_plan(&f.conn).unwrap();
    let salt = plan.rows.iter().find(|r| r.item_id == f.salt).unwrap();
    assert_eq!(salt.desired_qty, d("1"));
    assert_eq!(salt.unit_price, Decimal::ZERO);
}

#[test]
fn inactive_items_cannot_be_put_on_the_list() {
    let mut f = setup();
    store::deactivate_item(&f.conn, f.salt).unwrap();
    for args in [
        vec!["stockroom", "shopping", "add", "--item", "Salt"],
        vec!["stockroom", "shopping", "set", "--item", "Salt", "--qty", "2"],
    ] {
        let matches = cli::build_cli().get_matches_from(args);
        let Some(("shopping", sub)) = matches.subcommand() else {
            panic!("no shopping subcommand");
        };
        let err = commands::shopping::handle(&mut f.conn, sub).unwrap_err();
        assert!(err.to_string().contains("inactive"));
    }
    assert!(store::load_manual_items(&f.conn).unwrap().is_empty());
    assert!(store::load_overrides(&f.conn).unwrap().is_empty());
}

#[test]
fn only_one_list_can_be_active() {
    let f = setup();
    store::insert_list(&f.conn, "first").unwrap();
    assert!(store::insert_list(&f.conn, "second").is_err());
}

#[test]
fn cli_set_trims_item_name() {
    let mut f = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "stockroom", "shopping", "set", "--item", "  Milk ", "--qty", " 5 ", "--price", "2",
    ]);
    if let Some(("shopping", sub)) = matches.subcommand() {
        commands::shopping::handle(&mut f.conn, sub).unwrap();
    } else {
        panic!("no shopping subcommand");
    }
    let plan = current_plan(&f.conn).unwrap();
    let milk = plan.rows.iter().find(|r| r.item_id == f.milk).unwrap();
    assert_eq!(milk.desired_qty, d("5"));
    assert_eq!(milk.amount, d("10"));
}
