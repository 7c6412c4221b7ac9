// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use stockroom::commands::members::add_member;
use stockroom::commands::receipts::{self, ledger_lines, set_status};
use stockroom::engine::balances::current_balance;
use stockroom::error::StockroomError;
use stockroom::models::{ReceiptStatus, Role};
use stockroom::store::{self, NewReceipt, ReceiptFilter};
use stockroom::{cli, db};

fn receipt(owner: &str, date: &str, spent: i64, received: i64, created: &str) -> NewReceipt {
    NewReceipt {
        owner: owner.into(),
        vendor: "Corner Shop".into(),
        category: None,
        amount: Decimal::from(spent),
        amount_received: Decimal::from(received),
        payment_method: None,
        receipt_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        reference: None,
        created_at: Some(created.into()),
    }
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    add_member(&conn, None, "ana", Role::Member).unwrap();
    add_member(&conn, Some("ana"), "bo", Role::Admin).unwrap();
    add_member(&conn, Some("ana"), "cy", Role::Member).unwrap();
    conn
}

fn status_of(conn: &Connection, id: i64) -> ReceiptStatus {
    store::receipt_status(conn, id).unwrap()
}

#[test]
fn balances_follow_date_order_not_insert_order() {
    let conn = setup();
    let r3 = store::insert_receipt(&conn, &receipt("cy", "2025-03-03", 50, 0, "2025-03-03 09:00:00.000")).unwrap();
    let r1 = store::insert_receipt(&conn, &receipt("ana", "2025-03-01", 200, 1000, "2025-03-01 09:00:00.000")).unwrap();
    let r2 = store::insert_receipt(&conn, &receipt("cy", "2025-03-02", 100, 0, "2025-03-02 09:00:00.000")).unwrap();

    let lines = ledger_lines(&conn, &ReceiptFilter::default()).unwrap();
    let got: Vec<(i64, Decimal, Decimal)> = lines
        .iter()
        .map(|l| (l.receipt.id, l.previous_balance, l.balance))
        .collect();
    assert_eq!(
        got,
        vec![
            (r3, Decimal::from(700), Decimal::from(650)),
            (r2, Decimal::from(800), Decimal::from(700)),
            (r1, Decimal::ZERO, Decimal::from(800)),
        ]
    );
    let all = store::load_receipts(&conn, &ReceiptFilter::default()).unwrap();
    assert_eq!(current_balance(&all), Decimal::from(650));
}

#[test]
fn owner_filter_narrows_rows_but_keeps_org_balances() {
    let conn = setup();
    store::insert_receipt(&conn, &receipt("ana", "2025-03-01", 200, 1000, "2025-03-01 09:00:00.000")).unwrap();
    let r2 = store::insert_receipt(&conn, &receipt("cy", "2025-03-02", 100, 0, "2025-03-02 09:00:00.000")).unwrap();

    let filter = ReceiptFilter {
        owner: Some("cy".into()),
        ..Default::default()
    };
    let lines = ledger_lines(&conn, &filter).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].receipt.id, r2);
    assert_eq!(lines[0].previous_balance, Decimal::from(800));
    assert_eq!(lines[0].balance, Decimal::from(700));
}

#[test]
fn same_day_receipts_fold_in_creation_order() {
    let conn = setup();
    let late = store::insert_receipt(&conn, &receipt("ana", "2025-03-01", 30, 0, "2025-03-01 18:00:00.000")).unwrap();
    let early = store::insert_receipt(&conn, &receipt("ana", "2025-03-01", 0, 100, "2025-03-01 08:00:00.000")).unwrap();
    let lines = ledger_lines(&conn, &ReceiptFilter::default()).unwrap();
    assert_eq!(lines[0].receipt.id, late);
    assert_eq!(lines[0].balance, Decimal::from(70));
    assert_eq!(lines[1].receipt.id, early);
    assert_eq!(lines[1].balance, Decimal::from(100));
}

#[test]
fn empty_ledger_balance_is_zero() {
    let conn = setup();
    let all = store::load_receipts(&conn, &ReceiptFilter::default()).unwrap();
    assert_eq!(current_balance(&all), Decimal::ZERO);
}

#[test]
fn status_change_requires_privileged_actor() {
    let conn = setup();
    let id = store::insert_receipt(&conn, &receipt("cy", "2025-03-01", 10, 0, "2025-03-01 09:00:00.000")).unwrap();

    let err = set_status(&conn, "cy", id, ReceiptStatus::Verified).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    let err = set_status(&conn, "nobody", id, ReceiptStatus::Verified).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    assert_eq!(status_of(&conn, id), ReceiptStatus::Pending);

    set_status(&conn, "bo", id, ReceiptStatus::Verified).unwrap();
    assert_eq!(status_of(&conn, id), ReceiptStatus::Verified);
}

#[test]
fn status_machine_rules() {
    let conn = setup();
    let id = store::insert_receipt(&conn, &receipt("cy", "2025-03-01", 10, 0, "2025-03-01 09:00:00.000")).unwrap();

    set_status(&conn, "ana", id, ReceiptStatus::Pending).unwrap();
    set_status(&conn, "ana", id, ReceiptStatus::Flagged).unwrap();
    set_status(&conn, "ana", id, ReceiptStatus::Pending).unwrap();
    set_status(&conn, "ana", id, ReceiptStatus::Verified).unwrap();
    // same status is a no-op, even once terminal
    set_status(&conn, "ana", id, ReceiptStatus::Verified).unwrap();

    let err = set_status(&conn, "ana", id, ReceiptStatus::Flagged).unwrap_err();
    assert!(matches!(err, StockroomError::InvalidTransition { .. }));
    assert_eq!(status_of(&conn, id), ReceiptStatus::Verified);
}

#[test]
fn unknown_receipt_is_not_found() {
    let conn = setup();
    let err = set_status(&conn, "ana", 99, ReceiptStatus::Verified).unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));
}

#[test]
fn stale_status_update_changes_nothing() {
    let conn = setup();
    let id = store::insert_receipt(&conn, &receipt("cy", "2025-03-01", 10, 0, "2025-03-01 09:00:00.000")).unwrap();
    // someone else flagged it after we read pending
    set_status(&conn, "ana", id, ReceiptStatus::Flagged).unwrap();
    let n = store::update_receipt_status(&conn, id, ReceiptStatus::Pending, ReceiptStatus::Verified)
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(status_of(&conn, id), ReceiptStatus::Flagged);
}

#[test]
fn cli_set_status_trims_id() {
    let conn = setup();
    let id = store::insert_receipt(&conn, &receipt("cy", "2025-03-01", 10, 0, "2025-03-01 09:00:00.000")).unwrap();
    let padded = format!(" {} ", id);
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "stockroom", "receipt", "set-status", "--actor", "bo", "--id", &padded, "--status", "flagged",
    ]);
    if let Some(("receipt", sub)) = matches.subcommand() {
        receipts::handle(&conn, sub).unwrap();
    } else {
        panic!("no receipt subcommand");
    }
    assert_eq!(status_of(&conn, id), ReceiptStatus::Flagged);
}
