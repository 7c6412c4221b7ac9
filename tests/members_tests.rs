// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use stockroom::commands::members::{add_member, set_role};
use stockroom::error::StockroomError;
use stockroom::models::Role;
use stockroom::{cli, commands, db, store};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn role(conn: &Connection, name: &str) -> Option<Role> {
    store::member_role(conn, name).unwrap()
}

#[test]
fn first_member_becomes_owner() {
    let conn = setup();
    let granted = add_member(&conn, None, "ana", Role::Member).unwrap();
    assert_eq!(granted, Role::Owner);
    assert_eq!(role(&conn, "ana"), Some(Role::Owner));
}

#[test]
fn later_members_need_a_privileged_actor() {
    let conn = setup();
    add_member(&conn, None, "ana", Role::Member).unwrap();
    add_member(&conn, Some("ana"), "cy", Role::Member).unwrap();

    let err = add_member(&conn, None, "dee", Role::Member).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    let err = add_member(&conn, Some("cy"), "dee", Role::Member).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    assert_eq!(role(&conn, "dee"), None);
}

#[test]
fn only_owners_touch_the_owner_role() {
    let conn = setup();
    add_member(&conn, None, "ana", Role::Member).unwrap();
    add_member(&conn, Some("ana"), "bo", Role::Admin).unwrap();
    add_member(&conn, Some("ana"), "cy", Role::Member).unwrap();

    let err = add_member(&conn, Some("bo"), "dee", Role::Owner).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    let err = set_role(&conn, "bo", "cy", Role::Owner).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));
    let err = set_role(&conn, "bo", "ana", Role::Member).unwrap_err();
    assert!(matches!(err, StockroomError::Unauthorized { .. }));

    // admins manage ordinary roles
    set_role(&conn, "bo", "cy", Role::Admin).unwrap();
    assert_eq!(role(&conn, "cy"), Some(Role::Admin));
}

#[test]
fn last_owner_cannot_step_down() {
    let conn = setup();
    add_member(&conn, None, "ana", Role::Member).unwrap();
    let err = set_role(&conn, "ana", "ana", Role::Admin).unwrap_err();
    assert!(matches!(err, StockroomError::InvalidValue { .. }));

    add_member(&conn, Some("ana"), "bo", Role::Owner).unwrap();
    set_role(&conn, "bo", "ana", Role::Member).unwrap();
    assert_eq!(role(&conn, "ana"), Some(Role::Member));
}

#[test]
fn cli_add_uses_actor() {
    let conn = setup();
    add_member(&conn, None, "ana", Role::Member).unwrap();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "stockroom", "member", "add", "--name", " bo ", "--role", "admin", "--actor", " ana ",
    ]);
    if let Some(("member", sub)) = matches.subcommand() {
        commands::members::handle(&conn, sub).unwrap();
    } else {
        panic!("no member subcommand");
    }
    assert_eq!(role(&conn, "bo"), Some(Role::Admin));
}
