// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StockroomError;
use crate::models::Role;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let role = sub.get_one::<String>("role").unwrap().parse::<Role>()?;
            let actor = sub.get_one::<String>("actor").map(|s| s.trim());
            let granted = add_member(conn, actor, name, role)?;
            println!("Added member '{}' ({})", name, granted);
        }
        Some(("list", sub)) => {
            let members = store::load_members(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &members)? {
                let rows = members
                    .into_iter()
                    .map(|m| vec![m.name, m.role.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Name", "Role"], rows));
            }
        }
        Some(("set-role", sub)) => {
            let actor = sub.get_one::<String>("actor").unwrap().trim();
            let name = sub.get_one::<String>("name").unwrap().trim();
            let role = sub.get_one::<String>("role").unwrap().parse::<Role>()?;
            set_role(conn, actor, name, role)?;
            println!("'{}' is now {}", name, role);
        }
        _ => {}
    }
    Ok(())
}

/// Fails with `Unauthorized` unless `actor` is an owner or admin. Runs before any mutation.
pub fn require_privileged(
    conn: &Connection,
    actor: &str,
    action: &str,
) -> crate::error::Result<Role> {
    let denied = || StockroomError::Unauthorized {
        actor: actor.trim().to_string(),
        action: action.to_string(),
    };
    match store::member_role(conn, actor)? {
        Some(role) if role.is_privileged() => Ok(role),
        _ => Err(denied()),
    }
}

/// The first member of an empty team becomes its owner; after that only
/// privileged members may add people, and only owners may add owners.
pub fn add_member(
    conn: &Connection,
    actor: Option<&str>,
    name: &str,
    role: Role,
) -> crate::error::Result<Role> {
    if store::count_members(conn, None)? == 0 {
        store::insert_member(conn, name, Role::Owner)?;
        tracing::info!(member = name, "bootstrapped first owner");
        return Ok(Role::Owner);
    }
    let actor = actor.unwrap_or_default();
    let actor_role = require_privileged(conn, actor, "add members")?;
    if role == Role::Owner && actor_role != Role::Owner {
        return Err(StockroomError::Unauthorized {
            actor: actor.to_string(),
            action: "grant the owner role".into(),
        });
    }
    store::insert_member(conn, name, role)?;
    Ok(role)
}

pub fn set_role(
    conn: &Connection,
    actor: &str,
    name: &str,
    role: Role,
) -> crate::error::Result<()> {
    let actor_role = require_privileged(conn, actor, "change roles")?;
    let current = store::member_role(conn, name)?
        .ok_or_else(|| StockroomError::not_found("Member", name))?;
    if (current == Role::Owner || role == Role::Owner) && actor_role != Role::Owner {
        return Err(StockroomError::Unauthorized {
            actor: actor.trim().to_string(),
            action: "grant or revoke the owner role".into(),
        });
    }
    if current == Role::Owner
        && role != Role::Owner
        && store::count_members(conn, Some(Role::Owner))? <= 1
    {
        return Err(StockroomError::invalid("role", "cannot demote the last owner"));
    }
    store::update_member_role(conn, name, role)?;
    tracing::info!(actor, member = name, role = %role, "role changed");
    Ok(())
}
