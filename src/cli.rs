// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

fn movement_cmd(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(req("item", "Item name"))
        .arg(req("qty", "Quantity").allow_hyphen_values(true))
        .arg(opt("cost", "Unit cost"))
        .arg(opt("at", "Timestamp (defaults to now)"))
}

pub fn build_cli() -> Command {
    Command::new("stockroom")
        .version(crate_version!())
        .about("Inventory counts, shopping lists, receipts and reminders")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Organization settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-currency").arg(req("currency", "Display currency label")),
                )
                .subcommand(Command::new("set-org").arg(req("name", "Organization name"))),
        )
        .subcommand(
            Command::new("member")
                .about("Team members and roles")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Member name"))
                        .arg(opt("role", "owner|admin|member").default_value("member"))
                        .arg(opt("actor", "Member performing the change")),
                )
                .subcommand(Command::new("list").args(json_args()))
                .subcommand(
                    Command::new("set-role")
                        .arg(req("actor", "Member performing the change"))
                        .arg(req("name", "Member name"))
                        .arg(req("role", "owner|admin|member")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Item categories")
                .subcommand(Command::new("add").arg(req("name", "Category name")))
                .subcommand(Command::new("list").args(json_args())),
        )
        .subcommand(
            Command::new("item")
                .about("Tracked items")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Item name"))
                        .arg(opt("unit", "Unit label, e.g. pkt").default_value(""))
                        .arg(opt("reorder", "Reorder threshold"))
                        .arg(opt("category", "Category name")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include deactivated items"),
                        )
                        .args(json_args()),
                )
                .subcommand(Command::new("deactivate").arg(req("name", "Item name")))
                .subcommand(
                    Command::new("set-reorder")
                        .arg(req("name", "Item name"))
                        .arg(opt("level", "Threshold; omit to clear")),
                ),
        )
        .subcommand(
            Command::new("move")
                .about("Stock movements")
                .subcommand(movement_cmd("in", "Record stock received"))
                .subcommand(movement_cmd("out", "Record stock used"))
                .subcommand(movement_cmd("adjust", "Record a signed correction"))
                .subcommand(
                    Command::new("list")
                        .arg(opt("item", "Only this item"))
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("count")
                .about("Stocktake entries")
                .subcommand(
                    Command::new("set")
                        .arg(req("item", "Item name"))
                        .arg(req("raw", "What was counted, e.g. '1 pkt + 1 opened'"))
                        .arg(opt("date", "Count date YYYY-MM-DD (defaults to today)"))
                        .arg(opt("value", "Numeric value, if known"))
                        .arg(opt("unit", "Unit label")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(opt("from", "Start date YYYY-MM-DD"))
                        .arg(opt("to", "End date YYYY-MM-DD"))
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("receipt")
                .about("Receipts and running balance")
                .subcommand(
                    Command::new("add")
                        .arg(req("owner", "Member who filed it"))
                        .arg(req("vendor", "Vendor"))
                        .arg(req("date", "Receipt date YYYY-MM-DD"))
                        .arg(opt("amount", "Amount spent").default_value("0"))
                        .arg(opt("received", "Funds added").default_value("0"))
                        .arg(opt("category", "Expense category"))
                        .arg(opt("method", "Payment method"))
                        .arg(opt("reference", "Attachment or reference id")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(opt("owner", "Only this owner"))
                        .arg(opt("from", "Start date YYYY-MM-DD"))
                        .arg(opt("to", "End date YYYY-MM-DD"))
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("set-status")
                        .arg(req("actor", "Member performing the change"))
                        .arg(req("id", "Receipt id"))
                        .arg(req("status", "pending|verified|flagged")),
                )
                .subcommand(Command::new("balance").about("Current running balance")),
        )
        .subcommand(
            Command::new("shopping")
                .about("Reconciled shopping list")
                .subcommand(Command::new("show").args(json_args()))
                .subcommand(
                    Command::new("set")
                        .arg(req("item", "Item name"))
                        .arg(req("qty", "Desired quantity"))
                        .arg(opt("price", "Unit price")),
                )
                .subcommand(Command::new("add").arg(req("item", "Item name")))
                .subcommand(Command::new("remove").arg(req("item", "Item name")))
                .subcommand(
                    Command::new("complete")
                        .arg(opt("date", "Count date for restocked items (defaults to today)"))
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("history")
                        .arg(opt("list", "Show entries of this list id"))
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("reminder")
                .about("Recurring reminders")
                .subcommand(
                    Command::new("add")
                        .arg(req("owner", "Member who owns it"))
                        .arg(req("title", "Title"))
                        .arg(req("start", "Start timestamp"))
                        .arg(
                            opt("recurrence", "none|weekly|biweekly|monthly|quarterly")
                                .default_value("none"),
                        )
                        .arg(opt("notes", "Notes"))
                        .arg(opt("color", "Display color")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(opt("owner", "Only this owner"))
                        .arg(opt("now", "Evaluate at this timestamp"))
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("due")
                        .arg(opt("owner", "Only this owner"))
                        .arg(opt("now", "Evaluate at this timestamp"))
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("alerts")
                .about("Low-stock and reminder notifications")
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("unread")
                                .long("unread")
                                .action(ArgAction::SetTrue)
                                .help("Hide acknowledged alerts"),
                        )
                        .arg(opt("now", "Evaluate at this timestamp"))
                        .args(json_args()),
                )
                .subcommand(Command::new("ack").arg(req("key", "Alert key"))),
        )
        .subcommand(
            Command::new("report")
                .about("Derived stock and cash figures")
                .subcommand(Command::new("stock").args(json_args()))
                .subcommand(
                    Command::new("dashboard")
                        .arg(opt("now", "Evaluate at this timestamp"))
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("import").about("Bulk imports").subcommand(
                Command::new("counts")
                    .about("Stocktake CSV with columns item,date,raw[,unit]")
                    .arg(req("path", "CSV file")),
            ),
        )
        .subcommand(Command::new("doctor").about("Check data for problems"))
}
