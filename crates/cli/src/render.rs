//! Plain-text rendering of command output.
//!
//! Member names outside tables may carry a colour picked from the member's
//! position; tables stay plain so their columns line up.

use std::{
    collections::HashMap,
    fmt::Write,
    io::IsTerminal,
};

use crossterm::style::{Color, Stylize};
use engine::{Balances, Expense, Group, Member, SettlementTransaction};
use uuid::Uuid;

pub const SETTLED_UP: &str = "Everyone is settled up!";

const MEMBER_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Red,
];

/// Colour is on when stdout is a terminal and `NO_COLOR` is unset.
pub fn color_output() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

pub fn member_color(position: i64) -> Color {
    let len = MEMBER_COLORS.len() as i64;
    MEMBER_COLORS[position.rem_euclid(len) as usize]
}

fn paint(name: &str, position: i64, colored: bool) -> String {
    if colored {
        name.with(member_color(position)).bold().to_string()
    } else {
        name.to_string()
    }
}

/// Member id to display name.
pub struct Names {
    members: HashMap<Uuid, (String, i64)>,
    colored: bool,
}

impl Names {
    pub fn new(members: &[Member]) -> Self {
        Self {
            members: members
                .iter()
                .map(|member| (member.id, (member.name.clone(), member.position)))
                .collect(),
            colored: false,
        }
    }

    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn get(&self, id: &Uuid) -> String {
        self.members
            .get(id)
            .map_or_else(|| id.to_string(), |(name, _)| name.clone())
    }

    /// Like [`Names::get`], coloured when enabled.
    pub fn styled(&self, id: &Uuid) -> String {
        match self.members.get(id) {
            Some((name, position)) => paint(name, *position, self.colored),
            None => id.to_string(),
        }
    }
}

/// First characters of an id, enough to address it from the command line.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn table(headers: &[&str], rows: &[Vec<String>], right_aligned_from: usize) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_row(&mut out, headers.iter().copied(), &widths, right_aligned_from);
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{rule}");
    for row in rows {
        render_row(
            &mut out,
            row.iter().map(String::as_str),
            &widths,
            right_aligned_from,
        );
    }
    out
}

fn render_row<'a>(
    out: &mut String,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    right_aligned_from: usize,
) {
    let line = cells
        .zip(widths)
        .enumerate()
        .map(|(column, (cell, &width))| {
            if column >= right_aligned_from {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

pub fn groups(groups: &[(Group, usize)], active: Option<Uuid>) -> String {
    if groups.is_empty() {
        return "No groups yet.\n".to_string();
    }
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|(group, members)| {
            let marker = if Some(group.id) == active { "*" } else { "" };
            vec![
                marker.to_string(),
                group.name.clone(),
                members.to_string(),
                group.created_at.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    table(&["", "Group", "Members", "Created"], &rows, 2)
}

pub fn members(group: &Group, members: &[Member], colored: bool) -> String {
    if members.is_empty() {
        return format!("No members in '{}'.\n", group.name);
    }
    let mut out = format!("Members of '{}':\n", group.name);
    for member in members {
        let _ = writeln!(out, "  {}", paint(&member.name, member.position, colored));
    }
    out
}

pub fn expenses(expenses: &[Expense], names: &Names) -> String {
    if expenses.is_empty() {
        return "No expenses yet.\n".to_string();
    }
    let rows: Vec<Vec<String>> = expenses
        .iter()
        .map(|expense| {
            let splits = expense
                .splits
                .iter()
                .map(|split| format!("{} {}", names.get(&split.member_id), split.amount))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                short_id(&expense.id),
                expense.occurred_at.format("%Y-%m-%d").to_string(),
                expense.description.clone(),
                names.get(&expense.payer_id),
                expense.strategy.to_string(),
                splits,
                expense.amount.to_string(),
            ]
        })
        .collect();
    table(
        &["Id", "Date", "Description", "Paid by", "Split", "Shares", "Amount"],
        &rows,
        6,
    )
}

pub fn balances(group: &Group, balances: &Balances, names: &Names) -> String {
    let rows: Vec<Vec<String>> = balances
        .iter()
        .map(|balance| {
            vec![
                names.get(&balance.member_id),
                balance.paid.to_string(),
                balance.owed.to_string(),
                balance.repaid.to_string(),
                balance.received.to_string(),
                balance.net().to_string(),
            ]
        })
        .collect();

    let mut out = format!("Balances for '{}'\n", group.name);
    out.push_str(&table(
        &["Member", "Paid", "Owed", "Repaid", "Received", "Net"],
        &rows,
        1,
    ));
    let _ = writeln!(
        out,
        "\nΣ owed to creditors: {} | Σ owed by debtors: {}",
        balances.creditors_total(),
        balances.debtors_total()
    );
    out
}

pub fn settlements(plan: &[SettlementTransaction], names: &Names) -> String {
    if plan.is_empty() {
        return format!("{SETTLED_UP}\n");
    }
    let mut out = String::new();
    for tx in plan {
        let _ = writeln!(
            out,
            "{} pays {} {}",
            names.styled(&tx.from),
            names.styled(&tx.to),
            tx.amount
        );
    }
    out
}
