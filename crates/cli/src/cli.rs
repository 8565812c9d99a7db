use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{MoneyCents, SplitKind};

#[derive(Parser, Debug)]
#[command(name = "tally", version)]
#[command(about = "Track shared expenses inside a group and work out who pays whom")]
pub struct Cli {
    /// Optional config file path (TOML). Defaults to `tally.toml` if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
    /// File remembering the active group.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
    /// Log level for diagnostics on stderr (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, select and delete groups.
    Group(Group),
    /// Manage the members of the active group.
    Member(Member),
    /// Record, list, edit and delete expenses.
    Expense(Expense),
    /// Balances, repayments and settling up.
    Split(Split),
}

#[derive(Args, Debug)]
pub struct Group {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group and make it the active one.
    Create { name: String },
    /// Make an existing group the active one.
    Select { name: String },
    /// Print the active group.
    Current,
    /// List every group.
    Show,
    /// Delete a group with all its members, expenses and payments.
    Delete {
        name: String,
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Forget the active group.
    ClearSession,
}

#[derive(Args, Debug)]
pub struct Member {
    #[command(subcommand)]
    pub command: MemberCommand,
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Add a member to the active group.
    Add { name: String },
    /// List the members of a group.
    Show {
        /// Group name; defaults to the active group.
        #[arg(long)]
        group: Option<String>,
    },
    /// Remove a member from the active group.
    Delete {
        name: String,
        /// Move the member's expenses, splits and payments to this member.
        #[arg(long)]
        reassign_to: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct Expense {
    #[command(subcommand)]
    pub command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// Record an expense in the active group.
    Add(ExpenseAddArgs),
    /// List the expenses of the active group.
    Show,
    /// Change an expense; options left out keep their current value.
    Edit(ExpenseEditArgs),
    /// Delete an expense.
    Delete {
        /// Expense id or an unambiguous prefix of it.
        id: String,
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct ExpenseAddArgs {
    #[arg(long, value_parser = parse_money)]
    pub amount: MoneyCents,
    /// Name of the member who paid.
    #[arg(long)]
    pub paid_by: String,
    #[arg(long)]
    pub description: String,
    /// Date of the expense (YYYY-MM-DD); defaults to now.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Members sharing the expense; defaults to every member of the group.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub split_with: Vec<String>,
    #[arg(long, value_enum, default_value_t = StrategyArg::Equal)]
    pub strategy: StrategyArg,
    /// Strategy parameters, one per participant in `--split-with` order.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ExpenseEditArgs {
    /// Expense id or an unambiguous prefix of it.
    pub id: String,
    #[arg(long, value_parser = parse_money)]
    pub amount: Option<MoneyCents>,
    #[arg(long)]
    pub paid_by: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub split_with: Vec<String>,
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct Split {
    #[command(subcommand)]
    pub command: SplitCommand,
}

#[derive(Subcommand, Debug)]
pub enum SplitCommand {
    /// Show balances and suggested settlements.
    Show,
    /// Record a repayment from one member to another.
    Payment {
        from: String,
        to: String,
        #[arg(value_parser = parse_money)]
        amount: MoneyCents,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record the suggested settlements as payments.
    Settle {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Equal,
    Exact,
    Percentage,
    Shares,
}

impl From<StrategyArg> for SplitKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Equal => SplitKind::Equal,
            StrategyArg::Exact => SplitKind::Exact,
            StrategyArg::Percentage => SplitKind::Percentage,
            StrategyArg::Shares => SplitKind::Shares,
        }
    }
}

fn parse_money(raw: &str) -> Result<MoneyCents, String> {
    raw.parse::<MoneyCents>().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_expense_add_with_lists() {
        let cli = Cli::try_parse_from([
            "tally",
            "expense",
            "add",
            "--amount",
            "60",
            "--paid-by",
            "Alice",
            "--description",
            "Dinner",
            "--split-with",
            "Alice,Bob",
            "Carol",
            "--strategy",
            "shares",
            "--values",
            "1,2,3",
        ])
        .unwrap();

        let Command::Expense(Expense {
            command: ExpenseCommand::Add(args),
        }) = cli.command
        else {
            panic!("expected expense add");
        };
        assert_eq!(args.amount, MoneyCents::new(6000));
        assert_eq!(args.split_with, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(args.strategy, StrategyArg::Shares);
        assert_eq!(args.values, vec!["1", "2", "3"]);
        assert!(args.date.is_none());
    }

    #[test]
    fn rejects_bad_amount() {
        let err = Cli::try_parse_from([
            "tally",
            "split",
            "payment",
            "Alice",
            "Bob",
            "12.345",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("too many decimals"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tally",
            "group",
            "delete",
            "Trip",
            "-y",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(
            cli.command,
            Command::Group(Group {
                command: GroupCommand::Delete { yes: true, .. }
            })
        ));
    }

    #[test]
    fn parses_date() {
        let cli = Cli::try_parse_from([
            "tally",
            "expense",
            "edit",
            "abcd",
            "--date",
            "2026-03-01",
        ])
        .unwrap();
        let Command::Expense(Expense {
            command: ExpenseCommand::Edit(args),
        }) = cli.command
        else {
            panic!("expected expense edit");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(args.amount.is_none());
    }
}
