use engine::{EngineError, Expense, Group, MoneyCents, NewExpense, Percent, SplitKind, SplitStrategy};
use uuid::Uuid;

use crate::{
    cli::{ExpenseAddArgs, ExpenseCommand, ExpenseEditArgs},
    error::{AppError, Result},
    prompt::require_confirmation,
    render::{self, Names},
};

use super::{Context, not_found, occurred_at};

pub async fn run(ctx: &Context, command: ExpenseCommand) -> Result<()> {
    match command {
        ExpenseCommand::Add(args) => add(ctx, args).await,
        ExpenseCommand::Show => {
            let group = ctx.active_group().await?;
            let members = ctx.engine.members(group.id).await?;
            let expenses = ctx.engine.expenses(group.id).await?;
            print!("{}", render::expenses(&expenses, &Names::new(&members)));
            Ok(())
        }
        ExpenseCommand::Edit(args) => edit(ctx, args).await,
        ExpenseCommand::Delete { id, yes } => {
            let group = ctx.active_group().await?;
            let expense = resolve_expense(ctx, &group, &id).await?;
            require_confirmation(
                yes,
                &format!(
                    "Delete expense '{}' ({})?",
                    expense.description, expense.amount
                ),
            )?;
            let splits = ctx.engine.delete_expense(group.id, expense.id).await?;
            println!(
                "Deleted expense '{}' and its {splits} split(s).",
                expense.description
            );
            Ok(())
        }
    }
}

async fn add(ctx: &Context, args: ExpenseAddArgs) -> Result<()> {
    let group = ctx.active_group().await?;
    let payer = ctx.member_named(&group, &args.paid_by).await?;
    let participants = if args.split_with.is_empty() {
        ctx.engine.members(group.id).await?
    } else {
        ctx.members_named(&group, &args.split_with).await?
    };
    let strategy = build_strategy(args.strategy.into(), &args.values)?;

    let expense_id = ctx
        .engine
        .add_expense(
            group.id,
            NewExpense {
                payer_id: payer.id,
                amount: args.amount,
                description: args.description.clone(),
                strategy,
                participants: participants.iter().map(|member| member.id).collect(),
                occurred_at: occurred_at(args.date),
                recorded_as: None,
            },
        )
        .await?;

    let names: Vec<&str> = participants.iter().map(|m| m.name.as_str()).collect();
    println!(
        "Added expense '{}' ({}) paid by {}, split between {} [{}].",
        args.description.trim(),
        args.amount,
        payer.name,
        names.join(", "),
        render::short_id(&expense_id)
    );
    Ok(())
}

async fn edit(ctx: &Context, args: ExpenseEditArgs) -> Result<()> {
    let group = ctx.active_group().await?;
    let expense = resolve_expense(ctx, &group, &args.id).await?;

    let payer_id = match &args.paid_by {
        Some(name) => ctx.member_named(&group, name).await?.id,
        None => expense.payer_id,
    };
    let amount = args.amount.unwrap_or(expense.amount);
    let current = merged_shares(&expense);

    let resplit = !args.split_with.is_empty() || args.strategy.is_some() || !args.values.is_empty();
    let (strategy, participants, recorded_as) = if resplit {
        let participants = if args.split_with.is_empty() {
            current.iter().map(|(member_id, _)| *member_id).collect()
        } else {
            ctx.members_named(&group, &args.split_with)
                .await?
                .iter()
                .map(|member| member.id)
                .collect()
        };
        let kind = match args.strategy {
            Some(strategy) => strategy.into(),
            None if args.values.is_empty() => SplitKind::Equal,
            None => expense.strategy,
        };
        (build_strategy(kind, &args.values)?, participants, None)
    } else if amount != expense.amount {
        let participants = current.iter().map(|(member_id, _)| *member_id).collect();
        (
            rescaled_strategy(expense.strategy, &current)?,
            participants,
            Some(expense.strategy),
        )
    } else {
        let (participants, amounts) = current.into_iter().unzip();
        (
            SplitStrategy::Exact(amounts),
            participants,
            Some(expense.strategy),
        )
    };

    ctx.engine
        .update_expense(
            group.id,
            expense.id,
            NewExpense {
                payer_id,
                amount,
                description: args
                    .description
                    .unwrap_or_else(|| expense.description.clone()),
                strategy,
                participants,
                occurred_at: args
                    .date
                    .map_or(expense.occurred_at, |date| occurred_at(Some(date))),
                recorded_as,
            },
        )
        .await?;

    println!("Updated expense [{}].", render::short_id(&expense.id));
    Ok(())
}

/// Find an expense of the group by full id or by a unique id prefix.
async fn resolve_expense(ctx: &Context, group: &Group, raw: &str) -> Result<Expense> {
    if let Ok(id) = Uuid::parse_str(raw.trim()) {
        return ctx
            .engine
            .expense(group.id, id)
            .await
            .map_err(|err| {
                not_found(err, || {
                    format!("expense {id} not found in '{}'", group.name)
                })
            });
    }

    let needle = raw.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(AppError::NotFound("empty expense id".to_string()));
    }
    let mut matches: Vec<Expense> = ctx
        .engine
        .expenses(group.id)
        .await?
        .into_iter()
        .filter(|expense| expense.id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.len() {
        0 => Err(AppError::NotFound(format!(
            "expense '{raw}' not found in '{}'",
            group.name
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(AppError::Ambiguous(format!(
            "expense id '{raw}' matches {n} expenses, use more characters"
        ))),
    }
}

/// Split amounts per member in split order; a member listed twice (after a
/// reassignment) gets a single combined share.
fn merged_shares(expense: &Expense) -> Vec<(Uuid, MoneyCents)> {
    let mut shares: Vec<(Uuid, MoneyCents)> = Vec::with_capacity(expense.splits.len());
    for split in &expense.splits {
        match shares.iter_mut().find(|(member_id, _)| *member_id == split.member_id) {
            Some((_, amount)) => *amount += split.amount,
            None => shares.push((split.member_id, split.amount)),
        }
    }
    shares
}

/// Strategy for an expense whose amount changed but whose split did not.
///
/// Equal expenses stay equal; any other kind is re-split in proportion to the
/// stored amounts.
fn rescaled_strategy(kind: SplitKind, shares: &[(Uuid, MoneyCents)]) -> Result<SplitStrategy> {
    if kind == SplitKind::Equal {
        return Ok(SplitStrategy::Equal);
    }

    let divisor = shares
        .iter()
        .fold(0, |acc, (_, amount)| gcd(acc, amount.cents().unsigned_abs()));
    let weights = shares
        .iter()
        .map(|(_, amount)| {
            u64::try_from(amount.cents())
                .ok()
                .map(|cents| cents.checked_div(divisor).unwrap_or(cents))
                .and_then(|weight| u32::try_from(weight).ok())
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "cannot rescale a share of {amount}, pass --strategy and --values"
                    ))
                })
        })
        .collect::<std::result::Result<_, _>>()?;
    Ok(SplitStrategy::Shares(weights))
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Turn a strategy name and its textual parameters into a [`SplitStrategy`].
fn build_strategy(kind: SplitKind, values: &[String]) -> Result<SplitStrategy> {
    let strategy = match kind {
        SplitKind::Equal => {
            if !values.is_empty() {
                return Err(EngineError::Validation(
                    "the equal strategy takes no --values".to_string(),
                )
                .into());
            }
            SplitStrategy::Equal
        }
        SplitKind::Exact => SplitStrategy::Exact(
            values
                .iter()
                .map(|value| value.parse::<MoneyCents>())
                .collect::<std::result::Result<_, _>>()?,
        ),
        SplitKind::Percentage => SplitStrategy::Percentage(
            values
                .iter()
                .map(|value| value.parse::<Percent>())
                .collect::<std::result::Result<_, _>>()?,
        ),
        SplitKind::Shares => SplitStrategy::Shares(
            values
                .iter()
                .map(|value| {
                    value.trim().parse::<u32>().map_err(|_| {
                        EngineError::Validation(format!("invalid share weight: {value}"))
                    })
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
    };
    Ok(strategy)
}
