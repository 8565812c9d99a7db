use chrono::Utc;

use crate::{
    cli::SplitCommand,
    error::Result,
    prompt::require_confirmation,
    render::{self, Names},
};

use super::{Context, occurred_at};

pub async fn run(ctx: &Context, command: SplitCommand) -> Result<()> {
    match command {
        SplitCommand::Show => {
            let group = ctx.active_group().await?;
            let members = ctx.engine.members(group.id).await?;
            if members.is_empty() {
                println!("No members in '{}'.", group.name);
                return Ok(());
            }
            let names = Names::new(&members).colored(render::color_output());
            let balances = ctx.engine.group_balances(group.id).await?;
            let plan = ctx.engine.settlement_plan(group.id).await?;

            print!("{}", render::balances(&group, &balances, &names));
            println!("\nSuggested settlements:");
            print!("{}", render::settlements(&plan, &names));
        }
        SplitCommand::Payment {
            from,
            to,
            amount,
            note,
            date,
        } => {
            let group = ctx.active_group().await?;
            let payer = ctx.member_named(&group, &from).await?;
            let recipient = ctx.member_named(&group, &to).await?;
            ctx.engine
                .record_payment(
                    group.id,
                    payer.id,
                    recipient.id,
                    amount,
                    occurred_at(date),
                    note.as_deref(),
                )
                .await?;
            println!(
                "Payment recorded: {} paid {} {amount}.",
                payer.name, recipient.name
            );
        }
        SplitCommand::Settle { yes } => {
            let group = ctx.active_group().await?;
            let members = ctx.engine.members(group.id).await?;
            let names = Names::new(&members).colored(render::color_output());

            let plan = ctx.engine.settlement_plan(group.id).await?;
            if plan.is_empty() {
                println!("{}", render::SETTLED_UP);
                return Ok(());
            }
            print!("{}", render::settlements(&plan, &names));
            require_confirmation(
                yes,
                &format!("Record these {} payment(s)?", plan.len()),
            )?;

            let recorded = ctx.engine.settle_group(group.id, Utc::now()).await?;
            println!("Recorded {} settlement payment(s).", recorded.len());
        }
    }
    Ok(())
}
