use crate::{cli::MemberCommand, error::Result, render};

use super::Context;

pub async fn run(ctx: &Context, command: MemberCommand) -> Result<()> {
    match command {
        MemberCommand::Add { name } => {
            let group = ctx.active_group().await?;
            ctx.engine.add_member(group.id, &name).await?;
            println!("Added '{}' to '{}'.", name.trim(), group.name);
        }
        MemberCommand::Show { group } => {
            let group = match group {
                Some(name) => ctx.group_named(&name).await?,
                None => ctx.active_group().await?,
            };
            let members = ctx.engine.members(group.id).await?;
            print!("{}", render::members(&group, &members, render::color_output()));
        }
        MemberCommand::Delete { name, reassign_to } => {
            let group = ctx.active_group().await?;
            let member = ctx.member_named(&group, &name).await?;
            let target = match reassign_to {
                Some(target) => Some(ctx.member_named(&group, &target).await?),
                None => None,
            };

            ctx.engine
                .delete_member(group.id, member.id, target.as_ref().map(|t| t.id))
                .await?;
            match target {
                Some(target) => println!(
                    "Removed '{}'; their history now belongs to '{}'.",
                    member.name, target.name
                ),
                None => println!("Removed '{}'.", member.name),
            }
        }
    }
    Ok(())
}
