use crate::{
    cli::GroupCommand,
    error::{AppError, Result},
    prompt::require_confirmation,
    render,
    session::Session,
};

use super::Context;

pub async fn run(ctx: &Context, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::Create { name } => {
            let group_id = ctx.engine.new_group(&name).await?;
            ctx.remember(group_id)?;
            println!("Created group '{}' and made it active.", name.trim());
        }
        GroupCommand::Select { name } => {
            let group = ctx.group_named(&name).await?;
            ctx.remember(group.id)?;
            println!("Active group: {}", group.name);
        }
        GroupCommand::Current => match ctx.active_group().await {
            Ok(group) => println!("Active group: {}", group.name),
            Err(AppError::NoActiveGroup) => println!("No active group."),
            Err(err) => return Err(err),
        },
        GroupCommand::Show => {
            let active = ctx.session()?.active_group;
            let mut rows = Vec::new();
            for group in ctx.engine.groups().await? {
                let members = ctx.engine.members(group.id).await?.len();
                rows.push((group, members));
            }
            print!("{}", render::groups(&rows, active));
        }
        GroupCommand::Delete { name, yes } => {
            let group = ctx.group_named(&name).await?;
            require_confirmation(
                yes,
                &format!(
                    "Delete group '{}' with all its members, expenses and payments?",
                    group.name
                ),
            )?;
            ctx.engine.delete_group(group.id).await?;
            if ctx.session()?.active_group == Some(group.id) {
                Session::clear(&ctx.session_file)?;
            }
            println!("Deleted group '{}'.", group.name);
        }
        GroupCommand::ClearSession => {
            Session::clear(&ctx.session_file)?;
            println!("Active group cleared.");
        }
    }
    Ok(())
}
