use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use engine::{Engine, EngineError, Group, Member};
use uuid::Uuid;

use crate::{
    cli::Command,
    error::{AppError, Result},
    prompt,
    session::Session,
};

mod expense;
mod group;
mod member;
mod split;

/// What every command needs: the ledger and where the session lives.
pub struct Context {
    pub engine: Engine,
    pub session_file: PathBuf,
}

impl Context {
    pub fn new(engine: Engine, session_file: PathBuf) -> Self {
        Self {
            engine,
            session_file,
        }
    }

    pub fn session(&self) -> Result<Session> {
        Session::load(&self.session_file)
    }

    pub fn remember(&self, group_id: Uuid) -> Result<()> {
        Session {
            active_group: Some(group_id),
        }
        .save(&self.session_file)
    }

    /// The group commands operate on.
    ///
    /// The session wins. Without a usable session a single group is selected
    /// automatically; with several the user picks one on the terminal. Either
    /// choice is remembered.
    pub async fn active_group(&self) -> Result<Group> {
        if let Some(group_id) = self.session()?.active_group {
            match self.engine.group(group_id).await {
                Ok(group) => return Ok(group),
                Err(EngineError::KeyNotFound(_)) => {
                    tracing::warn!(%group_id, "active group no longer exists");
                    Session::clear(&self.session_file)?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let mut groups = self.engine.groups().await?;
        let group = match groups.len() {
            0 => return Err(AppError::NoActiveGroup),
            1 => {
                let group = groups.remove(0);
                tracing::info!(group = %group.name, "auto-selected the only group");
                group
            }
            _ => {
                let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
                let Some(index) = prompt::choose("Select a group:", &names)? else {
                    return Err(AppError::NoActiveGroup);
                };
                let group = groups.remove(index);
                tracing::info!(group = %group.name, "group selected");
                group
            }
        };
        self.remember(group.id)?;
        Ok(group)
    }

    pub async fn group_named(&self, name: &str) -> Result<Group> {
        self.engine
            .group_by_name(name)
            .await
            .map_err(|err| not_found(err, || format!("group '{name}' not found")))
    }

    pub async fn member_named(&self, group: &Group, name: &str) -> Result<Member> {
        self.engine
            .member_by_name(group.id, name)
            .await
            .map_err(|err| {
                not_found(err, || {
                    format!("member '{name}' not found in '{}'", group.name)
                })
            })
    }

    pub async fn members_named(&self, group: &Group, names: &[String]) -> Result<Vec<Member>> {
        let mut members = Vec::with_capacity(names.len());
        for name in names {
            members.push(self.member_named(group, name).await?);
        }
        Ok(members)
    }
}

fn not_found(err: EngineError, message: impl FnOnce() -> String) -> AppError {
    match err {
        EngineError::KeyNotFound(_) => AppError::NotFound(message()),
        other => other.into(),
    }
}

/// Midnight UTC of `date`, or now.
fn occurred_at(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or_else(Utc::now, |date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Group(args) => group::run(ctx, args.command).await,
        Command::Member(args) => member::run(ctx, args.command).await,
        Command::Expense(args) => expense::run(ctx, args.command).await,
        Command::Split(args) => split::run(ctx, args.command).await,
    }
}
