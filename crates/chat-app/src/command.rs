use salon_core::{CoreError, MemberAction, MessageId, RoomState, UserId};
use snafu::{OptionExt, ResultExt, Snafu};

/// One line typed into the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Delete(MessageId),
    ChangeRole { target: String, action: MemberAction },
    Help,
    Quit,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommandError {
    #[snafu(display("unknown command `/{name}`, try /help"))]
    UnknownCommand { stage: &'static str, name: String },
    #[snafu(display("`/{name}` expects {expected}"))]
    MissingArgument {
        stage: &'static str,
        name: &'static str,
        expected: &'static str,
    },
    #[snafu(display("invalid message id on `{stage}`: {source}"))]
    InvalidMessageId {
        stage: &'static str,
        source: CoreError,
    },
    #[snafu(display("no member named `{target}` in this room"))]
    UnknownUser { stage: &'static str, target: String },
}

pub const HELP: &str = "\
commands:
  <text>             send a message
  /delete <id>       delete a message
  /promote <user>    make a member moderator
  /demote <user>     remove moderator rights
  /ban <user>        ban a member
  /unban <user>      lift a ban
  /quit              leave";

impl Command {
    /// Parses one input line; `None` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Self::Send(line.to_string())));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let argument = words.next();

        let command = match name {
            "quit" | "exit" => Self::Quit,
            "help" => Self::Help,
            "delete" => {
                let raw = argument.context(MissingArgumentSnafu {
                    stage: "parse-delete",
                    name: "delete",
                    expected: "a message id",
                })?;
                let id = MessageId::parse(raw).context(InvalidMessageIdSnafu {
                    stage: "parse-delete",
                })?;
                Self::Delete(id)
            }
            "promote" => Self::role_change(argument, "promote", MemberAction::PromoteToMod)?,
            "demote" => Self::role_change(argument, "demote", MemberAction::DemoteToMember)?,
            "ban" => Self::role_change(argument, "ban", MemberAction::Ban)?,
            "unban" => Self::role_change(argument, "unban", MemberAction::Unban)?,
            other => {
                return UnknownCommandSnafu {
                    stage: "parse-command",
                    name: other.to_string(),
                }
                .fail();
            }
        };
        Ok(Some(command))
    }

    fn role_change(
        argument: Option<&str>,
        name: &'static str,
        action: MemberAction,
    ) -> Result<Self, CommandError> {
        let target = argument.context(MissingArgumentSnafu {
            stage: "parse-role-change",
            name,
            expected: "a username or user id",
        })?;
        Ok(Self::ChangeRole {
            target: target.to_string(),
            action,
        })
    }
}

/// Resolves a username or numeric user id against the current roster.
pub fn resolve_member(state: Option<&RoomState>, target: &str) -> Result<UserId, CommandError> {
    if let Ok(user_id) = UserId::parse(target) {
        return Ok(user_id);
    }

    state
        .and_then(|state| {
            state
                .members
                .iter()
                .find(|member| member.username == target)
        })
        .map(|member| member.user_id)
        .context(UnknownUserSnafu {
            stage: "resolve-member",
            target,
        })
}
