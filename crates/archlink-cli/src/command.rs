//! Stdin command parsing.
//!
//! Lines starting with `!` are commands; anything else is chat.

use archlink_proto::{ClientStatus, LocationId};
use thiserror::Error;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report these locations as checked.
    Check(Vec<LocationId>),
    /// Send a status update.
    Status(ClientStatus),
    /// Ask what sits at these locations.
    Scout(Vec<LocationId>),
    /// List received items.
    Items,
    /// Disconnect and exit.
    Quit,
    /// Chat message.
    Say(String),
}

/// Errors from [`parse`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `!name` is not a known command.
    #[error("unknown command '!{0}'")]
    Unknown(String),

    /// Argument is not a location id.
    #[error("invalid location id '{0}'")]
    InvalidId(String),

    /// Status is not one of `ready`, `playing`, `goal`.
    #[error("unknown status '{0}', expected ready, playing or goal")]
    UnknownStatus(String),

    /// Missing arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(cmd) = line.strip_prefix('!') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let name = parts.first().copied().unwrap_or("");
    let args = parts.get(1..).unwrap_or_default();

    let command = match name {
        "check" => Command::Check(location_ids(args, "!check <id>...")?),
        "scout" => Command::Scout(location_ids(args, "!scout <id>...")?),
        "status" => {
            let [status] = args else {
                return Err(CommandError::Usage("!status <ready|playing|goal>"));
            };
            Command::Status(parse_status(status)?)
        },
        "items" => Command::Items,
        "quit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn location_ids(args: &[&str], usage: &'static str) -> Result<Vec<LocationId>, CommandError> {
    if args.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    args.iter()
        .map(|arg| {
            arg.parse::<i64>()
                .map(LocationId)
                .map_err(|_| CommandError::InvalidId((*arg).to_string()))
        })
        .collect()
}

fn parse_status(raw: &str) -> Result<ClientStatus, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "ready" => Ok(ClientStatus::Ready),
        "playing" => Ok(ClientStatus::Playing),
        "goal" => Ok(ClientStatus::Goal),
        _ => Err(CommandError::UnknownStatus(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(parse("  hello there ").unwrap(), Some(Command::Say("hello there".into())));
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn check_and_scout_take_ids() {
        assert_eq!(
            parse("!check 1001 1002").unwrap(),
            Some(Command::Check(vec![LocationId(1001), LocationId(1002)]))
        );
        assert_eq!(parse("!scout 7").unwrap(), Some(Command::Scout(vec![LocationId(7)])));
        assert_eq!(parse("!check"), Err(CommandError::Usage("!check <id>...")));
        assert_eq!(parse("!check 1 x"), Err(CommandError::InvalidId("x".into())));
    }

    #[test]
    fn status_names_are_case_insensitive() {
        assert_eq!(parse("!status Goal").unwrap(), Some(Command::Status(ClientStatus::Goal)));
        assert_eq!(parse("!status ready").unwrap(), Some(Command::Status(ClientStatus::Ready)));
        assert_eq!(parse("!status won"), Err(CommandError::UnknownStatus("won".into())));
        assert!(matches!(parse("!status"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert_eq!(parse("!items").unwrap(), Some(Command::Items));
        assert_eq!(parse("!q").unwrap(), Some(Command::Quit));
        assert_eq!(parse("!jump"), Err(CommandError::Unknown("jump".into())));
        assert_eq!(parse("!"), Err(CommandError::Unknown(String::new())));
    }
}
