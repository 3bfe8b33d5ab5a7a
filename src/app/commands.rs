use crate::domain::model::StatusFilter;
use crate::utils::error::{AdminError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String },
    Logout,
    List,
    Refresh,
    Search { text: String },
    Filter(StatusFilter),
    Add { key: String },
    Toggle { id: i64 },
    Delete { id: i64 },
    Copy { id: i64 },
    Stats,
    Status,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  login <username>     log in (password is read from the next line)
  logout               end the session
  list                 show licenses matching the current search/filter
  refresh              reload licenses from the server
  search [text]        set the key search text (empty clears it)
  filter <status>      all | active | inactive
  add <key>            create a license
  toggle <id>          activate/deactivate a license
  delete <id>          delete a license (asks for confirmation)
  copy <id>            print only the license key
  stats                show license counters
  status               show session information
  help                 show this help
  quit                 exit";

fn parse_id(command: &str, arg: Option<&str>) -> Result<i64> {
    let raw = arg.ok_or_else(|| AdminError::InvalidInput {
        message: format!("usage: {} <id>", command),
    })?;
    raw.parse::<i64>().map_err(|_| AdminError::InvalidInput {
        message: format!("'{}' is not a valid license id", raw),
    })
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then_some(rest);

    match name.to_ascii_lowercase().as_str() {
        "login" => match arg {
            Some(username) => Ok(Command::Login {
                username: username.to_string(),
            }),
            None => Err(AdminError::InvalidInput {
                message: "usage: login <username>".to_string(),
            }),
        },
        "logout" => Ok(Command::Logout),
        "list" | "ls" => Ok(Command::List),
        "refresh" => Ok(Command::Refresh),
        "search" => Ok(Command::Search {
            text: rest.to_string(),
        }),
        "filter" => {
            let status = arg.ok_or_else(|| AdminError::InvalidInput {
                message: "usage: filter <all|active|inactive>".to_string(),
            })?;
            Ok(Command::Filter(status.parse()?))
        }
        "add" => match arg {
            Some(key) => Ok(Command::Add {
                key: key.to_string(),
            }),
            None => Err(AdminError::InvalidInput {
                message: "usage: add <key>".to_string(),
            }),
        },
        "toggle" => Ok(Command::Toggle {
            id: parse_id("toggle", arg)?,
        }),
        "delete" | "rm" => Ok(Command::Delete {
            id: parse_id("delete", arg)?,
        }),
        "copy" => Ok(Command::Copy {
            id: parse_id("copy", arg)?,
        }),
        "stats" => Ok(Command::Stats),
        "status" | "whoami" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(AdminError::InvalidInput {
            message: format!("unknown command '{}', type 'help'", other),
        }),
    }
}
