//! Command orchestration helpers from console input to the backend command queue.

use control_core::validate_difficulty;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Backend(BackendCommand),
    ShowView,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
commands:
  status              probe the backend
  launch              open the dashboard and close the launcher
  open | close        open the dashboard / close the launcher
  close-dashboard     close the dashboard window
  activate            bring the launcher back after all windows closed
  connect [url]       connect the stats relay
  disconnect          disconnect the stats relay
  start <1..32>       run a mining job at the given difficulty
  stop                stop the running job
  stats               fetch stats once
  view                print the current launcher and dashboard state
  quit                exit";

pub fn parse_console_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ConsoleCommand::Empty);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{head}'"));
    }

    let backend = |cmd| Ok(ConsoleCommand::Backend(cmd));
    match (head.to_ascii_lowercase().as_str(), arg) {
        ("status", None) => backend(BackendCommand::CheckStatus),
        ("launch", None) => backend(BackendCommand::Launch),
        ("open", None) => backend(BackendCommand::OpenDashboard),
        ("close", None) => backend(BackendCommand::CloseLauncher),
        ("close-dashboard", None) => backend(BackendCommand::CloseDashboard),
        ("activate", None) => backend(BackendCommand::Reactivate),
        ("connect", address) => backend(BackendCommand::ConnectRelay {
            address: address.map(str::to_string),
        }),
        ("disconnect", None) => backend(BackendCommand::DisconnectRelay),
        ("start", Some(raw)) => {
            let difficulty = raw
                .parse::<i64>()
                .map_err(|_| format!("invalid difficulty '{raw}'"))
                .and_then(validate_difficulty)?;
            backend(BackendCommand::StartJob { difficulty })
        }
        ("start", None) => Err("missing difficulty; usage: start <1..32>".to_string()),
        ("stop", None) => backend(BackendCommand::StopJob),
        ("stats", None) => backend(BackendCommand::FetchStats),
        ("view", None) => Ok(ConsoleCommand::ShowView),
        ("help" | "?", None) => Ok(ConsoleCommand::Help),
        ("quit" | "exit", None) => Ok(ConsoleCommand::Quit),
        (_, Some(_)) if is_known(head) => Err(format!("'{head}' takes no arguments")),
        _ => Err(format!("unknown command '{head}'; type 'help'")),
    }
}

fn is_known(head: &str) -> bool {
    matches!(
        head.to_ascii_lowercase().as_str(),
        "status"
            | "launch"
            | "open"
            | "close"
            | "close-dashboard"
            | "activate"
            | "disconnect"
            | "stop"
            | "stats"
            | "view"
            | "help"
            | "quit"
            | "exit"
    )
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure)"
                    .to_string();
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
