//! Line-oriented console standing in for the launcher and dashboard windows.

use std::{
    io::{self, BufRead, Write},
    thread,
};

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::UiEvent,
    orchestration::{dispatch_backend_command, parse_console_command, ConsoleCommand, HELP},
    reducer::AppView,
};

pub fn timestamped(at: DateTime<Local>, line: &str) -> String {
    format!("[{}] {line}", at.format("%H:%M:%S"))
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (line_tx, line_rx) = bounded::<String>(64);
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
        // Dropping the sender tells the console that input reached EOF.
    });
    line_rx
}

pub struct Console<W: Write> {
    out: W,
    view: AppView,
    cmd_tx: Sender<BackendCommand>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, cmd_tx: Sender<BackendCommand>) -> Self {
        Self {
            out,
            view: AppView::default(),
            cmd_tx,
        }
    }

    pub fn view(&self) -> &AppView {
        &self.view
    }

    fn print(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", timestamped(Local::now(), line))
    }

    fn dispatch(&mut self, cmd: BackendCommand) -> io::Result<()> {
        let mut status = String::new();
        dispatch_backend_command(&self.cmd_tx, cmd, &mut status);
        if status.is_empty() {
            Ok(())
        } else {
            self.print(&status)
        }
    }

    /// Handles one input line. EOF is reported as `None`, which quits like `quit`.
    pub fn handle_input(&mut self, line: Option<&str>) -> io::Result<()> {
        let Some(line) = line else {
            return self.dispatch(BackendCommand::Terminate);
        };
        match parse_console_command(line) {
            Ok(ConsoleCommand::Backend(cmd)) => self.dispatch(cmd),
            Ok(ConsoleCommand::ShowView) => {
                for line in self.view.lines() {
                    self.print(&line)?;
                }
                Ok(())
            }
            Ok(ConsoleCommand::Help) => writeln!(self.out, "{HELP}"),
            Ok(ConsoleCommand::Quit) => self.dispatch(BackendCommand::Terminate),
            Ok(ConsoleCommand::Empty) => Ok(()),
            Err(message) => self.print(&message),
        }
    }

    /// Applies one backend event. Returns false once the process should exit.
    pub fn handle_event(&mut self, event: UiEvent) -> io::Result<bool> {
        let keep_running = !matches!(event, UiEvent::Shutdown(_));
        for line in self.view.apply(event) {
            self.print(&line)?;
        }
        self.out.flush()?;
        Ok(keep_running)
    }
}

pub fn run(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> anyhow::Result<()> {
    let mut console = Console::new(io::stdout(), cmd_tx);
    let line_rx = spawn_stdin_reader();
    let closed_input = crossbeam_channel::never::<String>();
    let mut input_open = true;

    console.print("Type 'help' for commands.")?;
    console.dispatch(BackendCommand::CheckStatus)?;

    loop {
        let input_rx = if input_open { &line_rx } else { &closed_input };
        select! {
            recv(ui_rx) -> event => {
                let Ok(event) = event else {
                    tracing::warn!("backend worker stopped without a shutdown signal");
                    return Ok(());
                };
                if !console.handle_event(event)? {
                    return Ok(());
                }
            }
            recv(input_rx) -> line => match line {
                Ok(line) => console.handle_input(Some(&line))?,
                Err(_) => {
                    input_open = false;
                    console.handle_input(None)?;
                }
            },
        }
    }
}
