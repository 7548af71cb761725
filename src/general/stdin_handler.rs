use std::io::{stdin, BufRead};
use std::thread;

use crossbeam_channel::Sender;

/// Actions typed on the console, applied by the thread that owns the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Clear,
    Ignore(String),
    Unignore(String),
    ShowIgnored,
    Help,
    Exit,
    Unrecognized(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  clear              - Forget all received parameters
  ignore <address>   - Hide a parameter (saved to the ignore list)
  unignore <address> - Show a hidden parameter again
  ignored            - Toggle the list of hidden parameters
  help/h             - Show this help
  exit/quit/q        - Exit program";

/// Parse one console line. Empty lines yield `None`.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let cmd = line.trim();
    if cmd.is_empty() {
        return None;
    }
    let (word, rest) = match cmd.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (cmd, ""),
    };

    let command = if word.eq_ignore_ascii_case("exit")
        || word.eq_ignore_ascii_case("quit")
        || word.eq_ignore_ascii_case("q")
    {
        ConsoleCommand::Exit
    } else if word.eq_ignore_ascii_case("help") || word.eq_ignore_ascii_case("h") {
        ConsoleCommand::Help
    } else if word.eq_ignore_ascii_case("clear") {
        ConsoleCommand::Clear
    } else if word.eq_ignore_ascii_case("ignored") {
        ConsoleCommand::ShowIgnored
    } else if word.eq_ignore_ascii_case("ignore") && !rest.is_empty() {
        ConsoleCommand::Ignore(rest.to_string())
    } else if word.eq_ignore_ascii_case("unignore") && !rest.is_empty() {
        ConsoleCommand::Unignore(rest.to_string())
    } else {
        ConsoleCommand::Unrecognized(cmd.to_string())
    };
    Some(command)
}

/// Spawn a thread that reads lines from stdin and forwards parsed commands.
/// End of input is treated as `exit`. The thread ends after sending `Exit`
/// or once the receiver is gone.
pub fn spawn_stdin_handler(tx: Sender<ConsoleCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = stdin();
        let mut lines = stdin.lock().lines();
        loop {
            let command = match lines.next() {
                Some(Ok(line)) => match parse_command(&line) {
                    Some(command) => command,
                    None => continue,
                },
                Some(Err(e)) => {
                    log::warn!("stdin read error: {}", e);
                    ConsoleCommand::Exit
                }
                None => ConsoleCommand::Exit,
            };
            let exit = command == ConsoleCommand::Exit;
            if tx.send(command).is_err() || exit {
                break;
            }
        }
    })
}
