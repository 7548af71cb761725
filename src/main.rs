use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::{select, unbounded, Receiver};
use termcolor::{ColorChoice, StandardStream};

use vrc_osc_debugger::config::CliOverrides;
use vrc_osc_debugger::general::check::{self, ListenerStatus};
use vrc_osc_debugger::general::stdin_handler::{spawn_stdin_handler, ConsoleCommand, HELP_TEXT};
use vrc_osc_debugger::io::terminal::{self, Frame};
use vrc_osc_debugger::io::RowTable;
use vrc_osc_debugger::log_scanner::{self, LogFlags};
use vrc_osc_debugger::remote::osc_listener;
use vrc_osc_debugger::{DebuggerConfig, IgnoreList, ParameterRegistry, Presenter};

#[derive(Parser, Debug)]
#[command(name = "vrc-osc-debugger")]
#[command(about = "Live table of VRChat avatar OSC parameters", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CliOverrides,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.common.log_level())
        .parse_default_env()
        .init();

    let config = args.common.load_config()?;
    let flags = log_scanner::scan_dir_or_default(config.resolved_log_dir().as_deref());

    let addr = config.listen_addr();
    let socket = match osc_listener::bind(&addr) {
        Ok(socket) => socket,
        Err(err) => {
            check::print_bind_failed(&addr);
            return Err(err.into());
        }
    };
    check::print_listening(&addr);
    check::print_quick_help();

    let registry = ParameterRegistry::new();
    let status = Arc::new(ListenerStatus::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let listener = osc_listener::spawn_osc_listener(
        socket,
        registry.clone(),
        Arc::clone(&status),
        Arc::clone(&shutdown),
    );

    // The stdin thread stays blocked on read_line at exit, so it is not joined.
    let (command_tx, command_rx) = unbounded();
    let _stdin_handle = spawn_stdin_handler(command_tx);

    let ignore_list = IgnoreList::load(&config.ignore_list_path);
    let presenter = Presenter::new(registry, ignore_list, RowTable::new());
    let result = run_console(presenter, &command_rx, &flags, &status, &config);

    shutdown.store(true, Ordering::SeqCst);
    let _ = listener.join();
    println!("Closing listener and exiting...");
    result
}

#[derive(Default)]
struct ConsoleUi {
    show_ignored: bool,
    notice: Option<String>,
    redraw: bool,
}

impl ConsoleUi {
    fn apply(&mut self, presenter: &mut Presenter<RowTable>, command: ConsoleCommand) {
        self.redraw = true;
        self.notice = match command {
            ConsoleCommand::Clear => {
                presenter.clear();
                Some("Cleared all parameters".to_string())
            }
            ConsoleCommand::Ignore(address) => match presenter.ignore(&address) {
                Ok(()) => Some(format!("Ignoring {}", address)),
                Err(err) => Some(format!("Warning: {}", err)),
            },
            ConsoleCommand::Unignore(address) => {
                if !presenter.ignore_list().contains(&address) {
                    Some(format!("{} is not in the ignore list", address))
                } else {
                    match presenter.unignore(&address) {
                        Ok(()) => Some(format!("Showing {} again", address)),
                        Err(err) => Some(format!("Warning: {}", err)),
                    }
                }
            }
            ConsoleCommand::ShowIgnored => {
                self.show_ignored = !self.show_ignored;
                self.show_ignored
                    .then(|| format!("Ignore list file: {}", presenter.ignore_list().path().display()))
            }
            ConsoleCommand::Help => Some(HELP_TEXT.to_string()),
            ConsoleCommand::Unrecognized(cmd) => Some(format!(
                "Unrecognized command: '{}'. Type 'help' for available commands.",
                cmd
            )),
            ConsoleCommand::Exit => None,
        };
    }
}

fn run_console(
    mut presenter: Presenter<RowTable>,
    commands: &Receiver<ConsoleCommand>,
    flags: &LogFlags,
    status: &ListenerStatus,
    config: &DebuggerConfig,
) -> anyhow::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let tick_interval = config.tick_interval();
    let info_refresh = config.info_refresh();
    let changes = presenter.registry().changes().clone();

    let mut ui = ConsoleUi {
        redraw: true,
        ..ConsoleUi::default()
    };
    let mut info_line = flags.info_line();
    let mut last_info = Instant::now();
    let mut status_line = String::new();
    let mut next_frame = Instant::now();

    loop {
        let pending = ui.redraw || presenter.view().is_dirty();
        // While a redraw is pending only commands can cut the frame wait short;
        // registry bursts are picked up by the tick that precedes the redraw.
        let command = if pending {
            select! {
                recv(commands) -> cmd => Some(cmd),
                default(next_frame.saturating_duration_since(Instant::now())) => None,
            }
        } else {
            select! {
                recv(commands) -> cmd => Some(cmd),
                recv(changes) -> _ => None,
                default(tick_interval) => None,
            }
        };

        if let Some(cmd) = command {
            match cmd {
                Ok(ConsoleCommand::Exit) | Err(_) => break,
                Ok(command) => {
                    ui.apply(&mut presenter, command);
                    next_frame = Instant::now();
                }
            }
        }

        presenter.tick();

        if last_info.elapsed() >= info_refresh {
            info_line = flags.info_line();
            last_info = Instant::now();
        }
        let current_status = status.summary();
        if current_status != status_line {
            status_line = current_status;
            ui.redraw = true;
        }

        let now = Instant::now();
        if (ui.redraw || presenter.view().is_dirty()) && now >= next_frame {
            let ignored = ui
                .show_ignored
                .then(|| presenter.ignore_list().iter().collect::<Vec<_>>());
            let frame = Frame {
                rows: presenter.view().rows(),
                info_line: &info_line,
                status: &status_line,
                notice: ui.notice.as_deref(),
                ignored,
            };
            terminal::render(&mut stdout, &frame)?;
            presenter.view_mut().mark_clean();
            ui.redraw = false;
            next_frame = now + tick_interval;
        }
    }

    Ok(())
}
