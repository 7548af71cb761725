use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use vrc_osc_debugger::config::CliOverrides;
use vrc_osc_debugger::general::check::ListenerStatus;
use vrc_osc_debugger::io::{RowTable, TableRow};
use vrc_osc_debugger::log_scanner::{self, LogFlags};
use vrc_osc_debugger::remote::osc_listener;
use vrc_osc_debugger::{IgnoreList, ParameterRegistry, Presenter};

#[derive(Parser, Debug)]
#[command(name = "vrc-osc-debugger-gui")]
#[command(about = "OSC Live Debugger - window", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CliOverrides,
}

const MAX_LOG_LINES: usize = 200;
const PARAM_COLUMN_FRACTION: f32 = 2.0 / 3.0;

struct GuiLogger {
    tx: Sender<String>,
    max_level: log::LevelFilter,
}

impl log::Log for GuiLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let msg = format!("[{}] {}", record.level(), record.args());
            let _ = self.tx.send(msg);
        }
    }

    fn flush(&self) {}
}

enum RowAction {
    CopyText(String),
    Ignore(String),
    Unignore(String),
    Clear,
}

struct DebuggerApp {
    presenter: Presenter<RowTable>,
    flags: LogFlags,
    info_line: String,
    last_info: Instant,
    tick_interval: Duration,
    info_refresh: Duration,
    status: Arc<ListenerStatus>,
    log_rx: Receiver<String>,
    log_lines: VecDeque<String>,
    warning: Option<String>,
    show_ignored: bool,
    shutdown: Arc<AtomicBool>,
    listener: Option<thread::JoinHandle<()>>,
    repainter: Option<thread::JoinHandle<()>>,
}

const REPAINT_POLL: Duration = Duration::from_millis(200);

/// Repaint as soon as the listener records something, instead of waiting
/// for the next frame timer.
fn spawn_repainter(
    registry: ParameterRegistry,
    ctx: egui::Context,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !shutdown.load(Ordering::SeqCst) {
            if registry.wait_for_change(REPAINT_POLL) {
                ctx.request_repaint();
            }
        }
    })
}

impl DebuggerApp {
    fn drain_logs(&mut self) {
        while let Ok(line) = self.log_rx.try_recv() {
            self.log_lines.push_back(line);
            while self.log_lines.len() > MAX_LOG_LINES {
                self.log_lines.pop_front();
            }
        }
    }

    fn apply(&mut self, ctx: &egui::Context, action: RowAction) {
        match action {
            RowAction::CopyText(text) => ctx.copy_text(text),
            RowAction::Ignore(address) => {
                self.warning = self.presenter.ignore(&address).err().map(|e| e.to_string());
            }
            RowAction::Unignore(address) => {
                self.warning = self.presenter.unignore(&address).err().map(|e| e.to_string());
            }
            RowAction::Clear => self.presenter.clear(),
        }
    }
}

fn cell(ui: &mut egui::Ui, width: f32, height: f32, text: egui::RichText) -> egui::Response {
    ui.allocate_ui_with_layout(
        egui::vec2(width, height),
        egui::Layout::left_to_right(egui::Align::Center),
        |ui| {
            ui.set_min_width(width);
            ui.add(egui::Label::new(text).truncate().sense(egui::Sense::click()))
        },
    )
    .inner
}

fn table_ui(ui: &mut egui::Ui, rows: &[TableRow], actions: &mut Vec<RowAction>) {
    let total = ui.available_width();
    let param_width = (total * PARAM_COLUMN_FRACTION).floor();
    let value_width = (total - param_width - ui.spacing().item_spacing.x).max(0.0);
    let row_height = ui.text_style_height(&egui::TextStyle::Body) + 4.0;

    ui.horizontal(|ui| {
        cell(ui, param_width, row_height, egui::RichText::new("Parameter").strong());
        cell(ui, value_width, row_height, egui::RichText::new("Value").strong());
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if rows.is_empty() {
                ui.weak("No parameters received yet");
            }
            for row in rows {
                let value = row.value.to_string();
                let response = ui
                    .horizontal(|ui| {
                        let name = cell(ui, param_width, row_height, egui::RichText::new(&row.address));
                        let shown = cell(ui, value_width, row_height, egui::RichText::new(&value));
                        name.union(shown)
                    })
                    .inner;
                response.context_menu(|ui| {
                    if ui.button("Copy parameter").clicked() {
                        actions.push(RowAction::CopyText(row.address.clone()));
                        ui.close();
                    }
                    if ui.button("Copy value").clicked() {
                        actions.push(RowAction::CopyText(value.clone()));
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Ignore").clicked() {
                        actions.push(RowAction::Ignore(row.address.clone()));
                        ui.close();
                    }
                });
            }
        });
}

fn ignored_window(
    ctx: &egui::Context,
    open: &mut bool,
    ignore_list: &IgnoreList,
    actions: &mut Vec<RowAction>,
) {
    egui::Window::new("Ignored parameters")
        .open(open)
        .default_size([400.0, 300.0])
        .show(ctx, |ui| {
            ui.weak(format!("Saved in {}", ignore_list.path().display()));
            if ignore_list.is_empty() {
                ui.weak("Nothing ignored. Right-click a row to ignore it.");
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for address in ignore_list.iter() {
                    ui.horizontal(|ui| {
                        if ui.small_button("Remove").clicked() {
                            actions.push(RowAction::Unignore(address.to_string()));
                        }
                        ui.label(address);
                    });
                }
            });
        });
}

impl eframe::App for DebuggerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_logs();
        self.presenter.tick();
        if self.last_info.elapsed() >= self.info_refresh {
            self.info_line = self.flags.info_line();
            self.last_info = Instant::now();
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    actions.push(RowAction::Clear);
                }
                let ignored = format!("Ignored ({})…", self.presenter.ignore_list().len());
                if ui.button(ignored).clicked() {
                    self.show_ignored = !self.show_ignored;
                }
                ui.separator();
                ui.weak(self.status.summary());
            });
        });

        egui::TopBottomPanel::bottom("info").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new(&self.info_line).monospace().size(13.0));
            if let Some(warning) = &self.warning {
                ui.colored_label(egui::Color32::YELLOW, warning);
            }
            if let Some(line) = self.log_lines.back() {
                ui.weak(line);
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            table_ui(ui, self.presenter.view().rows(), &mut actions);
        });

        if self.show_ignored {
            ignored_window(
                ctx,
                &mut self.show_ignored,
                self.presenter.ignore_list(),
                &mut actions,
            );
        }

        for action in actions {
            self.apply(ctx, action);
        }
        self.presenter.view_mut().mark_clean();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        ctx.request_repaint_after(self.tick_interval);
    }
}

impl Drop for DebuggerApp {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in [self.listener.take(), self.repainter.take()].into_iter().flatten() {
            let _ = handle.join();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_level = args.common.log_level().max(log::LevelFilter::Info);

    let (log_tx, log_rx) = crossbeam_channel::unbounded::<String>();
    let logger = GuiLogger {
        tx: log_tx,
        max_level: log_level,
    };
    log::set_boxed_logger(Box::new(logger)).ok();
    log::set_max_level(log_level);

    let config = args.common.load_config()?;
    let flags = log_scanner::scan_dir_or_default(config.resolved_log_dir().as_deref());

    let socket = osc_listener::bind(&config.listen_addr())?;
    let registry = ParameterRegistry::new();
    let status = Arc::new(ListenerStatus::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let listener = osc_listener::spawn_osc_listener(
        socket,
        registry.clone(),
        Arc::clone(&status),
        Arc::clone(&shutdown),
    );

    let ignore_list = IgnoreList::load(&config.ignore_list_path);
    let mut app = DebuggerApp {
        presenter: Presenter::new(registry, ignore_list, RowTable::new()),
        info_line: flags.info_line(),
        flags,
        last_info: Instant::now(),
        tick_interval: config.tick_interval(),
        info_refresh: config.info_refresh(),
        status,
        log_rx,
        log_lines: VecDeque::new(),
        warning: None,
        show_ignored: false,
        shutdown,
        listener: Some(listener),
        repainter: None,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 400.0])
            .with_min_inner_size([320.0, 200.0])
            .with_title("OSC Live Debugger"),
        ..Default::default()
    };

    eframe::run_native(
        "OSC Live Debugger",
        native_options,
        Box::new(move |cc| {
            app.repainter = Some(spawn_repainter(
                app.presenter.registry().clone(),
                cc.egui_ctx.clone(),
                Arc::clone(&app.shutdown),
            ));
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
