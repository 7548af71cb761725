use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Listener health shared between the ingest thread and the views.
#[derive(Debug, Default)]
pub struct ListenerStatus {
    running: AtomicBool,
    packets: AtomicU64,
    dropped: AtomicU64,
}

impl ListenerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_started(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn count_packet(&self) {
        self.packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Datagrams received, including undecodable ones.
    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        format!(
            "packets={} dropped={}{}",
            self.packets(),
            self.dropped(),
            if self.is_running() { "" } else { " (listener stopped)" }
        )
    }
}

fn print_colored(color: Color, text: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", text);
    let _ = stdout.reset();
}

pub fn print_quick_help() {
    print_colored(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

pub fn print_listening(addr: &str) {
    print_colored(Color::Green, &format!("Listening for OSC events on {}...", addr));
}

pub fn print_bind_failed(addr: &str) {
    print_colored(
        Color::Red,
        &format!("Could not listen on {} | is another OSC tool using this port?", addr),
    );
}
