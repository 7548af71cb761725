//! Redraw-on-change table for the console front end.

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::io::table::TableRow;

const MIN_PARAM_WIDTH: usize = "Parameter".len();
const MAX_PARAM_WIDTH: usize = 64;

/// Everything one redraw shows.
#[derive(Debug, Default)]
pub struct Frame<'a> {
    pub rows: &'a [TableRow],
    pub info_line: &'a str,
    pub status: &'a str,
    pub notice: Option<&'a str>,
    /// Shown below the table when the user toggled the ignored list.
    pub ignored: Option<Vec<&'a str>>,
}

fn param_width(rows: &[TableRow]) -> usize {
    rows.iter()
        .map(|row| row.address.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(MIN_PARAM_WIDTH, MAX_PARAM_WIDTH)
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return format!("{:<width$}", text, width = width);
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn render<W: WriteColor>(out: &mut W, frame: &Frame<'_>) -> io::Result<()> {
    if out.supports_color() {
        // clear screen, cursor home
        write!(out, "\x1b[2J\x1b[H")?;
    } else {
        writeln!(out)?;
    }

    let width = param_width(frame.rows);
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{} | Value", fit("Parameter", width))?;
    out.reset()?;
    writeln!(out, "{}-+-{}", "-".repeat(width), "-".repeat(16))?;
    for row in frame.rows {
        writeln!(out, "{} | {}", fit(&row.address, width), row.value)?;
    }
    if frame.rows.is_empty() {
        writeln!(out, "(no parameters received yet)")?;
    }
    writeln!(out)?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_intense(true))?;
    writeln!(out, "{}", frame.info_line)?;
    out.reset()?;
    if !frame.status.is_empty() {
        writeln!(out, "{}", frame.status)?;
    }

    if let Some(ignored) = &frame.ignored {
        writeln!(out)?;
        out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(out, "Ignored parameters ({}):", ignored.len())?;
        out.reset()?;
        for address in ignored {
            writeln!(out, "  {}", address)?;
        }
    }

    if let Some(notice) = frame.notice {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_intense(true))?;
        writeln!(out, "{}", notice)?;
        out.reset()?;
    }
    out.flush()
}
