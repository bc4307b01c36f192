//! Colored log output.

use std::{
    fmt::Write as _,
    io::{self, Write},
};

use archlink_client::{Color, LogLine, LogSink};
use crossterm::style::{Color as TermColor, Stylize};
use parking_lot::Mutex;

/// Log sink writing one ANSI-colored line per entry.
pub struct Console<W: Write + Send> {
    out: Mutex<W>,
}

impl Console<io::Stdout> {
    /// Console on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Console<W> {
    /// Console writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consume the console, returning the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> LogSink for Console<W> {
    fn add(&self, line: LogLine) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{}", render(&line)).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "could not write log line");
        }
    }
}

/// Render `line` with ANSI color codes.
pub fn render(line: &LogLine) -> String {
    match line {
        LogLine::Plain(text) => text.clone(),
        LogLine::Segments(segments) => {
            let mut rendered = String::new();
            for segment in segments {
                let styled = segment.text.as_str().with(term_color(segment.color));
                let _ = write!(rendered, "{styled}");
            }
            rendered
        },
    }
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Red => TermColor::Red,
        Color::Green => TermColor::Green,
        Color::Yellow => TermColor::Yellow,
        Color::Blue => TermColor::Blue,
        Color::Magenta => TermColor::Magenta,
        Color::Cyan => TermColor::Cyan,
        Color::DarkGray => TermColor::DarkGrey,
        Color::White => TermColor::White,
        Color::Orange => TermColor::Rgb { r: 255, g: 165, b: 0 },
        Color::Crimson => TermColor::Rgb { r: 220, g: 20, b: 60 },
        Color::Aquamarine => TermColor::Rgb { r: 127, g: 255, b: 212 },
    }
}
