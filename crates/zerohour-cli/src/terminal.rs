//! Line-oriented terminal output.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;
use zerohour_core::choice::Choice;
use zerohour_reveal::renderer::RevealView;
use zerohour_scoring::application::query_handlers::LeaderboardView;
use zerohour_turn::application::query_handlers::SessionView;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

struct Sink {
    out: Box<dyn Write + Send>,
    open_line: bool,
}

/// Shared handle on the terminal output. The game driver and the reveal
/// view write through the same console, so a line the driver prints never
/// lands in the middle of a half-revealed entry.
#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Sink>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    /// Wraps `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink {
                out: Box::new(out),
                open_line: false,
            })),
        }
    }

    fn sink(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `text` as a line of its own.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn line(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink();
        if sink.open_line {
            sink.out.write_all(b"\n")?;
            sink.open_line = false;
        }
        sink.out.write_all(text.as_bytes())?;
        sink.out.write_all(b"\n")?;
        sink.out.flush()
    }

    /// Writes `text` on a fresh line and leaves the cursor after it.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn prompt(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink();
        if sink.open_line {
            sink.out.write_all(b"\n")?;
        }
        sink.out.write_all(text.as_bytes())?;
        sink.open_line = true;
        sink.out.flush()
    }

    /// Continues the current line with `text`.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn append(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink();
        sink.out.write_all(text.as_bytes())?;
        sink.open_line = !text.ends_with('\n');
        Ok(())
    }

    /// Rewrites the current line as `text` in bold and ends it. The cursor
    /// must be on the line that already shows `text`.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn highlight_line(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink();
        write!(sink.out, "\r{BOLD}{text}{RESET}\n")?;
        sink.open_line = false;
        sink.out.flush()
    }

    /// Marks the current line as ended without writing, e.g. after the
    /// player pressed enter.
    pub fn end_line(&self) {
        self.sink().open_line = false;
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns the underlying flush error.
    pub fn flush(&self) -> io::Result<()> {
        self.sink().out.flush()
    }
}

#[derive(Default)]
struct Drawn {
    chars: HashMap<usize, usize>,
    choices: HashSet<usize>,
    current: Option<usize>,
}

/// A [`RevealView`] that appends to the console.
///
/// A terminal cannot rewrite what it printed, so each draw only prints the
/// part of an entry not printed yet. Redrawing is harmless: entries and
/// choice lists already on screen are skipped.
pub struct TerminalView {
    console: Console,
    drawn: Mutex<Drawn>,
}

impl TerminalView {
    /// Creates a view over `console`.
    #[must_use]
    pub fn new(console: Console) -> Self {
        Self {
            console,
            drawn: Mutex::new(Drawn::default()),
        }
    }

    fn drawn(&self) -> MutexGuard<'_, Drawn> {
        self.drawn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(result: io::Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "terminal write failed");
        }
    }
}

impl std::fmt::Debug for TerminalView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalView").finish_non_exhaustive()
    }
}

impl RevealView for TerminalView {
    fn show_text(&self, index: usize, visible: &str) {
        let mut drawn = self.drawn();
        let already = drawn.chars.get(&index).copied().unwrap_or(0);
        let total = visible.chars().count();
        if total <= already {
            return;
        }
        let suffix: String = visible.chars().skip(already).collect();
        let result = if drawn.current == Some(index) {
            self.console.append(&suffix)
        } else {
            self.console.prompt(&suffix)
        };
        Self::report(result);
        drawn.chars.insert(index, total);
        drawn.current = Some(index);
    }

    fn scroll_to_bottom(&self) {
        Self::report(self.console.flush());
    }

    fn show_choices(&self, index: usize, choices: &[Choice]) {
        let mut drawn = self.drawn();
        if !drawn.choices.insert(index) {
            return;
        }
        drawn.current = None;
        for (position, choice) in choices.iter().enumerate() {
            Self::report(
                self.console
                    .line(&format!("  [{}] {}", position + 1, choice.text)),
            );
        }
    }
}

/// Formats the stat footer of `view`. Infection above the critical
/// threshold is flagged.
#[must_use]
pub fn stat_footer(view: &SessionView) -> String {
    let stats = &view.stats;
    let mut footer = format!(
        "DAY {} | POP:{}% TRUST:{}% INF:{}%",
        stats.day, stats.pop, stats.trust, stats.inf
    );
    if view.infection_critical {
        footer.push_str(" [CRITICAL]");
    }
    let _ = write!(footer, " ECO:{}% CURE:{}%", stats.eco, stats.cure);
    footer
}

/// Formats the ranked leaderboard, marking the local player's rows.
#[must_use]
pub fn leaderboard_lines(view: &LeaderboardView) -> Vec<String> {
    let mut lines = vec!["=== GLOBAL ARCHIVE ===".to_owned()];
    if view.rows.is_empty() {
        lines.push("  (no records)".to_owned());
    }
    for row in &view.rows {
        let marker = if row.is_local { '>' } else { ' ' };
        lines.push(format!(
            "{marker} {:>2}. {:<16} DAY {:>3}  {:>6}",
            row.rank, row.name, row.days, row.score
        ));
    }
    lines
}
