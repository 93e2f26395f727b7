//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` / `debug!` macros for terminal output with colored `[module]` prefixes
//! - `ProgressLine` for the one-shot builds, one counter per asset kind
//! - `WatchStatus` for the single status block shown while `dev` is watching
//!
//! # Example
//!
//! ```ignore
//! log!("styles"; "compiled {} stylesheets", count);
//!
//! let progress = ProgressLine::new("production", &[("styles", 3), ("scripts", 2)]);
//! progress.inc("styles");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Active progress line count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);

    let mut stdout = stdout().lock();

    // progress line has no trailing newline: wipe it before printing
    if BAR_COUNT.load(Ordering::SeqCst) > 0 {
        clear_line(&mut stdout);
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn clear_line(out: &mut impl Write) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

/// Apply color to a module prefix based on module type
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" | "reload" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.yellow().bold().to_string(),
        "styles" => prefix.bright_magenta().bold().to_string(),
        "scripts" => prefix.bright_cyan().bold().to_string(),
        "html" => prefix.cyan().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (single-block status with overwrite)
// ============================================================================

/// Current wall-clock time (UTC) as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Status block for watch mode.
///
/// Every message overwrites the previous block, so the terminal shows only
/// the outcome of the latest rebuild.
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

/// Shared by every per-kind worker so their reports replace one another.
static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    /// ✓ prefix, green.
    pub fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    /// Dimmed, no symbol.
    pub fn unchanged(&mut self, message: &str) {
        self.display(String::new(), &format!("{}", message.dimmed()));
    }

    /// ✗ prefix, red, detail on the following lines.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display(format!("{}", "✗".red()), &message);
    }

    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        let line = if symbol.is_empty() {
            format!("{timestamp} {message}")
        } else {
            format!("{timestamp} {symbol} {message}")
        };

        writeln!(stdout, "{line}").ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

/// Global watch status: unchanged
pub fn status_unchanged(message: &str) {
    WATCH_STATUS.lock().unchanged(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

// ============================================================================
// Progress Line (single-line counters)
// ============================================================================

/// One-line counters for a build, one per asset kind with work to do:
/// `[production] html(4/4) styles(1/3) scripts(0/2)`
///
/// Rayon workers call [`ProgressLine::inc`]; a redraw is skipped when another
/// worker holds the terminal.
pub struct ProgressLine {
    label: &'static str,
    counters: Vec<(&'static str, usize, AtomicUsize)>,
    redraw: Mutex<()>,
}

impl ProgressLine {
    /// Kinds with nothing to build get no counter.
    pub fn new(label: &'static str, totals: &[(&'static str, usize)]) -> Self {
        let counters = totals
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| (name, total, AtomicUsize::new(0)))
            .collect();

        BAR_COUNT.store(1, Ordering::SeqCst);
        let progress = Self {
            label,
            counters,
            redraw: Mutex::new(()),
        };
        progress.draw("");
        progress
    }

    #[inline]
    pub fn inc(&self, name: &str) {
        let Some((_, _, done)) = self.counters.iter().find(|(n, ..)| *n == name) else {
            return;
        };
        done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.redraw.try_lock() {
            self.draw("");
        }
    }

    fn render(&self) -> String {
        let parts: Vec<String> = self
            .counters
            .iter()
            .map(|(name, total, done)| format!("{name}({}/{total})", done.load(Ordering::Relaxed)))
            .collect();
        parts.join(" ")
    }

    fn draw(&self, end: &str) {
        let mut stdout = stdout().lock();
        clear_line(&mut stdout);
        write!(stdout, "{} {}{end}", colorize_prefix(self.label), self.render()).ok();
        stdout.flush().ok();
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        {
            let _guard = self.redraw.lock();
            self.draw("\n");
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        clear_line(&mut stdout);
        stdout.flush().ok();
    }
}
