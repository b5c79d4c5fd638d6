use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use std::sync::{Arc, Mutex, OnceLock};

use crate::screen::Screen;

/// Styled line writers layered over the raw screen. Stateless beyond the
/// screen reference; formatting only.
pub struct OutputChannel {
    screen: Arc<dyn Screen>,
}

impl OutputChannel {
    pub fn new(screen: Arc<dyn Screen>) -> Self {
        Self { screen }
    }

    pub fn write(&self, text: &str) {
        self.screen.write(text);
    }

    pub fn write_line(&self, text: &str) {
        self.screen.write_line(text);
    }

    pub fn write_error(&self, message: &str, with_icon: bool) {
        self.write_line(&prefixed(message, with_icon, "✗").red().to_string());
    }

    pub fn write_warning(&self, message: &str, with_icon: bool) {
        self.write_line(&prefixed(message, with_icon, "⚠").yellow().to_string());
    }

    pub fn write_success(&self, message: &str, with_icon: bool) {
        self.write_line(&prefixed(message, with_icon, "✔").green().to_string());
    }

    pub fn write_info(&self, message: &str, with_icon: bool) {
        self.write_line(&prefixed(message, with_icon, "ℹ").cyan().to_string());
    }
}

fn prefixed(message: &str, with_icon: bool, icon: &str) -> String {
    if with_icon {
        format!("{} {}", icon, message)
    } else {
        message.to_string()
    }
}

static LOG_SCREEN: OnceLock<Mutex<Option<Arc<dyn Screen>>>> = OnceLock::new();

fn screen_cell() -> &'static Mutex<Option<Arc<dyn Screen>>> {
    LOG_SCREEN.get_or_init(|| Mutex::new(None))
}

/// Routes `log` records through the session screen once one exists. Before
/// that (or after teardown) records fall back to stderr/stdout.
pub fn set_log_screen(screen: Arc<dyn Screen>) {
    let mut guard = screen_cell().lock().expect("log screen lock");
    *guard = Some(screen);
}

pub fn clear_log_screen() {
    let mut guard = screen_cell().lock().expect("log screen lock");
    *guard = None;
}

fn log_write_line(text: &str, is_err: bool) {
    let guard = screen_cell().lock().expect("log screen lock");
    if let Some(screen) = guard.as_ref() {
        screen.write_line(text);
    } else if is_err {
        ::std::eprintln!("{}", text);
    } else {
        ::std::println!("{}", text);
    }
}

pub struct OutputLogger {
    level: LevelFilter,
}

impl OutputLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl log::Log for OutputLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let is_err = matches!(record.level(), Level::Error | Level::Warn);
        log_write_line(&format!("[{}] {}", record.level(), record.args()), is_err);
    }

    fn flush(&self) {}
}

pub fn init_logger(default_level: LevelFilter) {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);

    let logger = OutputLogger::new(level);
    let _ = log::set_boxed_logger(Box::new(logger));
    log::set_max_level(level);
}
