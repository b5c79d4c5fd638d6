use anyhow::Result;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal, ExecutableCommand,
};
use log::debug;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::ansi;
use crate::engine::InputEvent;

/// Capability surface of the rendering backend. The engine only ever writes
/// raw text (ANSI sequences included) and asks for the viewport width.
pub trait Screen: Send + Sync {
    fn write(&self, text: &str);

    fn write_line(&self, text: &str) {
        self.write(text);
        self.write("\r\n");
    }

    /// Current viewport width in columns. Never zero.
    fn columns(&self) -> usize;

    fn clear(&self);
}

/// A real terminal on stdout, kept in raw mode with bracketed paste enabled
/// for as long as the value lives.
pub struct TerminalScreen;

impl TerminalScreen {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(EnableBracketedPaste)?;
        Ok(Self)
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = io::stdout().execute(DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

impl Screen for TerminalScreen {
    fn write(&self, text: &str) {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn columns(&self) -> usize {
        terminal::size().map(|(w, _)| w as usize).unwrap_or(80).max(1)
    }

    fn clear(&self) {
        self.write(&ansi::clear_screen());
    }
}

/// Reads crossterm events on a blocking thread and forwards them to the
/// engine's channel. Ctrl+D ends the session by closing the channel.
pub fn spawn_input_reader(events: UnboundedSender<InputEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if key.code == KeyCode::Char('d')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.kind == KeyEventKind::Press
                {
                    break;
                }
                if events.send(InputEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(Event::Paste(pasted)) => {
                if events.send(InputEvent::Paste(pasted)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                // Transient read errors happen on some platforms; keep going.
                debug!("input read error (continuing): {}", e);
            }
        }
    })
}

/// In-memory screen for tests: records every raw write.
#[cfg(test)]
pub struct CaptureScreen {
    buffer: std::sync::Mutex<String>,
    columns: usize,
}

#[cfg(test)]
impl CaptureScreen {
    pub fn new(columns: usize) -> Self {
        Self {
            buffer: std::sync::Mutex::new(String::new()),
            columns,
        }
    }

    pub fn contents(&self) -> String {
        self.buffer.lock().expect("capture lock").clone()
    }
}

#[cfg(test)]
impl Screen for CaptureScreen {
    fn write(&self, text: &str) {
        self.buffer.lock().expect("capture lock").push_str(text);
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn clear(&self) {
        self.write(&ansi::clear_screen());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_line_appends_crlf() {
        let screen = CaptureScreen::new(80);
        screen.write_line("hello");
        assert_eq!(screen.contents(), "hello\r\n");
    }

    #[test]
    fn test_clear_emits_clear_sequence() {
        let screen = CaptureScreen::new(80);
        screen.clear();
        assert_eq!(screen.contents(), ansi::clear_screen());
    }
}
