use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::TerminalConfig;
use crate::editor::LineEditor;
use crate::history::{History, Recall};
use crate::output::OutputChannel;
use crate::query::{Offer, QueryChannel};
use crate::registry::{Command, CommandHandler, CommandOutput, CommandRegistry, CommandSummary};
use crate::screen::Screen;

/// Raw input as delivered by the rendering backend.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(KeyEvent),
    Paste(String),
}

/// Prompt text plus the derived length of its last line, the fixed left
/// margin all cursor arithmetic is based on.
#[derive(Debug, Clone)]
pub struct Prompt {
    text: String,
    last_line_len: usize,
}

impl Prompt {
    pub fn new(text: &str) -> Self {
        let last_line = text.rsplit('\n').next().unwrap_or(text);
        Self {
            text: text.to_string(),
            last_line_len: visible_width(last_line),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn last_line_len(&self) -> usize {
        self.last_line_len
    }
}

/// Display width with CSI sequences skipped, so a colored prompt still
/// yields the right margin.
fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            width += 1;
            continue;
        }
        if chars.next() == Some('[') {
            for next in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&next) {
                    break;
                }
            }
        }
    }
    width
}

struct EngineShared {
    screen: Arc<dyn Screen>,
    out: OutputChannel,
    queries: QueryChannel,
    registry: RwLock<CommandRegistry>,
    prompt: Mutex<Prompt>,
    session_active: AtomicBool,
}

/// Cheap handle passed to every command handler; the command contract
/// surface of the engine.
#[derive(Clone)]
pub struct EngineHandle(Arc<EngineShared>);

impl EngineHandle {
    pub fn write(&self, text: &str) {
        self.0.out.write(text);
    }

    pub fn write_line(&self, text: &str) {
        self.0.out.write_line(text);
    }

    pub fn write_error(&self, message: &str, with_icon: bool) {
        self.0.out.write_error(message, with_icon);
    }

    pub fn write_warning(&self, message: &str, with_icon: bool) {
        self.0.out.write_warning(message, with_icon);
    }

    pub fn write_success(&self, message: &str, with_icon: bool) {
        self.0.out.write_success(message, with_icon);
    }

    pub fn write_info(&self, message: &str, with_icon: bool) {
        self.0.out.write_info(message, with_icon);
    }

    pub fn output(&self) -> &OutputChannel {
        &self.0.out
    }

    pub fn clear_screen(&self) {
        self.0.screen.clear();
    }

    pub fn columns(&self) -> usize {
        self.0.screen.columns()
    }

    /// Visible commands of the root registry, sorted by keyword.
    pub fn commands(&self) -> Vec<CommandSummary> {
        self.0
            .registry
            .read()
            .expect("registry lock")
            .summaries(false)
    }

    pub fn register(&self, command: Command) -> bool {
        self.0
            .registry
            .write()
            .expect("registry lock")
            .register(command, &self.0.out)
    }

    pub fn set_prompt(&self, text: &str) {
        *self.0.prompt.lock().expect("prompt lock") = Prompt::new(text);
    }

    pub fn prompt(&self) -> Prompt {
        self.0.prompt.lock().expect("prompt lock").clone()
    }

    pub fn set_session_active(&self, active: bool) {
        self.0.session_active.store(active, Ordering::SeqCst);
    }

    pub fn session_active(&self) -> bool {
        self.0.session_active.load(Ordering::SeqCst)
    }

    /// Suspends the calling command until one of the accepted keys is
    /// pressed. The question and the accepted-answer hint are printed first;
    /// rejected keys produce a retry notice without resolving.
    pub async fn run_query(&self, question: &str, accepted: &[&str]) -> Result<String> {
        let accepted: Vec<String> = accepted.iter().map(|a| a.to_string()).collect();
        self.0
            .out
            .write_line(&format!("{} [{}]", question, accepted.join("/")));
        let rx = self.0.queries.begin(&accepted)?;
        Ok(rx.await?)
    }
}

/// The execution controller: owns the line buffer, the history, the paste
/// work queue and the event loop driving them.
///
/// One engine per terminal session, explicitly constructed; command
/// handlers receive an [`EngineHandle`] instead of reaching for a global.
pub struct Engine {
    shared: EngineHandle,
    editor: LineEditor,
    history: History,
    /// Unconsumed remainder of a multi-line paste, drained as synthetic
    /// submissions after the current line finishes.
    pending_lines: VecDeque<String>,
    events: UnboundedReceiver<InputEvent>,
    welcome: Vec<String>,
    /// True strictly while a command handler is in flight.
    locked: bool,
}

impl Engine {
    /// Builds an engine over the given screen. The returned sender is the
    /// one input source; the engine runs until it closes.
    pub fn create(config: TerminalConfig, screen: Arc<dyn Screen>) -> (Self, UnboundedSender<InputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = EngineHandle(Arc::new(EngineShared {
            screen: screen.clone(),
            out: OutputChannel::new(screen.clone()),
            queries: QueryChannel::new(),
            registry: RwLock::new(CommandRegistry::new()),
            prompt: Mutex::new(Prompt::new(&config.prompt)),
            session_active: AtomicBool::new(false),
        }));
        let engine = Self {
            shared,
            editor: LineEditor::new(screen),
            history: History::new(config.history_limit),
            pending_lines: VecDeque::new(),
            events: rx,
            welcome: config.welcome,
            locked: false,
        };
        (engine, tx)
    }

    pub fn handle(&self) -> EngineHandle {
        self.shared.clone()
    }

    pub fn register(&self, command: Command) -> bool {
        self.shared.register(command)
    }

    /// Prints the welcome banner and the first prompt, then processes input
    /// events one at a time until the channel closes.
    pub async fn run(mut self) -> Result<()> {
        for line in &self.welcome {
            self.shared.0.screen.write_line(line);
        }
        self.print_prompt();
        while let Some(event) = self.events.recv().await {
            self.process(event).await?;
        }
        debug!("input channel closed, session over");
        Ok(())
    }

    async fn process(&mut self, event: InputEvent) -> Result<()> {
        // A pending query owns the input stream outright.
        if self.shared.0.queries.is_pending() {
            self.route_to_query(event);
            return Ok(());
        }
        // The locked window is handled inside run_locked; this guard only
        // states the machine's contract.
        if self.locked {
            return Ok(());
        }
        match event {
            InputEvent::Key(key) => self.process_key(key).await?,
            InputEvent::Paste(text) => self.accept_text(text, false).await?,
        }
        self.drain_pending().await
    }

    async fn process_key(&mut self, key: KeyEvent) -> Result<()> {
        // One uniform phase: every key acts on press, releases are ignored.
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.interrupt();
            }
            KeyCode::Enter => self.submit().await?,
            KeyCode::Backspace => self.editor.delete_back(),
            KeyCode::Left => {
                self.editor.move_cursor(-1);
            }
            KeyCode::Right => {
                self.editor.move_cursor(1);
            }
            KeyCode::Up => self.recall(Recall::Older),
            KeyCode::Down => self.recall(Recall::Newer),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.accept_text(c.to_string(), false).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs incoming text through multi-line detection. The chunk up to the
    /// first newline is edited in and submitted; the remainder goes on the
    /// work queue. `synthetic` marks re-fed queue entries, which submit even
    /// without a trailing newline.
    async fn accept_text(&mut self, chunk: String, synthetic: bool) -> Result<()> {
        let normalized = chunk.replace("\r\n", "\n").replace('\r', "\n");
        let pasted = normalized.chars().count() > 1;
        match normalized.split_once('\n') {
            Some((head, rest)) => {
                if !rest.is_empty() {
                    self.pending_lines.push_back(rest.to_string());
                }
                let head = if pasted { head.trim() } else { head };
                self.editor.insert(head);
                self.submit().await?;
            }
            None if synthetic => {
                let text = if pasted { normalized.trim() } else { normalized.as_str() };
                self.editor.insert(text);
                self.submit().await?;
            }
            None => {
                self.pending_lines.clear();
                let text = if pasted { normalized.trim() } else { normalized.as_str() };
                self.editor.insert(text);
            }
        }
        Ok(())
    }

    /// Drains the paste work queue iteratively; each entry is a synthetic
    /// Enter-terminated input, so pasted command blocks run in order.
    async fn drain_pending(&mut self) -> Result<()> {
        while let Some(chunk) = self.pending_lines.pop_front() {
            self.accept_text(chunk, true).await?;
        }
        Ok(())
    }

    async fn submit(&mut self) -> Result<()> {
        self.editor.move_to_end();
        let line = self.editor.text().to_string();
        self.editor.clear();

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            // Empty line: nothing to run, just a fresh prompt.
            self.post_process();
            return Ok(());
        };

        self.history.append(&line);
        self.shared.0.screen.write("\r\n");

        let resolved = {
            let registry = self.shared.0.registry.read().expect("registry lock");
            registry
                .resolve(keyword)
                .map(|cmd| (cmd.handler.clone(), cmd.requires_session))
        };
        match resolved {
            None => {
                self.shared
                    .write_line(&format!("{}: command not found", keyword));
            }
            Some((_, requires_session)) if requires_session && !self.shared.session_active() => {
                self.shared
                    .write_error("You must be logged in to run this command!", true);
            }
            Some((handler, _)) => {
                let args: Vec<String> = parts.map(str::to_string).collect();
                self.run_locked(handler, args).await;
            }
        }
        self.post_process();
        Ok(())
    }

    /// Executes one handler under the lock. Input keeps flowing so query
    /// answers get through, everything else is dropped, and the lock is
    /// released whatever the handler's outcome.
    async fn run_locked(&mut self, handler: CommandHandler, args: Vec<String>) {
        self.locked = true;
        let fut = (handler)(self.shared.clone(), args);
        tokio::pin!(fut);
        let mut input_open = true;
        let outcome = loop {
            tokio::select! {
                biased;
                result = &mut fut => break result,
                event = self.events.recv(), if input_open => {
                    match event {
                        Some(event) => self.route_to_query(event),
                        None => input_open = false,
                    }
                }
            }
        };
        self.locked = false;
        match outcome {
            Ok(CommandOutput::Text(text)) => self.shared.write_line(&text),
            Ok(CommandOutput::None) => {}
            Err(error) => self.shared.write_error(&format!("{:#}", error), true),
        }
    }

    /// While locked, the only input that matters is an answer to a pending
    /// query. Enter is explicitly excluded from answering; everything else
    /// that does not qualify is dropped.
    fn route_to_query(&mut self, event: InputEvent) {
        if !self.shared.0.queries.is_pending() {
            return;
        }
        let InputEvent::Key(key) = event else { return };
        if key.kind != KeyEventKind::Press {
            return;
        }
        let KeyCode::Char(c) = key.code else { return };
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }
        let answer = c.to_string();
        match self.shared.0.queries.offer(&answer) {
            Offer::Accepted => self.shared.write_line(&answer),
            Offer::Rejected(accepted) => {
                self.shared.write_error(
                    &format!("Illegal input! Accepted inputs: {}", accepted.join(", ")),
                    false,
                );
            }
            Offer::NotPending => {}
        }
    }

    fn recall(&mut self, direction: Recall) {
        if let Some(entry) = self.history.recall(direction) {
            self.editor.replace(&entry);
        }
    }

    /// Ctrl+C: the interrupt marker, the current line and any queued paste
    /// remainder are discarded, then a fresh prompt.
    fn interrupt(&mut self) {
        self.editor.move_to_end();
        self.shared.0.screen.write("^C");
        self.pending_lines.clear();
        self.post_process();
    }

    fn post_process(&mut self) {
        self.editor.clear();
        self.history.reset();
        self.print_prompt();
    }

    fn print_prompt(&mut self) {
        let prompt = self.shared.prompt();
        self.editor.set_prompt_len(prompt.last_line_len());
        self.shared.0.screen.write("\r\n");
        self.shared.0.screen.write(prompt.text());
    }
}
