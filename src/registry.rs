use anyhow::Result;
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::engine::EngineHandle;
use crate::output::OutputChannel;

pub type CommandHandler =
    Arc<dyn Fn(EngineHandle, Vec<String>) -> BoxFuture<'static, Result<CommandOutput>> + Send + Sync>;

/// What a command callback hands back to the controller: either a line of
/// text to print, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    None,
    Text(String),
}

/// A named capability registered with the terminal. Immutable once
/// registered; the registry enforces keyword uniqueness.
#[derive(Clone)]
pub struct Command {
    pub keyword: String,
    pub description: String,
    /// Ordered placeholder names. `Some` switches on exact argument-count
    /// validation during sub-dispatch; `None` skips the check.
    pub usage: Option<Vec<String>>,
    pub hidden: bool,
    pub requires_session: bool,
    pub handler: CommandHandler,
}

impl Command {
    pub fn new<F, Fut>(keyword: &str, description: &str, handler: F) -> Self
    where
        F: Fn(EngineHandle, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CommandOutput>> + Send + 'static,
    {
        Self {
            keyword: keyword.to_string(),
            description: description.to_string(),
            usage: None,
            hidden: false,
            requires_session: false,
            handler: Arc::new(move |engine, args| Box::pin(handler(engine, args))),
        }
    }

    pub fn with_usage(mut self, placeholders: &[&str]) -> Self {
        self.usage = Some(placeholders.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn requires_session(mut self) -> Self {
        self.requires_session = true;
        self
    }

    pub fn usage_line(&self) -> String {
        let placeholders = self
            .usage
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|p| p.to_uppercase())
            .collect::<Vec<_>>()
            .join(" ");
        format!("Usage: [...] {} {}", self.keyword, placeholders)
            .trim_end()
            .to_string()
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("keyword", &self.keyword)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("hidden", &self.hidden)
            .field("requires_session", &self.requires_session)
            .finish()
    }
}

/// Listing entry exposed to command handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSummary {
    pub keyword: String,
    pub description: String,
}

/// The set of registered commands, keyed by keyword. The keyed map makes
/// resolution a lookup and keeps the listing deterministically sorted.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a command, rejecting duplicate keywords. The earlier command
    /// stays active; the conflict is reported, never fatal.
    pub fn register(&mut self, command: Command, out: &OutputChannel) -> bool {
        if self.commands.contains_key(&command.keyword) {
            out.write_error(
                &format!("Command '{}' is already registered!", command.keyword),
                true,
            );
            log::warn!("rejected duplicate command registration: {}", command.keyword);
            return false;
        }
        self.commands.insert(command.keyword.clone(), command);
        true
    }

    /// Case-insensitive exact match against the registered keyword.
    pub fn resolve(&self, keyword: &str) -> Option<&Command> {
        self.commands.get(&keyword.to_lowercase())
    }

    pub fn list(&self, include_hidden: bool) -> Vec<&Command> {
        self.commands
            .values()
            .filter(|cmd| include_hidden || !cmd.hidden)
            .collect()
    }

    pub fn summaries(&self, include_hidden: bool) -> Vec<CommandSummary> {
        self.list(include_hidden)
            .into_iter()
            .map(|cmd| CommandSummary {
                keyword: cmd.keyword.clone(),
                description: cmd.description.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Renders keyword/description rows with the keyword column padded to the
/// longest keyword plus four spaces.
pub fn format_command_table<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let rows: Vec<(&str, &str)> = rows.into_iter().collect();
    let width = rows
        .iter()
        .map(|(keyword, _)| keyword.chars().count())
        .max()
        .unwrap_or(0)
        + 4;
    rows.iter()
        .map(|(keyword, description)| format!("{:width$}{}", keyword, description, width = width))
        .collect()
}

fn list_operations(engine: &EngineHandle, children: &CommandRegistry) {
    engine.write_line("Available operations:");
    let rows = children
        .list(false)
        .into_iter()
        .map(|cmd| (cmd.keyword.as_str(), cmd.description.as_str()))
        .collect::<Vec<_>>();
    for line in format_command_table(rows) {
        engine.write_line(&line);
    }
}

/// Resolves `args[0]` against a sub-registry, validates the remaining
/// arguments against the matched command's usage arity, and awaits the
/// handler. Returns whether a child actually ran.
pub async fn dispatch_sub_command(
    engine: &EngineHandle,
    children: &CommandRegistry,
    args: &[String],
) -> Result<bool> {
    let Some(keyword) = args.first() else {
        engine.write_error("Missing operation!", false);
        list_operations(engine, children);
        return Ok(false);
    };
    let rest = &args[1..];

    let Some(child) = children.resolve(keyword) else {
        engine.write_error(&format!("Unknown operation: {}", keyword.to_lowercase()), false);
        list_operations(engine, children);
        return Ok(false);
    };

    // Arity is checked after the specific child is known, against its usage.
    if let Some(usage) = &child.usage {
        if rest.len() != usage.len() {
            engine.write_error(
                &format!(
                    "Wrong number of arguments! Expected {} but got {}",
                    usage.len(),
                    rest.len()
                ),
                false,
            );
            engine.write_line(&child.usage_line());
            return Ok(false);
        }
    }

    let output = (child.handler)(engine.clone(), rest.to_vec()).await?;
    if let CommandOutput::Text(text) = output {
        engine.write_line(&text);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::CaptureScreen;

    fn noop_command(keyword: &str) -> Command {
        Command::new(keyword, "does nothing", |_engine, _args| async move {
            Ok(CommandOutput::None)
        })
    }

    fn test_output() -> (OutputChannel, Arc<CaptureScreen>) {
        let screen = Arc::new(CaptureScreen::new(80));
        (OutputChannel::new(screen.clone()), screen)
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let (out, screen) = test_output();
        let mut registry = CommandRegistry::new();

        assert!(registry.register(noop_command("login"), &out));
        assert!(!registry.register(noop_command("login"), &out));

        assert_eq!(registry.len(), 1);
        assert!(screen.contents().contains("already registered"));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let (out, _screen) = test_output();
        let mut registry = CommandRegistry::new();
        registry.register(noop_command("booking"), &out);

        assert!(registry.resolve("BOOKING").is_some());
        assert!(registry.resolve("booking").is_some());
        assert!(registry.resolve("bookings").is_none());
    }

    #[test]
    fn test_list_is_sorted_and_filters_hidden() {
        let (out, _screen) = test_output();
        let mut registry = CommandRegistry::new();
        registry.register(noop_command("echo"), &out);
        registry.register(noop_command("sudo").hidden(), &out);
        registry.register(noop_command("booking"), &out);

        let visible: Vec<&str> = registry
            .list(false)
            .iter()
            .map(|cmd| cmd.keyword.as_str())
            .collect();
        assert_eq!(visible, vec!["booking", "echo"]);

        let all: Vec<&str> = registry
            .list(true)
            .iter()
            .map(|cmd| cmd.keyword.as_str())
            .collect();
        assert_eq!(all, vec!["booking", "echo", "sudo"]);
    }

    #[test]
    fn test_format_command_table_aligns_descriptions() {
        let lines = format_command_table(vec![("new", "Create"), ("abort", "Abort")]);
        assert_eq!(lines[0], "new      Create");
        assert_eq!(lines[1], "abort    Abort");
    }

    #[test]
    fn test_usage_line_uppercases_placeholders() {
        let command = noop_command("add").with_usage(&["number", "owner"]);
        assert_eq!(command.usage_line(), "Usage: [...] add NUMBER OWNER");

        let bare = noop_command("list").with_usage(&[]);
        assert_eq!(bare.usage_line(), "Usage: [...] list");
    }
}
