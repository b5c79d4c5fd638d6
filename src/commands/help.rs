use crate::registry::{format_command_table, Command, CommandOutput};

/// `help`: a width-aligned table of every visible command. Hidden commands
/// stay out of the listing but remain invocable.
pub fn command() -> Command {
    Command::new("help", "Print this help message", |engine, _args| async move {
        engine.write_line("All available commands:");
        let summaries = engine.commands();
        let rows = summaries
            .iter()
            .map(|s| (s.keyword.as_str(), s.description.as_str()));
        for line in format_command_table(rows) {
            engine.write_line(&line);
        }
        Ok(CommandOutput::None)
    })
}
