use crate::registry::{Command, CommandOutput};

/// `clear`: wipes the viewport and the scrollback, cursor home.
pub fn command() -> Command {
    Command::new("clear", "Clear the screen", |engine, _args| async move {
        engine.clear_screen();
        Ok(CommandOutput::None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_metadata() {
        let clear = command();
        assert_eq!(clear.keyword, "clear");
        assert!(!clear.hidden);
    }
}
