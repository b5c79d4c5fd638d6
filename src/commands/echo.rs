use crate::registry::{Command, CommandOutput};

/// `echo`: prints its arguments back, whitespace-normalized.
pub fn command() -> Command {
    Command::new("echo", "Print the given arguments", |_engine, args: Vec<String>| async move {
        Ok(CommandOutput::Text(args.join(" ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_metadata() {
        let echo = command();
        assert_eq!(echo.keyword, "echo");
        assert!(echo.usage.is_none());
    }
}
