use anyhow::Result;
use clap::Parser;
use log::debug;
use std::sync::Arc;

use bookterm::cli::Cli;
use bookterm::commands;
use bookterm::config::TerminalConfig;
use bookterm::engine::Engine;
use bookterm::output;
use bookterm::screen::{spawn_input_reader, TerminalScreen};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TerminalConfig::load(cli.config.as_deref()).await?;
    if let Some(prompt) = cli.prompt {
        config.prompt = prompt;
    }
    if cli.no_welcome {
        config.welcome.clear();
    }

    // Raw mode is held by the screen and restored when it drops.
    let screen = Arc::new(TerminalScreen::new()?);

    // Log records go through the screen so they respect raw mode.
    output::set_log_screen(screen.clone());
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    output::init_logger(level);
    debug!("Starting booking terminal");

    let (engine, events) = Engine::create(config, screen.clone());
    for command in commands::builtins() {
        engine.register(command);
    }

    let reader = spawn_input_reader(events);
    let result = engine.run().await;

    output::clear_log_screen();
    reader.await.ok();
    result
}
