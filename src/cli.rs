use clap::Parser;

/// Secure Booking Service terminal - the interactive shell of the booking
/// backend
#[derive(Parser, Debug)]
#[clap(name = "sbs")]
#[clap(about = "Interactive terminal for the Secure Booking Service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Prompt text (overrides config file)
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Skip the welcome banner
    #[arg(long = "no-welcome")]
    pub no_welcome: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
