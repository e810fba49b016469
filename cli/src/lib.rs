use clap::Parser;

pub mod command;

#[derive(Debug, Parser)]
#[command(name = "bindery", version, about, long_about = None)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub commands: command::Commands,
}

impl Cli {
    /// The log filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
