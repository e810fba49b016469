use anyhow::Result;
use bindery_cli::Cli;
use bindery_cli::command::Commands;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `RUST_LOG` takes precedence over `--verbose`
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.commands {
        Commands::Build(build) => build.build()?,
        Commands::Check(check) => check.check()?,
        Commands::Convert(convert) => convert.convert()?,
    }

    Ok(())
}
