use clap::Parser;
use elfcal::cli::Cli;
use elfcal::commands;
use std::io;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "elfcal=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    if let Err(err) = commands::run_command(&cli, &mut stdout.lock()) {
        error!("{err}");
        std::process::exit(1);
    }
}
