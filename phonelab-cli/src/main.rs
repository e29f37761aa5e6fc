use clap::Parser;

use phonelab_cli::cli::Cli;
use phonelab_cli::commands;
use phonelab_cli::logging::init_tracing;
use phonelab_cli::output::OutputWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref().unwrap_or("warn"), cli.log_format)?;
    tracing::debug!(command = ?cli.command, "phonelab starting");

    let writer = OutputWriter::new(cli.output);
    if let Err(e) = commands::dispatch(cli.command, cli.config.as_deref(), &writer).await {
        tracing::debug!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }

    Ok(())
}
