use clap::Parser;
use grip::cli::{run_cli, Cli};
use grip::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_config())?;
    run_cli(&cli)
}
