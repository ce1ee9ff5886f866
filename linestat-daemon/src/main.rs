use anyhow::Result;
use clap::Parser;

use linestat_daemon::cli::DaemonCli;
use linestat_daemon::logging;
use linestat_daemon::orchestrator::{self, Orchestrator};
use linestat_daemon::source::LineInput;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    if cli.list_modules {
        print!("{}", orchestrator::list_modules());
        return Ok(());
    }

    let config = orchestrator::load_config(&cli).await?;
    logging::init_tracing(&config.general)?;

    if cli.validate {
        orchestrator::validate_config(&config).await?;
        println!("{}", orchestrator::validation_summary(&cli.config, &config));
        return Ok(());
    }

    tracing::info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "linestat starting"
    );

    let input = LineInput::from_args(cli.file.clone(), cli.follow);
    let lines = Orchestrator::new(config, input).run().await?;

    tracing::info!(lines, "linestat shut down");
    Ok(())
}
