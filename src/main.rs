use clap::Parser;
use registry_graph::{CliArgs, LoggingConfig, RegistryConfig, init_logging, run_command};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let command = cli.command.clone();
    let config = RegistryConfig::from_args(cli)?;

    // fail fast before loading any data
    config.validate()?;

    let output = run_command(&config, &command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
