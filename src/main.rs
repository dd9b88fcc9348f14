use clap::Parser;
use stein::cli::commands::execute;
use stein::cli::config::{Cli, load_config, log_level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .parse_default_env()
        .init();

    let config = load_config(cli.config.as_deref());
    let output = execute(&cli, &config)?;
    print!("{}", output);

    Ok(())
}
