use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voxpost::{
    app,
    cli::{
        handle_check_command, handle_config_command, handle_devices_command, Cli, CliCommand,
    },
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("voxpost {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Check) => return handle_check_command(),
        Some(CliCommand::Devices) => return handle_devices_command(),
        Some(CliCommand::Config(args)) => return handle_config_command(args),
        None => {}
    }

    app::run_service().await
}
