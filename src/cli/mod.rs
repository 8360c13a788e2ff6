use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait};

use crate::config::Config;
use crate::global;

#[derive(Parser, Debug)]
#[command(name = "voxpost")]
#[command(about = "Record voice notes and post them to a processing server", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Check whether audio capture is available on this system
    Check,
    /// List audio input devices
    Devices,
    /// Show the effective configuration
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the loaded configuration
    Show,
    /// Print the configuration file path
    Path,
}

pub fn handle_check_command() -> Result<()> {
    let host = cpal::default_host();
    match host.default_input_device() {
        Some(device) => {
            let name = device.name().unwrap_or_else(|_| "unknown".to_string());
            println!("Audio capture is supported (default device: {name})");
            Ok(())
        }
        None => bail!("Audio capture is not supported: no input device available"),
    }
}

pub fn handle_devices_command() -> Result<()> {
    let host = cpal::default_host();
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
        .filter(|d| d.name().is_ok())
        .collect();

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    println!("Available audio input devices:");
    for device in &devices {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_marker = if default_name.as_ref() == Some(&name) {
            " [DEFAULT]"
        } else {
            ""
        };

        match device.default_input_config() {
            Ok(config) => println!(
                "  {}{} ({}Hz, {} channels)",
                name,
                default_marker,
                config.sample_rate().0,
                config.channels()
            ),
            Err(_) => println!("  {}{} (configuration unavailable)", name, default_marker),
        }
    }

    Ok(())
}

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            print!("{content}");
        }
        ConfigCommand::Path => {
            println!("{}", global::config_file()?.display());
        }
    }

    Ok(())
}
