use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::{Config, API_KEY_ENV};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show all configuration values
    Show,

    /// Print one value
    Get {
        /// Dotted key, e.g. api.provider or defaults.quality
        key: String,
    },

    /// Change one value and save the file
    Set {
        /// Dotted key, e.g. api.provider or defaults.quality
        key: String,
        value: String,
    },

    /// Show the config file path
    Path,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config: &mut Config) -> Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Get { key } => match config.get(&key) {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("{}: Unknown config key '{}'", "Error".red().bold(), key);
                eprintln!("Known keys: {}", Config::keys().join(", "));
            }
        },
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            let shown = config.get(&key).unwrap_or(value);
            println!("{} {} = {}", "✓".green(), key.cyan(), shown);
        }
        ConfigCommand::Path => println!("{}", config.config_path.display()),
        ConfigCommand::Reset { force: false } => {
            eprintln!(
                "{}: This resets every value, including a stored API key. Use --force to confirm.",
                "Warning".yellow().bold()
            );
        }
        ConfigCommand::Reset { force: true } => {
            config.reset();
            config.save()?;
            println!("{} Configuration reset to defaults", "✓".green());
        }
    }
    Ok(())
}

/// Print every key grouped under its section header
fn show_config(config: &Config) {
    let mut section = "";
    for key in Config::keys() {
        let (group, name) = key.split_once('.').unwrap_or(("", key));
        if group != section {
            if !section.is_empty() {
                println!();
            }
            println!("[{}]", group.yellow());
            section = group;
        }
        let value = config
            .get(key)
            .unwrap_or_else(|| "(not set)".dimmed().to_string());
        println!("  {} = {}", name.bold(), value);
    }
    println!();

    if config.key_is_injected() {
        println!("{}", format!("API key taken from {}", API_KEY_ENV).dimmed());
    }
    println!("{}", format!("Config file: {}", config.config_path.display()).dimmed());
}
