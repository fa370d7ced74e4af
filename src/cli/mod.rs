pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "imagine",
    author = "Christian Weinmayr",
    version,
    about = "Imagine - Generate images from text prompts",
    long_about = r#"Imagine - Generate images from text prompts

A terminal client for text-to-image APIs (DeepAI, Hugging Face Inference).
Run without arguments to launch the interactive generator.

SETUP:
  Provide your API key via environment variable or config:
    export IMAGINE_API_KEY=your-key-here
    imagine config set api.key your-key-here

  Pick a provider:
    imagine config set api.provider deepai
    imagine config set api.provider huggingface

EXAMPLES:
  Generate an image:
    imagine generate "a red fox in snow"
    imagine g "sunset over mountains" --model hd --quality 80
    imagine generate "minimalist logo" --format json

  Manage configuration:
    imagine config show
    imagine config set defaults.quality 70

  Launch the interactive generator:
    imagine

OUTPUT FORMATS:
  --format text   Human-readable output (default)
  --format json   Machine-readable JSON
  --format quiet  Minimal output, just file paths"#,
    after_help = r#"CONFIGURATION:
  Config file: ~/.config/imagine-cli/config.toml (Linux)

  Models: standard (default), hd, genius (reserved, not yet available)
  Quality: 0-100, trades speed for detail where the provider supports it

  Images are saved as generated-image-<id>.png"#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new image from a text prompt
    ///
    /// Sends the prompt to the configured provider once. Images are saved to
    /// the configured output directory by default.
    #[command(
        alias = "g",
        after_help = r#"EXAMPLES:
  Basic generation:
    imagine generate "a red apple on a wooden table"

  HD model with high quality:
    imagine generate "detailed portrait" --model hd --quality 90

  JSON output:
    imagine generate "abstract art" --format json

  Custom output directory:
    imagine generate "logo design" --output ./logos"#
    )]
    Generate(commands::generate::GenerateArgs),

    /// View or modify configuration
    ///
    /// Manage the provider, API key, default parameters and output settings.
    /// Changes are saved to the config file immediately.
    #[command(
        alias = "c",
        after_help = r#"EXAMPLES:
  Show all settings:
    imagine config show

  Get a specific value:
    imagine config get defaults.quality

  Set values:
    imagine config set api.provider huggingface
    imagine config set api.timeout_secs 60
    imagine config set output.directory ~/Pictures/imagine

  Reset to defaults:
    imagine config reset --force

AVAILABLE SETTINGS:
  api.provider         - Image provider (deepai, huggingface)
  api.key              - Provider API key
  api.hf_model         - Hugging Face model id
  api.base_url         - Override the provider endpoint ("default" to clear)
  api.timeout_secs     - Request timeout in seconds
  defaults.model       - Default model (standard, hd)
  defaults.quality     - Default quality (0-100)
  output.directory     - Where to save images
  output.auto_download - Auto-download images (true/false)
  output.display       - Display mode (terminal/none)"#
    )]
    Config(commands::config::ConfigArgs),
}
