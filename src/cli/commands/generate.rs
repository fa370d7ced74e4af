use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, DisplayMode};
use crate::controller::ImageRequestController;
use crate::core::{GeneratedImage, GenerationRequest, ModelChoice, RequestOutcome};
use crate::provider::{self, ProviderKind};
use crate::{http_client, preview};

#[derive(Args)]
pub struct GenerateArgs {
    /// The prompt describing the image to generate
    #[arg(required = true)]
    pub prompt: String,

    /// Model to use (standard, hd)
    #[arg(short, long)]
    pub model: Option<ModelChoice>,

    /// Quality vs speed, 0-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Provider to use instead of the configured one (deepai, huggingface)
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Output directory for downloaded images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't download the image automatically
    #[arg(long)]
    pub no_download: bool,

    /// Output format (text, json, quiet)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Machine-readable summary for `--format json`
#[derive(Serialize)]
struct GenerateReport<'a> {
    request: &'a GenerationRequest,
    provider: &'a str,
    outcome: &'a RequestOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_error: Option<String>,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let request = GenerationRequest::new(&args.prompt)
        .with_model(args.model.unwrap_or(config.defaults.model))
        .with_quality(args.quality.map(Into::into).unwrap_or(config.defaults.quality));

    let mut config = config.clone();
    if let Some(kind) = args.provider {
        if kind != config.api.provider {
            config.api.provider = kind;
            config.api.base_url = None;
        }
    }

    let provider = provider::from_config(&config)?;
    let client = http_client::for_timeout(config.timeout())?;
    let controller = ImageRequestController::new(provider, client);

    // Show progress
    let pb = if args.format == "text" {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.yellow} {msg}")?);
        pb.set_message(format!(
            "Generating image with {}: {}...",
            controller.provider_name(),
            request.prompt_preview(40)
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let outcome = controller.submit(request.clone()).await;

    let image = match &outcome {
        RequestOutcome::Success(image) => image.clone(),
        RequestOutcome::Failed(message) => {
            if let Some(pb) = pb {
                pb.finish_with_message(format!("{} Generation failed", "✗".red()));
            }
            if args.format == "json" {
                print_report(&request, &controller, &outcome, None, None)?;
            } else if args.format != "quiet" {
                eprintln!("{}: {}", "Error".red().bold(), message);
            }
            anyhow::bail!("{}", message);
        }
        RequestOutcome::Idle | RequestOutcome::Pending => {
            anyhow::bail!("Generation did not complete");
        }
    };

    if args.no_download || !config.output.auto_download {
        if let Some(pb) = &pb {
            pb.finish_with_message(format!("{} Generated image (not downloaded)", "✓".green()));
        }
        match args.format.as_str() {
            "json" => print_report(&request, &controller, &outcome, None, None)?,
            "quiet" => println!("{}", image.reference),
            _ => print_summary(&request, &image, None),
        }
        return Ok(());
    }

    let output_dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));

    let path = match controller.download(&image, &output_dir).await {
        Ok(path) => path,
        Err(e) => {
            if let Some(pb) = &pb {
                pb.finish_with_message(format!("{} Generated image, download failed", "!".yellow()));
            }
            if args.format == "json" {
                print_report(&request, &controller, &outcome, None, Some(e.user_message()))?;
            } else if args.format != "quiet" {
                eprintln!("{}: {}", "Error".red().bold(), e.user_message());
                print_summary(&request, &image, None);
            }
            return Err(e.into());
        }
    };
    let path_str = path.to_string_lossy().to_string();

    if let Some(pb) = &pb {
        pb.finish_with_message(format!("{} Generated image", "✓".green()));
    }

    match args.format.as_str() {
        "json" => print_report(&request, &controller, &outcome, Some(path_str), None)?,
        "quiet" => println!("{}", path_str),
        _ => {
            print_summary(&request, &image, Some(&path_str));

            if config.output.display == DisplayMode::Terminal {
                println!();
                preview::render(controller.client(), &image, 80, 30).await;
            }
        }
    }

    Ok(())
}

fn print_report(
    request: &GenerationRequest,
    controller: &ImageRequestController,
    outcome: &RequestOutcome,
    path: Option<String>,
    download_error: Option<String>,
) -> Result<()> {
    let report = GenerateReport {
        request,
        provider: controller.provider_name(),
        outcome,
        path,
        download_error,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_summary(request: &GenerationRequest, image: &GeneratedImage, path: Option<&str>) {
    println!();
    println!("{}: {}", "Image ID".cyan().bold(), image.identity);
    println!("{}: {}", "Prompt".cyan().bold(), request.prompt.trim());
    println!("{}: {}", "Provider".cyan().bold(), image.provider);
    println!("{}: {}", "Model".cyan().bold(), request.model.label());
    println!("{}: {}", "Quality".cyan().bold(), request.quality);
    println!("{}: {}", "Source".cyan().bold(), image.reference);
    if let Some(path) = path {
        println!("{}: {}", "Saved to".cyan().bold(), path);
    }
}
