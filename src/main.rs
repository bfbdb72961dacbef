//! spectest - run markdown behaviour specifications in a browser
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use spectest::cli::{format_plan, format_report};
use spectest::spec::parse_spec_file;
use spectest::{Config, SpecRunner};

/// Run a behaviour specification against a running application
#[derive(Parser, Debug)]
#[command(name = "spectest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Markdown specification file
    #[arg(required_unless_present = "print_config")]
    spec: Option<PathBuf>,

    /// Run only the example with this name
    example: Option<String>,

    /// Base URL every example starts from
    #[arg(long, short = 'u')]
    base_url: Option<String>,

    /// Cache resolved actions in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Use a separate cache directory per specification
    #[arg(long)]
    cache_per_spec: bool,

    /// Clear the cache directory before running
    #[arg(long)]
    clear_cache: bool,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Config file instead of ~/.config/spectest/config.toml
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print the examples and steps without running them
    #[arg(long, short = 'l')]
    list: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spectest={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    // Build configuration
    let mut config = match &args.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_file(path)?
        }
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(ref base_url) = args.base_url {
        config.runner.base_url = base_url.clone();
    }

    if let Some(ref cache_dir) = args.cache_dir {
        config.runner.cache_dir = Some(cache_dir.clone());
    }

    if args.cache_per_spec {
        config.runner.cache_per_spec = true;
    }

    if args.headed {
        config.runner.headed = true;
    }

    config.validate()?;

    let spec_path = args.spec.context("No specification file given")?;
    let spec = parse_spec_file(&spec_path).await?;

    if args.list {
        println!("{}", format_plan(&spec, args.example.as_deref()));
        return Ok(ExitCode::SUCCESS);
    }

    let cache_dir = config.runner.cache_dir.clone();
    let mut runner = SpecRunner::new(config.clone())?;

    if !args.json {
        println!("{}", "=".repeat(60));
        println!("Spec Test Runner");
        println!("{}", "=".repeat(60));
        println!("Base URL: {}", config.runner.base_url);
        println!("Spec file: {}", spec_path.display());
        if let Some(ref example) = args.example {
            println!("Example: {}", example);
        }
        if let Some(ref dir) = cache_dir {
            let note = if args.clear_cache { " (will be cleared)" } else { "" };
            println!("Cache: {}{}", dir.display(), note);
        }
        println!();
        println!("{}", format_plan(&spec, args.example.as_deref()));
    }

    if args.clear_cache {
        runner.clear_cache()?;
    }

    let outcome = runner.run_spec(&spec, args.example.as_deref()).await;

    if let Err(e) = runner.close().await {
        warn!(error = %e, "failed to close browser session");
    }

    let result = outcome?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let spec_cache = runner.cache_dir_for(Some(spec.name.as_str()));
        println!("{}", format_report(&result, spec_cache.as_deref()));
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
