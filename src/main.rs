use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use workers_deploy::{deploy, DeployConfig, DeployOptions};

/// Deploy a Workers script and its static assets
#[derive(Parser)]
#[command(name = "workers-deploy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON deploy config
    #[arg(short, long, env = "WORKERS_DEPLOY_CONFIG", default_value = "deploy.json")]
    config: PathBuf,

    /// API token (falls back to CLOUDFLARE_API_TOKEN)
    #[arg(long)]
    api_token: Option<String>,

    /// Account id (falls back to CLOUDFLARE_ACCOUNT_ID)
    #[arg(long)]
    account_id: Option<String>,

    /// API base URL (falls back to CLOUDFLARE_API_BASE_URL)
    #[arg(long, hide = true)]
    api_base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = DeployConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let options = DeployOptions {
        api_token: cli.api_token,
        account_id: cli.account_id,
        api_base_url: cli.api_base_url,
    };

    let report = deploy(&config, options)
        .await
        .with_context(|| format!("Failed to deploy {}", config.name))?;

    if report.script_updated {
        println!("✅ Deployed {}", config.name);
    } else {
        println!("⚠️  Nothing to deploy for {}", config.name);
    }
    if report.asset_files > 0 {
        if report.assets_kept {
            println!("   Assets: {} file(s), all already uploaded", report.asset_files);
        } else {
            println!(
                "   Assets: {} file(s), {} uploaded in {} batch(es)",
                report.asset_files, report.uploaded_files, report.batches
            );
        }
    }

    Ok(())
}
