//! sitescope HTTP server — adaptive web page section scraper.
//!
//! Exposes the scrape pipeline over a small JSON API. Configuration is
//! loaded from `~/.sitescope/sitescope.toml` (or `--config`), with CLI
//! flags taking precedence.

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use routes::AppState;
use sitescope_pipeline::Pipeline;
use sitescope_shared::{AppConfig, load_config, load_config_from};

#[derive(Debug, Parser)]
#[command(name = "sitescope", about = "Adaptive web page section scraper")]
struct Args {
    /// Socket address to bind, overriding the config file.
    #[arg(long)]
    bind: Option<String>,

    /// Path to a config file (default: ~/.sitescope/sitescope.toml).
    #[arg(long, env = "SITESCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// WebDriver endpoint for the rendered fallback.
    #[arg(long, env = "WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args);

    let mut config = load_app_config(&args)?;
    if let Some(webdriver_url) = &args.webdriver_url {
        config.scrape.webdriver_url = webdriver_url.clone();
    }
    let bind = args.bind.clone().unwrap_or(config.server.bind.clone());

    let pipeline = Pipeline::new(config.scrape).wrap_err("failed to build scrape pipeline")?;
    info!(
        static_text_threshold = pipeline.config().static_text_threshold,
        webdriver_url = %pipeline.config().webdriver_url,
        "scrape pipeline ready"
    );
    let app = routes::router(Arc::new(AppState { pipeline }));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    info!("sitescope listening on http://{bind}");

    axum::serve(listener, app).await.wrap_err("server error")?;
    Ok(())
}

fn load_app_config(args: &Args) -> Result<AppConfig> {
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn init_tracing(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match args.verbose {
        0 => "sitescope=info,sitescope_pipeline=info,sitescope_extract=info,sitescope_shared=info",
        1 => "sitescope=debug,sitescope_pipeline=debug,sitescope_extract=debug,sitescope_shared=debug",
        _ => "sitescope=trace,sitescope_pipeline=trace,sitescope_extract=trace,sitescope_shared=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match args.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().with_env_filter(env_filter).json().init();
        }
    }
}
