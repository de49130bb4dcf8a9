use clap::Parser;
use deepseek_gateway::config::config_search_paths;
use deepseek_gateway::{build_router, Gateway, GatewayConfig, SharedLogger};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "deepseek-gateway",
    about = "OpenAI-compatible chat-completions gateway for the DeepSeek API",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream base URL (overrides config)
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// Model used when a request names none (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Return upstream JSON without reshaping it
    #[arg(short, long)]
    raw_response: bool,

    /// Also write request events to this file as JSON lines
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepseek_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = GatewayConfig::find_and_load(cli.config.as_deref())?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(base_url) = cli.base_url {
        config.upstream.base_url = base_url;
    }
    if let Some(model) = cli.model {
        config.default_model = model;
    }
    if cli.raw_response {
        config.raw_response = true;
    }

    // Validate again after CLI overrides
    config.validate()?;

    let logger = match cli.log_file {
        Some(ref path) => SharedLogger::new(path)?,
        None => SharedLogger::in_memory(),
    };

    info!("deepseek-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("  Upstream:      {}", config.completions_url());
    info!("  Default model: {}", config.default_model);
    info!("  Aliases:       {}", config.model_mapping().len());
    info!("  Raw response:  {}", config.raw_response);
    if let Some(ref path) = cli.log_file {
        info!("  Log file:      {}", path.display());
    }

    let bind_addr = config.bind_addr();
    let gateway = Gateway::new(config, logger)?;
    let app = build_router(gateway);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);
    info!("  Point OpenAI clients at http://{}/v1", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
