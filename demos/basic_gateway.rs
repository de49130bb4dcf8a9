//! Start a deepseek-gateway server programmatically.
//!
//! Usage:
//!   cargo run --example basic_gateway
//!
//! Then:
//!   curl http://localhost:6000/v1/chat/completions \
//!     -H "Authorization: Bearer $DEEPSEEK_API_KEY" \
//!     -d '{"model":"gpt-4","messages":[{"role":"user","content":"hi"}]}'

use deepseek_gateway::{build_router, Gateway, GatewayConfig, SharedLogger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::find_and_load(None)?;

    println!("Upstream: {}", config.completions_url());
    println!("Default model: {}", config.default_model);

    let addr = config.bind_addr();
    let gateway = Gateway::new(config, SharedLogger::in_memory())?;

    let app = build_router(gateway);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
