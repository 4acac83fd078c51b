mod api;
mod cli;
mod router;
mod shutdown;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostwatch_core::Config;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("HOSTWATCH_LOG_JSON")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG and HOSTWATCH_LOG_JSON can come from it.
    hostwatch_core::config::load_dotenv();
    init_tracing();

    let args = cli::Cli::parse();
    let config = Config::from_env();
    config.validate()?;

    cli::run(args, config).await
}
