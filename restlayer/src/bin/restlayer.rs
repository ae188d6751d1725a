//! Standalone restlayer server.
//!
//! ```text
//! restlayer --config restlayer.toml --bind 0.0.0.0:8080
//! ```

use clap::Parser;
use std::path::PathBuf;

use restlayer::{
    config::load_config,
    http::{RestServer, telemetry::init_tracing},
};

#[derive(Parser, Debug)]
#[command(name = "restlayer", version, about = "Serve document collections over REST")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "restlayer.toml")]
    config: PathBuf,

    /// Overrides `server.bind_address` from the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_tracing(&config.log_filter)?;

    tracing::info!(
        config = %cli.config.display(),
        mount_path = %config.mount_path,
        collections = config.collections.len(),
        "starting restlayer"
    );

    let dispatcher = config.build_dispatcher().await?;

    RestServer::new(config.server, dispatcher)
        .bind_and_run()
        .await?;

    Ok(())
}
