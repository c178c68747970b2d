//!
//! turbome server binary
//! ---------------------
//! Command-line entry point for the TurboMe HTTP API. Configuration comes from
//! CLI flags, each of which can also be supplied through an environment variable.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use turbome::config::{ServerArgs, ServerConfig};

#[tokio::main]
async fn main() {
    println!(r" ______          __          __  ___
/_  __/_ _______/ /  ___    /  |/  /__
 / / / // / __/ _ \/ _ \  / /|_/ / -_)
/_/  \_,_/_/ /_.__/\___/ /_/  /_/\__/ ");

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"));
    if let Ok(filter) = filter {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    let args = ServerArgs::parse();
    let result = match ServerConfig::resolve(args) {
        Ok(cfg) => {
            println!("turbome starting in {} mode: http={}, storage_dir={}", cfg.mode.as_str(), cfg.addr, cfg.storage_dir.display());
            turbome::server::run_with_config(cfg).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(target: "startup", "turbome server failed: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
