use clap::Parser;
use tracing::info;

use kurz::cli::Cli;
use kurz::config::StaticConfig;
use kurz::runtime::modes;
use kurz::system::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    let config = match StaticConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&config.logging)?;
    info!("kurz v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(command) => modes::run_cli(config, command).await,
        #[cfg(feature = "server")]
        None => modes::run_server(config).await,
        #[cfg(not(feature = "server"))]
        None => anyhow::bail!("Built without the `server` feature"),
    }
}
