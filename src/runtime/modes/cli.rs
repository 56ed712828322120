//! CLI mode

use anyhow::{Context, Result};
use chrono::SecondsFormat;

use crate::analytics::ClickRecorder;
use crate::cli::Commands;
use crate::config::StaticConfig;
use crate::storage::{ClickEvent, StorageFactory};

pub async fn run_cli(config: StaticConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Clicks { link, limit } => print_clicks(&config, &link, limit).await,
    }
}

async fn print_clicks(config: &StaticConfig, link: &str, limit: Option<usize>) -> Result<()> {
    let Some((domain, keyword)) = link.split_once('/') else {
        anyhow::bail!("Expected <domain>/<keyword>, got '{}'", link);
    };
    let link_key = crate::storage::link_key(&crate::utils::normalize_host(domain), keyword);

    let storage = StorageFactory::create(config)
        .await
        .context("Failed to open click store")?;
    let recorder = ClickRecorder::new(storage.clicks.clone(), config.accounting.scan_page_size);

    let mut cursor = recorder.list_clicks(&link_key);
    let mut printed = 0usize;
    while let Some(event) = cursor.next_event().await? {
        if limit.is_some_and(|limit| printed >= limit) {
            break;
        }
        println!("{}", format_click(&event));
        printed += 1;
    }

    eprintln!("{} click(s) for {}", printed, link_key);
    Ok(())
}

fn format_click(event: &ClickEvent) -> String {
    match event.clicked_at() {
        Some(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => event.timestamp.to_string(),
    }
}
