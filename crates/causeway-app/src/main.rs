use std::io::{Read, Write};

use anyhow::Context;
use causeway_core::config::load_config;
use causeway_occurrence::{ListingBatch, OccurrenceExpander, TimeZoneResolver, expand_listings};
use chrono::Utc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    // stdout carries the JSON result
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read listing JSON from stdin")?;

    let listings = serde_json::from_str::<ListingBatch>(&input)
        .context("Input is not a listing object or an array of listings")?
        .into_listings();

    tracing::info!(listings = listings.len(), "Expanding listing dates");

    let expander = OccurrenceExpander::new(config.expander);
    let mut resolver = TimeZoneResolver::new();
    let results = expand_listings(&expander, &listings, Utc::now(), &mut resolver);

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &results).context("Failed to write occurrences")?;
    writeln!(stdout)?;

    Ok(())
}
