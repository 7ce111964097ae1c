use alumnet::{StoreConfig, config::redact_url};
use anyhow::{Context, Result};

use super::Service;
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Connectivity",
    commands: &[
        "alumnet ping",
        "ALUMNET_STORE_URL=redis://db.internal:6379/0 alumnet ping",
        "alumnet --config ./alumnet.toml ping -v",
    ],
}];

pub async fn handle_ping(config: &StoreConfig, service: &Service, output: &OutputManager) -> Result<()> {
    output.heading("Document store");
    output.key_value("URL", &redact_url(&config.url));
    output.key_value("Key prefix", &config.key_prefix);
    output.verbose(&format!("url source: {:?}", config.url_source));
    output.verbose(&format!("reconnect policy: {:?}", config.reconnect));

    output.progress("Connecting");
    let result = service.ping().await;
    output.clear_line();
    result.context("store did not answer PING")?;

    output.success("Store reachable");
    Ok(())
}
