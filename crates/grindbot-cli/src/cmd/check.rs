use crate::output::Printer;
use anyhow::Context;
use grindbot_core::api::{ChannelAccess, HttpChatClient};
use grindbot_core::config::Config;
use std::path::Path;
use std::time::Duration;

pub fn run(path: &Path, out: &Printer) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    out.line(&format!("✅ Config OK: {} channel(s)", config.channels.len()));

    let client = HttpChatClient::new(
        &config.api_base,
        &config.token,
        Duration::from_secs(config.pacing.fallback_retry_after_secs),
    )?;
    let report = client
        .check_access(&config.channels)
        .context("token check failed")?;
    out.line(&format!("✅ Logged in as {}", report.user.username));

    let labels = config.channels.iter().map(|c| (c.id.as_str(), c.label()));
    for ((id, label), (_, access)) in labels.zip(&report.channels) {
        let line = match access {
            ChannelAccess::Ok { name } => {
                format!("✅ {label} ({id}): #{}", name.as_deref().unwrap_or("?"))
            }
            ChannelAccess::Forbidden => format!("❌ {label} ({id}): no access"),
            ChannelAccess::NotFound => format!("❌ {label} ({id}): not found"),
            ChannelAccess::Failed { detail } => format!("⚠️ {label} ({id}): {detail}"),
        };
        out.line(&line);
    }

    if !report.all_ok() {
        anyhow::bail!("one or more channels are not reachable");
    }
    Ok(())
}
