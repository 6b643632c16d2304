use crate::output::print_json;
use anyhow::Context;
use grindbot_core::config::Config;
use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    print_json(&config.redacted())
}
