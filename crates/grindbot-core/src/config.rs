use crate::error::{GrindError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const TOKEN_ENV: &str = "GRINDBOT_TOKEN";
pub const CHANNELS_ENV: &str = "GRINDBOT_CHANNELS";

const MIN_TOKEN_LEN: usize = 50;

// ---------------------------------------------------------------------------
// ChannelConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelConfig {
    /// Display name, falling back to `Channel-<id>`.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Channel-{}", self.id))
    }

    fn from_env_id(id: &str) -> Self {
        let id = id.trim().to_string();
        let tail: String = {
            let chars: Vec<char> = id.chars().collect();
            let start = chars.len().saturating_sub(4);
            chars[start..].iter().collect()
        };
        Self {
            name: Some(format!("Channel {tail}")),
            id,
        }
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    #[serde(default = "yes")]
    pub hunt: bool,
    #[serde(default = "yes")]
    pub battle: bool,
    #[serde(default = "yes")]
    pub coinflip: bool,
    #[serde(default = "yes")]
    pub pray: bool,
    #[serde(default = "yes")]
    pub curse: bool,
    #[serde(default = "yes")]
    pub daily: bool,
    #[serde(default = "yes")]
    pub checklist: bool,
    #[serde(default = "yes")]
    pub vote: bool,
    #[serde(default)]
    pub quest: bool,
    #[serde(default)]
    pub team_management: bool,
    #[serde(default)]
    pub auto_use: bool,
}

fn yes() -> bool {
    true
}

impl Default for Features {
    fn default() -> Self {
        Self {
            hunt: true,
            battle: true,
            coinflip: true,
            pray: true,
            curse: true,
            daily: true,
            checklist: true,
            vote: true,
            quest: false,
            team_management: false,
            auto_use: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PacingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum gap before a command, keyed by command family
    /// (`hunt`, `battle`, `pray`, `curse`, `use`, `inv`, `default`).
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: HashMap<String, u64>,
    #[serde(default = "default_floor_ms")]
    pub floor_ms: u64,
    #[serde(default = "default_reply_wait_ms")]
    pub reply_wait_ms: u64,
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,
    #[serde(default = "default_idle_interval")]
    pub idle_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_rate_limit_retries: u32,
    /// Used when a 429 carries neither a body nor a header hint.
    #[serde(default = "default_retry_after")]
    pub fallback_retry_after_secs: u64,
}

fn default_min_gap_ms() -> HashMap<String, u64> {
    let mut m = HashMap::new();
    for family in ["hunt", "battle", "pray", "curse"] {
        m.insert(family.to_string(), 1200);
    }
    m.insert("use".to_string(), 1000);
    m.insert("inv".to_string(), 1500);
    m.insert("default".to_string(), 800);
    m
}

fn default_floor_ms() -> u64 {
    500
}

fn default_reply_wait_ms() -> u64 {
    1500
}

fn default_cycle_interval() -> u64 {
    30
}

fn default_idle_interval() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_after() -> u64 {
    60
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_gap_ms: default_min_gap_ms(),
            floor_ms: default_floor_ms(),
            reply_wait_ms: default_reply_wait_ms(),
            cycle_interval_secs: default_cycle_interval(),
            idle_interval_secs: default_idle_interval(),
            max_rate_limit_retries: default_max_retries(),
            fallback_retry_after_secs: default_retry_after(),
        }
    }
}

// ---------------------------------------------------------------------------
// WagerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerConfig {
    #[serde(default = "default_base_bet")]
    pub base_bet: u64,
    #[serde(default = "default_max_bet")]
    pub max_bet: u64,
}

fn default_base_bet() -> u64 {
    1000
}

fn default_max_bet() -> u64 {
    30_000
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            base_bet: default_base_bet(),
            max_bet: default_max_bet(),
        }
    }
}

// ---------------------------------------------------------------------------
// PeriodicConfig
// ---------------------------------------------------------------------------

/// Commands that run every N cycles instead of every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicConfig {
    #[serde(default = "default_every")]
    pub quest_every: u32,
    #[serde(default = "default_every")]
    pub team_every: u32,
    #[serde(default = "default_every")]
    pub use_every: u32,
}

fn default_every() -> u32 {
    10
}

impl Default for PeriodicConfig {
    fn default() -> Self {
        Self {
            quest_every: default_every(),
            team_every: default_every(),
            use_every: default_every(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Author id of the game bot whose replies are read.
    #[serde(default = "default_game_bot_id")]
    pub game_bot_id: String,
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default = "default_halt_keywords")]
    pub halt_keywords: Vec<String>,
    #[serde(default = "default_rare_keywords")]
    pub rare_keywords: Vec<String>,
    #[serde(default)]
    pub use_items: Vec<String>,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub wager: WagerConfig,
    #[serde(default)]
    pub periodic: PeriodicConfig,
    /// Cooldown per command, in seconds.
    #[serde(default = "default_cooldowns")]
    pub cooldowns: HashMap<String, u64>,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_game_bot_id() -> String {
    "408785106942164992".to_string()
}

fn default_prefix() -> String {
    "owo".to_string()
}

pub fn default_halt_keywords() -> Vec<String> {
    [
        "captcha",
        "verify",
        "human",
        "please complete",
        "banned",
        "suspended",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_rare_keywords() -> Vec<String> {
    ["legendary", "mythical", "fabled", "special", "gem", "distorted"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_cooldowns() -> HashMap<String, u64> {
    let mut m = HashMap::new();
    m.insert("hunt".to_string(), 15);
    m.insert("battle".to_string(), 15);
    m.insert("pray".to_string(), 300);
    m.insert("curse".to_string(), 300);
    m.insert("coinflip".to_string(), 45);
    m
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            channels: Vec::new(),
            api_base: default_api_base(),
            game_bot_id: default_game_bot_id(),
            command_prefix: default_prefix(),
            webhook_url: None,
            halt_keywords: default_halt_keywords(),
            rare_keywords: default_rare_keywords(),
            use_items: Vec::new(),
            features: Features::default(),
            pacing: PacingConfig::default(),
            wager: WagerConfig::default(),
            periodic: PeriodicConfig::default(),
            cooldowns: default_cooldowns(),
        }
    }
}

impl Config {
    /// Load from a JSON (or `.yaml`/`.yml`) file, apply environment
    /// overrides, then validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse the file without overrides or validation.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GrindError::Config(format!(
                "config file not found at {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&data)?
        } else {
            serde_json::from_str(&data)?
        };
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            tracing::info!("using token from {TOKEN_ENV}");
            self.token = token;
        }
        if let Some(raw) = lookup(CHANNELS_ENV).filter(|c| !c.trim().is_empty()) {
            tracing::info!("using channels from {CHANNELS_ENV}");
            self.channels = raw
                .split(',')
                .filter(|id| !id.trim().is_empty())
                .map(ChannelConfig::from_env_id)
                .collect();
        }
    }

    pub fn validate(&mut self) -> Result<()> {
        self.token = self.token.trim().to_string();
        if self.token.is_empty() {
            return Err(GrindError::InvalidToken("token is missing".to_string()));
        }
        if self.token.len() < MIN_TOKEN_LEN {
            return Err(GrindError::InvalidToken("token too short".to_string()));
        }
        if self.channels.is_empty() {
            return Err(GrindError::NoChannels);
        }
        Ok(())
    }

    /// Copy safe to print: the token keeps only its first 6 characters.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let head: String = self.token.chars().take(6).collect();
        copy.token = format!("{head}…");
        copy
    }

    pub fn command(&self, verb: &str) -> String {
        format!("{} {}", self.command_prefix, verb)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn long_token() -> String {
        "t".repeat(60)
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(config.command_prefix, "owo");
        assert_eq!(config.pacing.cycle_interval_secs, 30);
        assert_eq!(config.pacing.min_gap_ms["inv"], 1500);
        assert_eq!(config.cooldowns["pray"], 300);
        assert_eq!(config.wager.max_bet, 30_000);
        assert!(config.features.hunt);
        assert!(!config.features.quest);
        assert!(config.halt_keywords.contains(&"captcha".to_string()));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let body = format!(
            r#"{{"token": "{}", "channels": [{{"id": "123456", "name": "farm"}}]}}"#,
            long_token()
        );
        std::fs::write(&path, body).unwrap();

        let mut config = Config::read(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.channels[0].label(), "farm");
    }

    #[test]
    fn load_reads_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let body = format!(
            "token: {}\nchannels:\n  - id: \"42\"\ncommand_prefix: w\n",
            long_token()
        );
        std::fs::write(&path, body).unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(config.command_prefix, "w");
        assert_eq!(config.command("hunt"), "w hunt");
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::read(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, GrindError::Config(_)));
    }

    #[test]
    fn env_overrides_replace_token_and_channels() {
        let mut config = Config {
            token: "old".to_string(),
            ..Config::default()
        };
        let token = long_token();
        config.apply_overrides(|key| match key {
            TOKEN_ENV => Some(token.clone()),
            CHANNELS_ENV => Some(" 1111222233, 99998888 ,".to_string()),
            _ => None,
        });
        assert_eq!(config.token, token);
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].id, "1111222233");
        assert_eq!(config.channels[0].name.as_deref(), Some("Channel 2233"));
        assert_eq!(config.channels[1].name.as_deref(), Some("Channel 8888"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config {
            token: "keep".to_string(),
            ..Config::default()
        };
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.token, "keep");
        assert!(config.channels.is_empty());
    }

    #[test]
    fn validate_rejects_short_token() {
        let mut config = Config {
            token: "short".to_string(),
            channels: vec![ChannelConfig {
                id: "1".to_string(),
                name: None,
            }],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn validate_requires_channels() {
        let mut config = Config {
            token: format!("  {}  ", long_token()),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(GrindError::NoChannels)));
        // trimmed even on failure
        assert_eq!(config.token.len(), 60);
    }

    #[test]
    fn redacted_hides_token() {
        let config = Config {
            token: long_token(),
            ..Config::default()
        };
        let shown = config.redacted();
        assert_eq!(shown.token, "tttttt…");
    }
}
