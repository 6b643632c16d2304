use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-command cooldowns with fixed durations.
///
/// A command with no configured duration, or one that was never started, is
/// always ready. Expired entries are cleared on read.
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    durations: HashMap<String, Duration>,
    expiries: HashMap<String, Instant>,
}

impl Cooldowns {
    pub fn with_durations(secs: &HashMap<String, u64>) -> Self {
        Self {
            durations: secs
                .iter()
                .map(|(k, v)| (k.clone(), Duration::from_secs(*v)))
                .collect(),
            expiries: HashMap::new(),
        }
    }

    pub fn duration(&self, command: &str) -> Duration {
        self.durations.get(command).copied().unwrap_or_default()
    }

    pub fn is_ready(&mut self, command: &str, now: Instant) -> bool {
        match self.expiries.get(command) {
            None => true,
            Some(&expiry) if now >= expiry => {
                self.expiries.remove(command);
                true
            }
            Some(_) => false,
        }
    }

    pub fn start(&mut self, command: &str, now: Instant) {
        let duration = self.duration(command);
        if duration.is_zero() {
            self.expiries.remove(command);
            return;
        }
        self.expiries.insert(command.to_string(), now + duration);
    }

    pub fn remaining(&self, command: &str, now: Instant) -> Duration {
        self.expiries
            .get(command)
            .map(|expiry| expiry.saturating_duration_since(now))
            .unwrap_or_default()
    }

    pub fn all_cooling(&mut self, commands: &[&str], now: Instant) -> bool {
        commands.iter().all(|c| !self.is_ready(c, now))
    }
}
