use crate::clock::Clock;
use crate::config::PacingConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Enforces a fixed minimum gap between consecutive commands.
///
/// The gap depends on the command family and never drops below the floor.
#[derive(Debug, Clone)]
pub struct Pacer {
    prefix: String,
    gaps: HashMap<String, Duration>,
    floor: Duration,
    last_sent: Option<Instant>,
}

impl Pacer {
    pub fn new(prefix: &str, config: &PacingConfig) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            gaps: config
                .min_gap_ms
                .iter()
                .map(|(k, v)| (k.clone(), Duration::from_millis(*v)))
                .collect(),
            floor: Duration::from_millis(config.floor_ms),
            last_sent: None,
        }
    }

    /// Family key used to look up the gap: `hunt`, `battle`, `pray`,
    /// `curse`, `use`, `inv`, or `default`.
    pub fn family(&self, command: &str) -> &'static str {
        let lower = command.trim().to_lowercase();
        let rest = lower
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(&lower)
            .trim_start();
        match rest.split_whitespace().next().unwrap_or("") {
            "hunt" | "h" => "hunt",
            "battle" | "b" => "battle",
            "pray" => "pray",
            "curse" => "curse",
            "use" => "use",
            "inv" | "inventory" => "inv",
            _ => "default",
        }
    }

    pub fn gap_for(&self, command: &str) -> Duration {
        let family = self.family(command);
        let gap = self
            .gaps
            .get(family)
            .or_else(|| self.gaps.get("default"))
            .copied()
            .unwrap_or(self.floor);
        gap.max(self.floor)
    }

    /// Sleeps for whatever part of the gap has not yet elapsed. Returns the
    /// time slept.
    pub fn wait_before<C: Clock>(&self, command: &str, clock: &C) -> Duration {
        let Some(last) = self.last_sent else {
            return Duration::ZERO;
        };
        let gap = self.gap_for(command);
        let elapsed = clock.now().saturating_duration_since(last);
        if elapsed >= gap {
            return Duration::ZERO;
        }
        let wait = gap - elapsed;
        tracing::debug!(command, wait_ms = wait.as_millis() as u64, "pacing");
        clock.sleep(wait);
        wait
    }

    pub fn mark_sent(&mut self, at: Instant) {
        self.last_sent = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn pacer() -> Pacer {
        Pacer::new("owo", &PacingConfig::default())
    }

    #[test]
    fn families_resolve_from_command_text() {
        let p = pacer();
        assert_eq!(p.family("owo hunt"), "hunt");
        assert_eq!(p.family("OWO B"), "battle");
        assert_eq!(p.family("owo use cookie"), "use");
        assert_eq!(p.family("owo inv"), "inv");
        assert_eq!(p.family("owo coinflip 1000 heads"), "default");
    }

    #[test]
    fn gaps_follow_table() {
        let p = pacer();
        assert_eq!(p.gap_for("owo hunt"), Duration::from_millis(1200));
        assert_eq!(p.gap_for("owo use milk"), Duration::from_millis(1000));
        assert_eq!(p.gap_for("owo inv"), Duration::from_millis(1500));
        assert_eq!(p.gap_for("owo daily"), Duration::from_millis(800));
    }

    #[test]
    fn floor_applies_to_small_gaps() {
        let mut config = PacingConfig::default();
        config.min_gap_ms.insert("default".to_string(), 100);
        let p = Pacer::new("owo", &config);
        assert_eq!(p.gap_for("owo vote"), Duration::from_millis(500));
    }

    #[test]
    fn first_command_never_waits() {
        let clock = ManualClock::new();
        assert_eq!(pacer().wait_before("owo hunt", &clock), Duration::ZERO);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn waits_only_for_remaining_gap() {
        let clock = ManualClock::new();
        let mut p = pacer();
        p.mark_sent(clock.now());
        clock.advance(Duration::from_millis(700));

        let waited = p.wait_before("owo battle", &clock);
        assert_eq!(waited, Duration::from_millis(500));
        assert_eq!(clock.elapsed(), Duration::from_millis(1200));

        clock.advance(Duration::from_secs(5));
        assert_eq!(p.wait_before("owo battle", &clock), Duration::ZERO);
    }
}
