use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const SAMPLE_EVERY: Duration = Duration::from_secs(300);
const MAX_SAMPLES: usize = 12;

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Hunt,
    Battle,
    Pray,
    Curse,
    Coinflip,
    Daily,
    Checklist,
    Use,
    Vote,
    Quest,
    Gem,
    TeamAction,
}

impl Activity {
    pub fn all() -> &'static [Activity] {
        &[
            Activity::Hunt,
            Activity::Battle,
            Activity::Pray,
            Activity::Curse,
            Activity::Coinflip,
            Activity::Daily,
            Activity::Checklist,
            Activity::Use,
            Activity::Vote,
            Activity::Quest,
            Activity::Gem,
            Activity::TeamAction,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Activity::Hunt => "Hunts",
            Activity::Battle => "Battles",
            Activity::Pray => "Prays",
            Activity::Curse => "Curses",
            Activity::Coinflip => "Coinflips",
            Activity::Daily => "Dailies",
            Activity::Checklist => "Checklists",
            Activity::Use => "Uses",
            Activity::Vote => "Votes",
            Activity::Quest => "Quests",
            Activity::Gem => "Gems",
            Activity::TeamAction => "Team",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rates {
    pub hunts: f64,
    pub battles: f64,
    pub currency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub hunts: u64,
    pub battles: u64,
    pub currency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Window {
    hunts: u64,
    battles: u64,
    currency: u64,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Stats {
    counts: [u64; 12],
    started: Instant,
    window: Window,
    window_started: Instant,
    samples: VecDeque<Rates>,
}

impl Stats {
    pub fn new(now: Instant) -> Self {
        Self {
            counts: [0; 12],
            started: now,
            window: Window::default(),
            window_started: now,
            samples: VecDeque::new(),
        }
    }

    pub fn log(&mut self, activity: Activity, amount: u64, currency: u64, now: Instant) {
        self.counts[activity.slot()] += amount;
        match activity {
            Activity::Hunt => self.window.hunts += amount,
            Activity::Battle => self.window.battles += amount,
            _ => {}
        }
        self.window.currency += currency;

        let elapsed = now.saturating_duration_since(self.window_started);
        if elapsed >= SAMPLE_EVERY {
            self.close_window(elapsed);
            self.window_started = now;
        }
    }

    fn close_window(&mut self, elapsed: Duration) {
        let hours = elapsed.as_secs_f64() / 3600.0;
        self.samples.push_back(Rates {
            hunts: self.window.hunts as f64 / hours,
            battles: self.window.battles as f64 / hours,
            currency: self.window.currency as f64 / hours,
        });
        while self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.window = Window::default();
    }

    pub fn count(&self, activity: Activity) -> u64 {
        self.counts[activity.slot()]
    }

    pub fn total_commands(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn samples(&self) -> usize {
        self.samples.len()
    }

    pub fn latest_rates(&self) -> Option<Rates> {
        self.samples.back().copied()
    }

    /// Hunts and battles have both happened at least once.
    pub fn has_initial_data(&self) -> bool {
        self.count(Activity::Hunt) > 0 && self.count(Activity::Battle) > 0
    }

    pub fn estimate(&self, hours: f64) -> Estimate {
        if self.samples.is_empty() {
            return Estimate {
                hunts: 0,
                battles: 0,
                currency: 0,
                message: Some("Not enough data yet. Please wait a few minutes.".to_string()),
            };
        }
        let n = self.samples.len() as f64;
        let sum = self.samples.iter().fold(Rates::default(), |acc, r| Rates {
            hunts: acc.hunts + r.hunts,
            battles: acc.battles + r.battles,
            currency: acc.currency + r.currency,
        });
        Estimate {
            hunts: (sum.hunts / n * hours).round() as u64,
            battles: (sum.battles / n * hours).round() as u64,
            currency: (sum.currency / n * hours).round() as u64,
            message: None,
        }
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn commands_per_hour(&self, now: Instant) -> f64 {
        let hours = self.uptime(now).as_secs_f64() / 3600.0;
        self.total_commands() as f64 / hours.max(1.0)
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Groups digits with commas: `1234567` -> `1,234,567`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_activity() {
        let t0 = Instant::now();
        let mut s = Stats::new(t0);
        s.log(Activity::Hunt, 1, 0, t0);
        s.log(Activity::Hunt, 1, 0, t0);
        s.log(Activity::Vote, 1, 0, t0);
        assert_eq!(s.count(Activity::Hunt), 2);
        assert_eq!(s.count(Activity::Vote), 1);
        assert_eq!(s.total_commands(), 3);
        assert!(!s.has_initial_data());
    }

    #[test]
    fn estimate_without_samples_reports_message() {
        let s = Stats::new(Instant::now());
        let e = s.estimate(1.0);
        assert_eq!(e.hunts, 0);
        assert!(e.message.is_some());
    }

    #[test]
    fn window_closes_after_five_minutes() {
        let t0 = Instant::now();
        let mut s = Stats::new(t0);
        for i in 0..9 {
            s.log(Activity::Hunt, 1, 100, t0 + Duration::from_secs(i * 30));
        }
        assert_eq!(s.samples(), 0);
        // tenth hunt lands exactly at 300s: 10 hunts in 1/12 h
        s.log(Activity::Hunt, 1, 100, t0 + Duration::from_secs(300));
        assert_eq!(s.samples(), 1);
        let rates = s.latest_rates().unwrap();
        assert!((rates.hunts - 120.0).abs() < 1e-6);
        assert!((rates.currency - 12_000.0).abs() < 1e-6);

        let day = s.estimate(24.0);
        assert_eq!(day.hunts, 2880);
        assert!(day.message.is_none());
    }

    #[test]
    fn keeps_only_recent_samples() {
        let t0 = Instant::now();
        let mut s = Stats::new(t0);
        for i in 1..=15 {
            s.log(Activity::Battle, 1, 0, t0 + Duration::from_secs(300 * i));
        }
        assert_eq!(s.samples(), 12);
    }

    #[test]
    fn commands_per_hour_uses_at_least_one_hour() {
        let t0 = Instant::now();
        let mut s = Stats::new(t0);
        s.log(Activity::Hunt, 30, 0, t0);
        assert_eq!(s.commands_per_hour(t0 + Duration::from_secs(600)), 30.0);
        assert_eq!(s.commands_per_hour(t0 + Duration::from_secs(7200)), 15.0);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-30_000), "-30,000");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
