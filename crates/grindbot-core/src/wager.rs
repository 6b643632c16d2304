//! Martingale coinflip counter.
//!
//! The multiplier doubles after a loss (capped) and resets on a win. Every
//! five settled bets the base stake is nudged by the running win rate.

use crate::classify::BetOutcome;
use crate::config::WagerConfig;
use serde::Serialize;
use std::fmt;

const MAX_MULTIPLIER: f64 = 5.0;
const REVIEW_EVERY: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Heads,
    Tails,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Heads => Side::Tails,
            Side::Tails => Side::Heads,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Heads => "heads",
            Side::Tails => "tails",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WagerTotals {
    pub wins: u64,
    pub losses: u64,
    pub profit: i64,
    pub total_bet: u64,
}

impl WagerTotals {
    pub fn settled(&self) -> u64 {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        let settled = self.settled();
        if settled == 0 {
            0.0
        } else {
            self.wins as f64 / settled as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wager {
    base_bet: u64,
    max_bet: u64,
    current_bet: u64,
    multiplier: f64,
    pattern: [Side; 2],
    index: usize,
    win_streak: u32,
    loss_streak: u32,
    totals: WagerTotals,
}

impl Wager {
    pub fn new(config: &WagerConfig) -> Self {
        let max_bet = config.max_bet.max(config.base_bet);
        Self {
            base_bet: config.base_bet,
            max_bet,
            current_bet: config.base_bet,
            multiplier: 1.0,
            pattern: [Side::Heads, Side::Tails],
            index: 0,
            win_streak: 0,
            loss_streak: 0,
            totals: WagerTotals::default(),
        }
    }

    /// Stake and side for the next flip. Advances the side pattern.
    pub fn next_bet(&mut self) -> (u64, Side) {
        let side = self.pattern[self.index];
        self.index = (self.index + 1) % self.pattern.len();
        (self.stake(), side)
    }

    pub fn stake(&self) -> u64 {
        let raw = (self.current_bet as f64 * self.multiplier) as u64;
        raw.min(self.max_bet)
    }

    /// Settle a flip. `None` means the reply could not be read; the stake is
    /// still counted as wagered.
    pub fn record(&mut self, outcome: Option<BetOutcome>, amount: u64, side: Side) {
        self.totals.total_bet += amount;
        match outcome {
            Some(BetOutcome::Won) => {
                self.win_streak += 1;
                self.loss_streak = 0;
                self.totals.wins += 1;
                self.totals.profit += amount as i64;
                self.multiplier = 1.0;
                if self.win_streak >= 3 {
                    self.current_bet = self.scaled(1.1).min(self.max_bet);
                }
            }
            Some(BetOutcome::Lost) => {
                self.loss_streak += 1;
                self.win_streak = 0;
                self.totals.losses += 1;
                self.totals.profit -= amount as i64;
                self.multiplier = (self.multiplier * 2.0).min(MAX_MULTIPLIER);
                self.pattern = [side.opposite(), side];
                self.index = 0;
            }
            None => return,
        }
        if self.totals.settled() % REVIEW_EVERY == 0 {
            self.review();
        }
    }

    /// Adjust the base stake from the running win rate.
    pub fn review(&mut self) {
        let rate = self.totals.win_rate();
        if rate >= 55.0 {
            self.current_bet = self.scaled(1.3).min(self.max_bet);
        } else if rate < 45.0 {
            self.current_bet = self.scaled(0.8).max(self.base_bet);
        }
        tracing::info!(
            win_rate = format!("{rate:.1}"),
            current_bet = self.current_bet,
            profit = self.totals.profit,
            "wager review"
        );
    }

    fn scaled(&self, factor: f64) -> u64 {
        (self.current_bet as f64 * factor) as u64
    }

    pub fn current_bet(&self) -> u64 {
        self.current_bet
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn streaks(&self) -> (u32, u32) {
        (self.win_streak, self.loss_streak)
    }

    pub fn totals(&self) -> &WagerTotals {
        &self.totals
    }
}
