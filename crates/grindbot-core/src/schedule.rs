use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

const VOTE_INTERVAL_HOURS: i64 = 12;

/// Tracks the once-a-day and once-every-12h commands.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    last_daily: Option<NaiveDate>,
    last_checklist: Option<NaiveDate>,
    last_vote: Option<DateTime<Utc>>,
}

fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

impl Schedule {
    pub fn daily_due(&self, now: DateTime<Utc>) -> bool {
        self.last_daily != Some(local_date(now))
    }

    pub fn checklist_due(&self, now: DateTime<Utc>) -> bool {
        self.last_checklist != Some(local_date(now))
    }

    pub fn vote_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_vote {
            None => true,
            Some(last) => now - last > Duration::hours(VOTE_INTERVAL_HOURS),
        }
    }

    pub fn mark_daily(&mut self, now: DateTime<Utc>) {
        self.last_daily = Some(local_date(now));
    }

    pub fn mark_checklist(&mut self, now: DateTime<Utc>) {
        self.last_checklist = Some(local_date(now));
    }

    pub fn mark_vote(&mut self, now: DateTime<Utc>) {
        self.last_vote = Some(now);
    }
}

/// True on every `every`-th cycle (1-based). Zero disables.
pub fn every_nth(cycle: u64, every: u32) -> bool {
    every > 0 && cycle > 0 && cycle % u64::from(every) == 0
}
