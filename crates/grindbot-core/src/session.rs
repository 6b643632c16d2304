//! The polling loop: one channel per cycle, a fixed command order, and a
//! hard stop whenever a reply looks like a challenge.
//!
//! A halted session sends nothing until [`Session::resume`] is called. The
//! resume decision always comes from a human through [`Operator`].

use crate::api::{ChatApi, Message, SendOutcome};
use crate::buffs::{self, Bonuses};
use crate::classify::{classify_bet, MessageClassifier, Verdict};
use crate::clock::Clock;
use crate::config::{ChannelConfig, Config};
use crate::cooldown::Cooldowns;
use crate::error::{GrindError, Result};
use crate::notify::{Embed, Notifier, COLOR_HALT, COLOR_INFO, COLOR_RARE};
use crate::pacing::Pacer;
use crate::schedule::{every_nth, Schedule};
use crate::stats::{format_duration, thousands, Activity, Stats};
use crate::team;
use crate::wager::Wager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

const EXCERPT_CHARS: usize = 200;
const REPLY_FETCH_LIMIT: u8 = 5;
const MAIN_COMMANDS: [&str; 2] = ["hunt", "battle"];

// ---------------------------------------------------------------------------
// Halt / operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaltReport {
    pub keyword: String,
    pub excerpt: String,
    pub channel_id: String,
    pub command: String,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorChoice {
    Resume,
    Quit,
}

/// The human in the loop. Called once per halt; the session stays halted
/// until this returns.
pub trait Operator {
    fn on_halt(&mut self, report: &HaltReport) -> OperatorChoice;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { commands: u32 },
    Halted,
}

/// What a delivered command produced.
#[derive(Debug, Clone)]
struct Exchange {
    reply: Option<Message>,
}

impl Exchange {
    fn reply_text(&self) -> &str {
        self.reply.as_ref().map(|m| m.content.as_str()).unwrap_or("")
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

fn snowflake(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session<A, C, N> {
    config: Config,
    api: A,
    clock: C,
    notifier: N,
    classifier: MessageClassifier,
    cooldowns: Cooldowns,
    pacer: Pacer,
    wager: Wager,
    stats: Stats,
    schedule: Schedule,
    active_buffs: Vec<String>,
    last_replies: HashMap<String, (String, DateTime<Utc>)>,
    channel_index: usize,
    cycle: u64,
    sent_this_cycle: u32,
    halt: Option<HaltReport>,
}

impl<A: ChatApi, C: Clock, N: Notifier> Session<A, C, N> {
    pub fn new(config: Config, api: A, clock: C, notifier: N) -> Result<Self> {
        if config.channels.is_empty() {
            return Err(GrindError::NoChannels);
        }
        let classifier =
            MessageClassifier::from_keywords(&config.halt_keywords, &config.rare_keywords)?;
        let now = clock.now();
        Ok(Self {
            cooldowns: Cooldowns::with_durations(&config.cooldowns),
            pacer: Pacer::new(&config.command_prefix, &config.pacing),
            wager: Wager::new(&config.wager),
            stats: Stats::new(now),
            schedule: Schedule::default(),
            active_buffs: Vec::new(),
            last_replies: HashMap::new(),
            channel_index: 0,
            cycle: 0,
            sent_this_cycle: 0,
            halt: None,
            classifier,
            config,
            api,
            clock,
            notifier,
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn halt(&self) -> Option<&HaltReport> {
        self.halt.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn wager(&self) -> &Wager {
        &self.wager
    }

    pub fn active_buffs(&self) -> &[String] {
        &self.active_buffs
    }

    pub fn bonuses(&self) -> Bonuses {
        buffs::bonuses(&self.active_buffs)
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn current_channel(&self) -> &ChannelConfig {
        &self.config.channels[self.channel_index]
    }

    /// Most recent reply text for a command verb (`hunt`, `team`, ...).
    pub fn last_reply(&self, verb: &str) -> Option<&str> {
        self.last_replies.get(verb).map(|(text, _)| text.as_str())
    }

    /// Clear a halt. Only the operator path should call this.
    pub fn resume(&mut self) {
        if let Some(report) = self.halt.take() {
            tracing::info!(keyword = %report.keyword, "resumed by operator");
        }
    }

    // -- loop ---------------------------------------------------------------

    /// Run cycles until `max_cycles` (if any) or until the operator quits.
    pub fn run<O: Operator>(
        &mut self,
        max_cycles: Option<u64>,
        operator: &mut O,
    ) -> Result<String> {
        loop {
            if max_cycles.is_some_and(|max| self.cycle >= max) {
                break;
            }
            match self.run_cycle()? {
                CycleOutcome::Halted => {
                    let choice = match &self.halt {
                        Some(report) => operator.on_halt(report),
                        None => OperatorChoice::Resume,
                    };
                    match choice {
                        OperatorChoice::Resume => self.resume(),
                        OperatorChoice::Quit => break,
                    }
                }
                CycleOutcome::Completed { commands } => {
                    tracing::info!(commands, "{}", self.summary_line());
                    if max_cycles.is_some_and(|max| self.cycle >= max) {
                        break;
                    }
                    let wait = self.next_interval();
                    tracing::info!(wait_secs = wait.as_secs(), "waiting");
                    self.clock.sleep(wait);
                }
            }
        }
        let report = self.final_report();
        self.notifier.notify(Embed {
            title: "Session stopped".to_string(),
            description: format!("Total commands: {}", self.stats.total_commands()),
            color: COLOR_INFO,
            timestamp: self.clock.wall(),
        });
        Ok(report)
    }

    /// Fixed wait before the next cycle; longer while both main commands
    /// are still cooling down.
    pub fn next_interval(&mut self) -> Duration {
        let now = self.clock.now();
        let secs = if self.cooldowns.all_cooling(&MAIN_COMMANDS, now) {
            self.config.pacing.idle_interval_secs
        } else {
            self.config.pacing.cycle_interval_secs
        };
        Duration::from_secs(secs)
    }

    /// One pass over the active channel.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        if self.is_halted() {
            return Ok(CycleOutcome::Halted);
        }
        self.cycle += 1;
        self.sent_this_cycle = 0;
        let channel = self.current_channel().clone();
        tracing::info!(channel = %channel.label(), cycle = self.cycle, "cycle start");

        self.main_commands(&channel.id)?;
        self.coinflip(&channel.id)?;
        self.blessings(&channel.id)?;
        self.periodic(&channel.id)?;
        self.timed(&channel.id)?;

        if self.is_halted() {
            return Ok(CycleOutcome::Halted);
        }
        self.channel_index = (self.channel_index + 1) % self.config.channels.len();
        Ok(CycleOutcome::Completed {
            commands: self.sent_this_cycle,
        })
    }

    // -- command groups -----------------------------------------------------

    fn main_commands(&mut self, channel: &str) -> Result<()> {
        if self.config.features.hunt && self.ready("hunt") {
            if let Some(ex) = self.issue(channel, "hunt", "hunt")? {
                self.stats.log(Activity::Hunt, 1, 0, self.clock.now());
                self.cooldowns.start("hunt", self.clock.now());
                if ex.reply.is_some() {
                    self.active_buffs = buffs::parse_active_buffs(ex.reply_text());
                }
            }
        }
        if self.config.features.battle && self.ready("battle") {
            if self.issue(channel, "battle", "battle")?.is_some() {
                self.stats.log(Activity::Battle, 1, 0, self.clock.now());
                self.cooldowns.start("battle", self.clock.now());
            }
        }
        Ok(())
    }

    fn coinflip(&mut self, channel: &str) -> Result<()> {
        if !self.config.features.coinflip || !self.ready("coinflip") {
            return Ok(());
        }
        let (amount, side) = self.wager.next_bet();
        let command = format!("coinflip {amount} {side}");
        if let Some(ex) = self.issue(channel, "coinflip", &command)? {
            self.stats.log(Activity::Coinflip, 1, 0, self.clock.now());
            self.cooldowns.start("coinflip", self.clock.now());
            let outcome = ex.reply.as_ref().and_then(|m| classify_bet(&m.content));
            let before = self.wager.totals().profit;
            self.wager.record(outcome, amount, side);
            let gained = self.wager.totals().profit - before;
            if gained > 0 {
                self.stats.log(Activity::Coinflip, 0, gained as u64, self.clock.now());
            }
            tracing::info!(amount, %side, ?outcome, profit = self.wager.totals().profit, "coinflip");
        }
        Ok(())
    }

    fn blessings(&mut self, channel: &str) -> Result<()> {
        if self.config.features.pray && self.ready("pray") {
            if self.issue(channel, "pray", "pray")?.is_some() {
                self.stats.log(Activity::Pray, 1, 0, self.clock.now());
                self.cooldowns.start("pray", self.clock.now());
            }
        }
        if self.config.features.curse && self.ready("curse") {
            if self.issue(channel, "curse", "curse")?.is_some() {
                self.stats.log(Activity::Curse, 1, 0, self.clock.now());
                self.cooldowns.start("curse", self.clock.now());
            }
        }
        Ok(())
    }

    fn periodic(&mut self, channel: &str) -> Result<()> {
        let periodic = self.config.periodic.clone();
        if self.config.features.auto_use && every_nth(self.cycle, periodic.use_every) {
            for item in self.config.use_items.clone() {
                // numeric items are gem ids
                let activity = if item.chars().all(|c| c.is_ascii_digit()) {
                    Activity::Gem
                } else {
                    Activity::Use
                };
                if self.issue(channel, "use", &format!("use {item}"))?.is_some() {
                    self.stats.log(activity, 1, 0, self.clock.now());
                }
            }
        }
        if self.config.features.quest && every_nth(self.cycle, periodic.quest_every) {
            if self.issue(channel, "quest", "quest")?.is_some() {
                self.stats.log(Activity::Quest, 1, 0, self.clock.now());
            }
        }
        if self.config.features.team_management && every_nth(self.cycle, periodic.team_every) {
            self.manage_team(channel)?;
        }
        Ok(())
    }

    fn manage_team(&mut self, channel: &str) -> Result<()> {
        let team_cmd = self.config.command("team");
        let zoo_cmd = self.config.command("zoo");
        let Some(team_ex) = self.issue(channel, "team", "team")? else {
            return Ok(());
        };
        let current = team::parse_team(team_ex.reply_text(), &team_cmd);
        let Some(zoo_ex) = self.issue(channel, "zoo", "zoo")? else {
            return Ok(());
        };
        let zoo = team::parse_zoo(zoo_ex.reply_text(), &zoo_cmd);
        let plan = team::plan_roster(&current, &zoo);
        if plan.is_empty() {
            tracing::info!("team already optimized");
            return Ok(());
        }
        for animal in &plan.remove {
            self.issue(channel, "team", &format!("team remove {animal}"))?;
        }
        for animal in &plan.add {
            self.issue(channel, "team", &format!("team add {animal}"))?;
        }
        self.stats.log(Activity::TeamAction, 1, 0, self.clock.now());
        tracing::info!(removed = ?plan.remove, added = ?plan.add, "team updated");
        Ok(())
    }

    fn timed(&mut self, channel: &str) -> Result<()> {
        let features = self.config.features.clone();
        if features.daily && self.schedule.daily_due(self.clock.wall()) {
            if self.issue(channel, "daily", "daily")?.is_some() {
                self.stats.log(Activity::Daily, 1, 0, self.clock.now());
                self.schedule.mark_daily(self.clock.wall());
            }
        }
        if features.checklist && self.schedule.checklist_due(self.clock.wall()) {
            if self.issue(channel, "checklist", "checklist")?.is_some() {
                self.stats.log(Activity::Checklist, 1, 0, self.clock.now());
                self.schedule.mark_checklist(self.clock.wall());
            }
        }
        if features.vote && self.schedule.vote_due(self.clock.wall()) {
            if self.issue(channel, "vote", "vote")?.is_some() {
                self.stats.log(Activity::Vote, 1, 0, self.clock.now());
                self.schedule.mark_vote(self.clock.wall());
            }
        }
        Ok(())
    }

    // -- plumbing -----------------------------------------------------------

    fn ready(&mut self, verb: &str) -> bool {
        !self.is_halted() && self.cooldowns.is_ready(verb, self.clock.now())
    }

    /// Send one command and read the game bot's reply.
    ///
    /// `Ok(None)` when halted, rejected, or still rate limited after the
    /// configured retries.
    fn issue(&mut self, channel: &str, verb: &str, args: &str) -> Result<Option<Exchange>> {
        if self.is_halted() {
            return Ok(None);
        }
        let content = self.config.command(args);
        let max_retries = self.config.pacing.max_rate_limit_retries;
        let mut attempt = 0u32;

        let sent = loop {
            self.pacer.wait_before(&content, &self.clock);
            let outcome = self.api.send_message(channel, &content)?;
            self.pacer.mark_sent(self.clock.now());
            match outcome {
                SendOutcome::Delivered(msg) => break msg,
                SendOutcome::RateLimited { retry_after } => {
                    if attempt >= max_retries {
                        tracing::warn!(%content, attempt, "still rate limited, skipping");
                        return Ok(None);
                    }
                    attempt += 1;
                    tracing::warn!(
                        %content,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "rate limited"
                    );
                    self.clock.sleep(retry_after);
                }
                SendOutcome::Rejected { status, detail } => {
                    tracing::warn!(%content, status, %detail, "command rejected");
                    return Ok(None);
                }
            }
        };
        self.sent_this_cycle += 1;
        tracing::info!(%content, "sent");

        let reply = self.fetch_reply(channel, &sent.id)?;
        if let Some(msg) = &reply {
            self.last_replies
                .insert(verb.to_string(), (msg.content.clone(), self.clock.wall()));
            self.inspect(channel, &content, msg);
        }
        Ok(Some(Exchange { reply }))
    }

    fn fetch_reply(&mut self, channel: &str, after_id: &str) -> Result<Option<Message>> {
        self.clock
            .sleep(Duration::from_millis(self.config.pacing.reply_wait_ms));
        let messages = match self.api.messages_after(channel, after_id, REPLY_FETCH_LIMIT) {
            Ok(m) => m,
            Err(GrindError::Api { status, detail }) => {
                tracing::warn!(status, %detail, "could not read replies");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(messages
            .into_iter()
            .filter(|m| m.author.id == self.config.game_bot_id)
            .min_by_key(|m| snowflake(&m.id)))
    }

    fn inspect(&mut self, channel: &str, command: &str, reply: &Message) {
        match self.classifier.classify(&reply.content) {
            Verdict::Halt { keyword } => {
                let report = HaltReport {
                    keyword: keyword.clone(),
                    excerpt: excerpt(&reply.content),
                    channel_id: channel.to_string(),
                    command: command.to_string(),
                    detected_at: self.clock.wall(),
                };
                tracing::error!(%keyword, %channel, "challenge detected, halting");
                self.notifier.notify(Embed {
                    title: "Challenge detected".to_string(),
                    description: format!(
                        "Manual action required\nKeyword: {keyword}\nMessage: {}",
                        report.excerpt
                    ),
                    color: COLOR_HALT,
                    timestamp: report.detected_at,
                });
                self.halt = Some(report);
            }
            Verdict::Rare { keyword } => {
                tracing::info!(%keyword, "rare catch");
                self.notifier.notify(Embed {
                    title: "Rare catch".to_string(),
                    description: format!("Found: {keyword}\nMessage: {}", excerpt(&reply.content)),
                    color: COLOR_RARE,
                    timestamp: self.clock.wall(),
                });
            }
            Verdict::Normal => {}
        }
    }

    // -- reporting ----------------------------------------------------------

    pub fn summary_line(&self) -> String {
        let totals = self.wager.totals();
        format!(
            "Commands: {} | H:{} B:{} CF:{} | Profit: {}{} ({:.1}% WR) | Uptime: {}",
            self.stats.total_commands(),
            self.stats.count(Activity::Hunt),
            self.stats.count(Activity::Battle),
            self.stats.count(Activity::Coinflip),
            if totals.profit >= 0 { "+" } else { "" },
            thousands(totals.profit),
            totals.win_rate(),
            format_duration(self.stats.uptime(self.clock.now())),
        )
    }

    pub fn final_report(&self) -> String {
        let now = self.clock.now();
        let mut out = vec![
            "=".repeat(60),
            "📊 FINAL STATISTICS".to_string(),
            "=".repeat(60),
            format!("⏰ Uptime: {}", format_duration(self.stats.uptime(now))),
        ];
        for activity in Activity::all() {
            out.push(format!(
                "- {}: {}",
                activity.label(),
                thousands(self.stats.count(*activity) as i64)
            ));
        }
        let totals = self.wager.totals();
        out.push(format!(
            "🪙 Wagered: {} | Profit: {} | W/L: {}/{}",
            thousands(totals.total_bet as i64),
            thousands(totals.profit),
            totals.wins,
            totals.losses
        ));
        out.push(format!("📈 Total Commands: {}", self.stats.total_commands()));
        out.push(format!(
            "📊 Commands/Hour: {:.1}",
            self.stats.commands_per_hour(now)
        ));
        if !self.active_buffs.is_empty() {
            out.push(format!("💎 Active buffs: {}", self.active_buffs.join(", ")));
        }
        out.push("=".repeat(60));
        out.join("\n")
    }

    /// Per-hour and per-day projections from measured rates.
    pub fn estimates(&self) -> String {
        let bonuses = self.bonuses();
        let mut out = vec!["📊 Farming estimates".to_string()];
        if bonuses != Bonuses::default() {
            out.push(format!(
                "✨ Bonuses: hunt +{}% | battle +{}% | lucky +{}%",
                bonuses.hunt, bonuses.battle, bonuses.lucky
            ));
        }
        for (label, hours) in [("Hour", 1.0), ("Day", 24.0)] {
            let e = self.stats.estimate(hours);
            match e.message {
                Some(msg) => {
                    out.push(msg);
                    break;
                }
                None => out.push(format!(
                    "⏱️ Per {label}: {} hunts, {} battles, {} currency",
                    thousands(e.hunts as i64),
                    thousands(e.battles as i64),
                    thousands(e.currency as i64)
                )),
            }
        }
        out.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
