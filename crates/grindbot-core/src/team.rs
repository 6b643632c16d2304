//! Team and zoo reply parsing, and the roster plan built from them.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const MAX_ADDITIONS: usize = 5;

/// Highest tier first. The last tier is removed from the team and never added.
const TIERS: [&[&str]; 6] = [
    &["dragon", "phoenix", "unicorn", "kraken"],
    &["whale", "shark", "kraken"],
    &["tiger", "lion", "bear", "eagle"],
    &["wolf", "fox", "owl", "panda"],
    &["dog", "cat", "rabbit", "pig"],
    &["cow", "chicken", "duck", "mouse"],
];

const TEAM_FALLBACK: [&str; 30] = [
    "dragon", "phoenix", "unicorn", "kraken", "whale", "shark", "wolf", "lion", "tiger", "bear",
    "eagle", "owl", "fox", "panda", "koala", "penguin", "sloth", "rabbit", "cat", "dog", "pig",
    "cow", "horse", "deer", "moose", "elk", "buffalo", "rhino", "hippo", "elephant",
];

const ZOO_FALLBACK: [&str; 17] = [
    "dragon", "phoenix", "unicorn", "kraken", "whale", "shark", "wolf", "lion", "tiger", "bear",
    "eagle", "owl", "fox", "panda", "koala", "penguin", "sloth",
];

struct Patterns {
    team: Vec<Regex>,
    zoo: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("static team pattern");
        Patterns {
            team: [
                r"(?i)\[\d+\]\s*([a-z]+)",
                r"(?i)`\d+`\s*([a-z]+)",
                r"(?i)\d+\.\s*([a-z]+)",
                r"(?i)([a-z]+)\s*\|\s*\d+",
                r"(?i)([a-z]+)\s*-\s*\d+",
            ]
            .iter()
            .map(|p| compile(p))
            .collect(),
            zoo: compile(r"([a-zA-Z]+)\s*x(\d+)"),
        }
    })
}

fn is_echo(content: &str, command: &str) -> bool {
    content.trim().eq_ignore_ascii_case(command.trim())
}

/// Animal names on the current team, in order of discovery.
pub fn parse_team(content: &str, command: &str) -> Vec<String> {
    if is_echo(content, command) {
        return Vec::new();
    }
    let mut team: Vec<String> = Vec::new();
    for re in &patterns().team {
        for caps in re.captures_iter(content) {
            let Some(m) = caps.get(1) else { continue };
            let animal = m.as_str().to_lowercase();
            if animal.len() > 2 && !team.contains(&animal) {
                team.push(animal);
            }
        }
    }
    if team.is_empty() {
        let lower = content.to_lowercase();
        team = TEAM_FALLBACK
            .iter()
            .filter(|a| lower.contains(*a))
            .map(|a| a.to_string())
            .collect();
    }
    team
}

/// Zoo contents as `animal -> count`.
pub fn parse_zoo(content: &str, command: &str) -> BTreeMap<String, u32> {
    let mut zoo = BTreeMap::new();
    if is_echo(content, command) {
        return zoo;
    }
    for caps in patterns().zoo.captures_iter(content) {
        let count: u32 = caps[2].parse().unwrap_or(0);
        if count > 0 {
            zoo.insert(caps[1].to_lowercase(), count);
        }
    }
    if zoo.is_empty() {
        let lower = content.to_lowercase();
        let has_marker = ["x1", "x2", "x3", "x4", "x5"].iter().any(|m| lower.contains(m));
        if has_marker {
            for animal in ZOO_FALLBACK.iter().filter(|a| lower.contains(*a)) {
                zoo.insert(animal.to_string(), 1);
            }
        }
    }
    zoo
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterPlan {
    pub remove: Vec<String>,
    pub add: Vec<String>,
}

impl RosterPlan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Drop lowest-tier members, then add the best zoo animals not already on
/// the team, tier by tier.
pub fn plan_roster(team: &[String], zoo: &BTreeMap<String, u32>) -> RosterPlan {
    let (low, ranked) = TIERS.split_last().map(|(l, r)| (*l, r)).unwrap_or((&[], &[]));
    let remove: Vec<String> = team
        .iter()
        .filter(|a| low.contains(&a.as_str()))
        .cloned()
        .collect();

    let mut current: Vec<String> = team.to_vec();
    let mut add = Vec::new();
    'tiers: for tier in ranked {
        for animal in tier.iter() {
            if add.len() >= MAX_ADDITIONS {
                break 'tiers;
            }
            if zoo.contains_key(*animal) && !current.iter().any(|c| c == animal) {
                add.push(animal.to_string());
                current.push(animal.to_string());
            }
        }
    }
    RosterPlan { remove, add }
}
