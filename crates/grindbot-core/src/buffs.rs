//! Active-buff parsing from hunt replies, plus the gem id catalog.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const RARITIES: [&str; 4] = ["common", "uncommon", "rare", "epic"];

struct Patterns {
    header: Regex,
    rarity: Regex,
    gems: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("static buff pattern");
        Patterns {
            header: compile(r"(?i)active buffs?|current buffs?|buffs?:|active effects?:"),
            rarity: compile(r"(?i)(epic|rare|uncommon|common)"),
            gems: [
                // "Epic Hunting Gem (30m)"
                r"(?i)(epic|rare|uncommon|common)\s+(hunting|empowering|lucky)(?:\s+gem)?\s*\([^)]*\d+[mh][^)]*\)",
                // "Hunting (Epic) 30m" / "Hunting [Epic] 30m"
                r"(?i)(hunting|empowering|lucky)\s*[(\[](epic|rare|uncommon|common)[)\]][^\n]*?\d+[mh]",
                // rarity then type anywhere on the line, timer after
                r"(?i)(epic|rare|uncommon|common)[^\n]*?(hunting|empowering|lucky)[^\n]*?\d+[mh]",
                r"(?i)(hunting|empowering|lucky)\s+gem[^\n]*?\d+[mh]",
                r"(?i)(hunting|empowering|lucky)[^\n]*?\d+[mh]",
            ]
            .iter()
            .map(|p| compile(p))
            .collect(),
        }
    })
}

fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// The text from the first buff header to the next blank line.
fn buff_section(text: &str) -> Option<&str> {
    let start = patterns().header.find(text)?.start();
    let rest = &text[start..];
    let end = rest.find("\n\n").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Normalized, de-duplicated gem buff names such as `"Epic Hunting"`.
pub fn parse_active_buffs(text: &str) -> Vec<String> {
    let Some(section) = buff_section(text) else {
        return Vec::new();
    };
    let p = patterns();
    let mut found: Vec<String> = Vec::new();
    let mut bare_types: Vec<(String, String)> = Vec::new();

    for re in &p.gems {
        for caps in re.captures_iter(section) {
            let parts: Vec<String> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim().to_lowercase())
                .collect();
            match parts.as_slice() {
                [a, b] => {
                    let (rarity, kind) = if RARITIES.contains(&a.as_str()) {
                        (a, b)
                    } else {
                        (b, a)
                    };
                    let name = format!("{} {}", title(rarity), title(kind));
                    if !found.contains(&name) {
                        found.push(name);
                    }
                }
                [kind] => {
                    let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                    let rarity = p
                        .rarity
                        .captures(whole)
                        .and_then(|c| c.get(1))
                        .map(|m| title(m.as_str()))
                        .unwrap_or_else(|| "Unknown Rarity".to_string());
                    bare_types.push((rarity, title(kind)));
                }
                _ => {}
            }
        }
    }

    // A type seen only by the loose patterns counts once, and only when no
    // precise match already named it.
    for (rarity, kind) in bare_types {
        let suffix = format!(" {kind}");
        if found.iter().any(|n| n.ends_with(&suffix)) {
            continue;
        }
        found.push(format!("{rarity} {kind}"));
    }
    found
}

// ---------------------------------------------------------------------------
// Gem catalog
// ---------------------------------------------------------------------------

const GEMS: [(&str, &str); 12] = [
    ("051", "Common Hunting"),
    ("052", "Uncommon Hunting"),
    ("053", "Rare Hunting"),
    ("054", "Epic Hunting"),
    ("065", "Common Empowering"),
    ("066", "Uncommon Empowering"),
    ("067", "Rare Empowering"),
    ("068", "Epic Empowering"),
    ("072", "Common Lucky"),
    ("073", "Uncommon Lucky"),
    ("074", "Rare Lucky"),
    ("075", "Epic Lucky"),
];

pub fn gem_name(id: &str) -> String {
    GEMS.iter()
        .find(|(gid, _)| *gid == id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown gem ({id})"))
}

// ---------------------------------------------------------------------------
// Bonuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bonuses {
    pub hunt: u32,
    pub battle: u32,
    pub lucky: u32,
}

fn rarity_bonus(rarity: &str) -> Option<u32> {
    match rarity {
        "common" => Some(5),
        "uncommon" => Some(10),
        "rare" => Some(15),
        "epic" => Some(20),
        _ => None,
    }
}

/// Percent bonuses from buff names produced by [`parse_active_buffs`].
pub fn bonuses(buffs: &[String]) -> Bonuses {
    let mut out = Bonuses::default();
    for buff in buffs {
        let lower = buff.to_lowercase();
        let Some((rarity, kind)) = lower.rsplit_once(' ') else {
            continue;
        };
        let Some(bonus) = rarity_bonus(rarity) else {
            continue;
        };
        match kind {
            "hunting" => out.hunt += bonus,
            "empowering" => out.battle += bonus,
            "lucky" => out.lucky += bonus,
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_section_no_buffs() {
        assert!(parse_active_buffs("you found a cat and epic hunting 30m").is_empty());
    }

    #[test]
    fn parses_rarity_type_with_timer() {
        let text = "🌱 hunt!\nActive buffs:\nEpic Hunting Gem (30m left)\nRare Lucky (12m)\n\nfooter 5m";
        let buffs = parse_active_buffs(text);
        assert_eq!(buffs, vec!["Epic Hunting".to_string(), "Rare Lucky".to_string()]);
    }

    #[test]
    fn parses_type_then_bracketed_rarity() {
        let buffs = parse_active_buffs("current buffs\nEmpowering [Uncommon] 45m");
        assert_eq!(buffs, vec!["Uncommon Empowering".to_string()]);
    }

    #[test]
    fn bare_type_gets_unknown_rarity_once() {
        let buffs = parse_active_buffs("buffs: lucky gem 10m");
        assert_eq!(buffs, vec!["Unknown Rarity Lucky".to_string()]);
    }

    #[test]
    fn section_stops_at_blank_line() {
        let buffs = parse_active_buffs("Active effects:\nnothing\n\nEpic Hunting (30m)");
        assert!(buffs.is_empty());
    }

    #[test]
    fn gem_catalog_lookup() {
        assert_eq!(gem_name("054"), "Epic Hunting");
        assert_eq!(gem_name("072"), "Common Lucky");
        assert_eq!(gem_name("999"), "Unknown gem (999)");
    }

    #[test]
    fn bonuses_sum_by_type() {
        let buffs = vec![
            "Epic Hunting".to_string(),
            "Common Hunting".to_string(),
            "Rare Empowering".to_string(),
            "Unknown Rarity Lucky".to_string(),
        ];
        assert_eq!(
            bonuses(&buffs),
            Bonuses {
                hunt: 25,
                battle: 15,
                lucky: 0
            }
        );
    }
}
