use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// A deny-listed phrase is present; automation must stop.
    Halt { keyword: String },
    Rare { keyword: String },
    Normal,
}

impl Verdict {
    pub fn is_halt(&self) -> bool {
        matches!(self, Verdict::Halt { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetOutcome {
    Won,
    Lost,
}

// ---------------------------------------------------------------------------
// MessageClassifier
// ---------------------------------------------------------------------------

pub struct MessageClassifier {
    halt: Option<Regex>,
    rare: Option<Regex>,
}

/// Case-insensitive alternation of escaped literals. `None` for an empty list.
fn keyword_set(keywords: &[String]) -> Result<Option<Regex>> {
    let parts: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }
    let re = RegexBuilder::new(&parts.join("|"))
        .case_insensitive(true)
        .build()?;
    Ok(Some(re))
}

fn first_match(re: &Option<Regex>, content: &str) -> Option<String> {
    re.as_ref()?
        .find(content)
        .map(|m| m.as_str().to_lowercase())
}

impl MessageClassifier {
    pub fn from_keywords(halt: &[String], rare: &[String]) -> Result<Self> {
        Ok(Self {
            halt: keyword_set(halt)?,
            rare: keyword_set(rare)?,
        })
    }

    pub fn classify(&self, content: &str) -> Verdict {
        if let Some(keyword) = first_match(&self.halt, content) {
            return Verdict::Halt { keyword };
        }
        if let Some(keyword) = first_match(&self.rare, content) {
            return Verdict::Rare { keyword };
        }
        Verdict::Normal
    }
}

/// Reads a coinflip reply. `None` when the text says neither.
pub fn classify_bet(content: &str) -> Option<BetOutcome> {
    let lower = content.to_lowercase();
    if lower.contains("won") || lower.contains("win") {
        Some(BetOutcome::Won)
    } else if lower.contains("lost") || lower.contains("lose") {
        Some(BetOutcome::Lost)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_halt_keywords, default_rare_keywords};

    fn classifier() -> MessageClassifier {
        MessageClassifier::from_keywords(&default_halt_keywords(), &default_rare_keywords())
            .unwrap()
    }

    #[test]
    fn challenge_text_halts() {
        let v = classifier().classify("⚠️ Are you a real HUMAN? Please complete this within 10 minutes");
        assert_eq!(
            v,
            Verdict::Halt {
                keyword: "human".to_string()
            }
        );
        assert!(v.is_halt());
    }

    #[test]
    fn halt_wins_over_rare() {
        let v = classifier().classify("You found a LEGENDARY gem! Now solve this captcha.");
        assert!(v.is_halt());
    }

    #[test]
    fn rare_catch_detected() {
        let v = classifier().classify("caught a Mythical dragon");
        assert_eq!(
            v,
            Verdict::Rare {
                keyword: "mythical".to_string()
            }
        );
    }

    #[test]
    fn plain_text_is_normal() {
        assert_eq!(classifier().classify("you found: a cat, a dog"), Verdict::Normal);
    }

    #[test]
    fn keywords_are_literal_not_patterns() {
        let c = MessageClassifier::from_keywords(&["a.b".to_string()], &[]).unwrap();
        assert_eq!(c.classify("axb"), Verdict::Normal);
        assert!(c.classify("A.B").is_halt());
    }

    #[test]
    fn empty_keyword_lists_never_match() {
        let c = MessageClassifier::from_keywords(&[" ".to_string()], &[]).unwrap();
        assert_eq!(c.classify("captcha banned"), Verdict::Normal);
    }

    #[test]
    fn bet_outcomes() {
        assert_eq!(classify_bet("and you won 2000!"), Some(BetOutcome::Won));
        assert_eq!(classify_bet("and you lost it all... :c"), Some(BetOutcome::Lost));
        assert_eq!(classify_bet("the coin spins..."), None);
    }
}
