//! Emoji to bracketed-ASCII substitution for terminals without emoji fonts.

const GLYPHS: [(&str, &str); 49] = [
    ("🚀", "[ROCKET]"),
    ("✅", "[CHECK]"),
    ("❌", "[X]"),
    ("⚠️", "[WARNING]"),
    ("🔍", "[SEARCH]"),
    ("📝", "[MEMO]"),
    ("📋", "[CLIPBOARD]"),
    ("🛑", "[STOP]"),
    ("⏰", "[CLOCK]"),
    ("🎯", "[TARGET]"),
    ("🛡️", "[SHIELD]"),
    ("🔒", "[LOCK]"),
    ("💎", "[GEM]"),
    ("🦄", "[UNICORN]"),
    ("💰", "[MONEY]"),
    ("🔄", "[REFRESH]"),
    ("⚔️", "[SWORD]"),
    ("🙏", "[PRAY]"),
    ("😈", "[DEVIL]"),
    ("🪙", "[COIN]"),
    ("📅", "[CALENDAR]"),
    ("🗳️", "[VOTE]"),
    ("🏹", "[BOW]"),
    ("⭐", "[STAR]"),
    ("🔧", "[WRENCH]"),
    ("📊", "[CHART]"),
    ("📈", "[GRAPH]"),
    ("⏱️", "[TIMER]"),
    ("💡", "[BULB]"),
    ("✨", "[SPARKLES]"),
    ("🍀", "[CLOVER]"),
    ("🦁", "[LION]"),
    ("ℹ️", "[INFO]"),
    ("🔹", "[DIAMOND]"),
    ("⏳", "[HOURGLASS]"),
    ("🎰", "[SLOT]"),
    ("🎲", "[DICE]"),
    ("🎮", "[GAME]"),
    ("🏆", "[TROPHY]"),
    ("🎊", "[CONFETTI]"),
    ("🎉", "[PARTY]"),
    ("🐉", "[DRAGON]"),
    ("🦅", "[EAGLE]"),
    ("🐺", "[WOLF]"),
    ("🦊", "[FOX]"),
    ("🐼", "[PANDA]"),
    ("🐨", "[KOALA]"),
    ("🐧", "[PENGUIN]"),
    ("🦥", "[SLOTH]"),
];

pub fn to_ascii(text: &str) -> String {
    GLYPHS
        .iter()
        .fold(text.to_string(), |acc, (emoji, tag)| acc.replace(emoji, tag))
}

/// Applies [`to_ascii`] only when `enabled`.
pub fn render(text: &str, enabled: bool) -> String {
    if enabled {
        to_ascii(text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_known_emoji() {
        assert_eq!(to_ascii("🚀 start ✅"), "[ROCKET] start [CHECK]");
        assert_eq!(to_ascii("⚠️ careful"), "[WARNING] careful");
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(to_ascii("plain → text"), "plain → text");
        assert_eq!(render("🛑", false), "🛑");
        assert_eq!(render("🛑", true), "[STOP]");
    }
}
