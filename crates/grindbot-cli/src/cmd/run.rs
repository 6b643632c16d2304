use crate::output::Printer;
use anyhow::Context;
use grindbot_core::api::HttpChatClient;
use grindbot_core::clock::SystemClock;
use grindbot_core::config::Config;
use grindbot_core::notify;
use grindbot_core::session::{HaltReport, Operator, OperatorChoice, Session};
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Operator prompt
// ---------------------------------------------------------------------------

/// Asks on the terminal after a halt. EOF counts as quit.
struct TerminalOperator<R> {
    input: R,
    out: Printer,
}

impl<R: BufRead> TerminalOperator<R> {
    fn ask(&mut self) -> OperatorChoice {
        loop {
            print!("Type 'resume' once the challenge is handled, or 'quit': ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return OperatorChoice::Quit,
                Ok(_) => {}
            }
            match parse_choice(&line) {
                Some(choice) => return choice,
                None => self.out.line("⚠️ Please type 'resume' or 'quit'"),
            }
        }
    }
}

impl<R: BufRead> Operator for TerminalOperator<R> {
    fn on_halt(&mut self, report: &HaltReport) -> OperatorChoice {
        self.out.line("🛑 Challenge detected. No further commands will be sent.");
        self.out.line(&format!(
            "🔍 Keyword: {} | Channel: {} | Command: {}",
            report.keyword, report.channel_id, report.command
        ));
        self.out.line(&format!("📝 {}", report.excerpt));
        self.ask()
    }
}

fn parse_choice(line: &str) -> Option<OperatorChoice> {
    match line.trim().to_lowercase().as_str() {
        "resume" | "r" => Some(OperatorChoice::Resume),
        "quit" | "q" | "exit" => Some(OperatorChoice::Quit),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, cycles: Option<u64>, out: &Printer) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;

    let client = HttpChatClient::new(
        &config.api_base,
        &config.token,
        Duration::from_secs(config.pacing.fallback_retry_after_secs),
    )?;
    let notifier = notify::from_url(config.webhook_url.as_deref());

    out.line(&format!(
        "🚀 Starting on {} channel(s), prefix '{}'",
        config.channels.len(),
        config.command_prefix
    ));
    for channel in &config.channels {
        out.line(&format!("🔹 {} ({})", channel.label(), channel.id));
    }

    let mut session = Session::new(config, client, SystemClock, notifier)?;
    let mut operator = TerminalOperator {
        input: std::io::stdin().lock(),
        out: *out,
    };
    let report = session.run(cycles, &mut operator)?;
    out.line(&report);
    out.line(&session.estimates());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Cursor;

    fn report() -> HaltReport {
        HaltReport {
            keyword: "captcha".to_string(),
            excerpt: "please complete the captcha".to_string(),
            channel_id: "42".to_string(),
            command: "owo hunt".to_string(),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn choice_words() {
        assert_eq!(parse_choice(" Resume\n"), Some(OperatorChoice::Resume));
        assert_eq!(parse_choice("q"), Some(OperatorChoice::Quit));
        assert_eq!(parse_choice("solve it"), None);
    }

    #[test]
    fn operator_reprompts_until_valid() {
        let mut op = TerminalOperator {
            input: Cursor::new("what\n\nresume\n"),
            out: Printer::new(true),
        };
        assert_eq!(op.on_halt(&report()), OperatorChoice::Resume);
    }

    #[test]
    fn operator_quits_on_eof() {
        let mut op = TerminalOperator {
            input: Cursor::new(""),
            out: Printer::new(true),
        };
        assert_eq!(op.on_halt(&report()), OperatorChoice::Quit);
    }
}
