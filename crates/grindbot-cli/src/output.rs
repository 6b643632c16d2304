use grindbot_core::glyphs;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Console lines, with emoji swapped for ASCII tags under `--ascii`.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    ascii: bool,
}

impl Printer {
    pub fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    pub fn line(&self, text: &str) {
        println!("{}", glyphs::render(text, self.ascii));
    }
}
