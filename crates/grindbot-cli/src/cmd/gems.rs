use crate::output::Printer;
use grindbot_core::buffs::gem_name;

pub fn run(ids: &[String], out: &Printer) -> anyhow::Result<()> {
    for id in ids {
        out.line(&format!("💎 {id}: {}", gem_name(id.trim())));
    }
    Ok(())
}
