pub mod api;
pub mod buffs;
pub mod classify;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod glyphs;
pub mod notify;
pub mod pacing;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod team;
pub mod wager;

pub use error::{GrindError, Result};
