pub mod check;
pub mod config;
pub mod gems;
pub mod run;
