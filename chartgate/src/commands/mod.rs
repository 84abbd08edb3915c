//! Subcommand implementations.

pub mod helpers;
pub mod list;
pub mod run;
pub mod show_config;
