mod command_tests;
mod config_tests;
#[cfg(unix)]
mod run_tests;
