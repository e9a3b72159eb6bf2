//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod helpers;
pub mod init;
pub mod mutate;
pub mod run;
pub mod serve_api;
pub mod words;
