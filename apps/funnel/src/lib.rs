//! # funnel
//!
//! The Funnel binary's library half: CLI commands, the HTTP API and
//! configuration loading over `funnel-core`.

pub mod api;
pub mod cli;
pub mod config;
