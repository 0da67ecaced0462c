//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, clock, ledger and dispatch into the
//!   per-minute scheduling pass.
//! - Keep callers (CLI, host processes) decoupled from storage details.

pub mod scheduler;
