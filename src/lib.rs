//! buyback-drift: daily long-only equity strategy trading the drift after
//! buyback authorizations announced shortly before earnings.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
