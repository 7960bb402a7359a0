//! Concurrent farming client for the Salien territory-control minigame.
//!
//! Each account is driven by its own agent through
//! select → join → work → report → reselect, while a shared prober keeps a
//! fleet-wide "best zone" signal fresh so agents can abandon a hold early.
//!
//! - **[`core`]**: Pure, deterministic logic (zone selection, scoring, boss
//!   cadence, probe scheduling). No I/O.
//! - **[`io`]**: Side effects (HTTP game API, config and accounts files,
//!   event sink). Behind traits so tests can script them.
//!
//! Orchestration modules ([`agent`], [`boss`], [`coordinator`], [`fleet`],
//! [`select`]) tie the two together.

pub mod agent;
pub mod boss;
pub mod coordinator;
pub mod core;
pub mod exit_codes;
pub mod fleet;
pub mod io;
pub mod logging;
pub mod select;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
