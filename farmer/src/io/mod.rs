//! Side-effecting adapters: the game API, configuration, accounts and the
//! event sink.

pub mod accounts;
pub mod api;
pub mod config;
pub mod events;
pub mod http;
pub mod wire;
