//! Deterministic, pure logic shared by the farmer.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! snapshots and return deterministic outputs suitable for tests.

pub mod boss;
pub mod probe;
pub mod result_code;
pub mod score;
pub mod selector;
pub mod types;
