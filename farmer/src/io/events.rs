//! Agent event stream.
//!
//! Every state transition of an agent produces one [`AgentEvent`]. Events are
//! handed to the sink synchronously, in order, and are never buffered here.
//! The production sink forwards them to `tracing`; tests record them.

use std::fmt;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Which part of the agent loop an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Starting,
    CheckingPriorWork,
    SelectingWork,
    JoiningPlanet,
    JoiningWork,
    Working,
    Reporting,
    BossEncounter,
    Stopped,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::CheckingPriorWork => "checking_prior_work",
            Self::SelectingWork => "selecting_work",
            Self::JoiningPlanet => "joining_planet",
            Self::JoiningWork => "joining_work",
            Self::Working => "working",
            Self::Reporting => "reporting",
            Self::BossEncounter => "boss_encounter",
            Self::Stopped => "stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    /// Display name of the account the event belongs to.
    pub account: String,
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: AgentEvent);
}

/// Sink that turns events into `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AgentEvent) {
        let AgentEvent {
            account,
            stage,
            severity,
            message,
        } = event;
        match severity {
            Severity::Info => info!(%account, %stage, "{message}"),
            Severity::Success => info!(%account, %stage, outcome = "success", "{message}"),
            Severity::Warning => warn!(%account, %stage, "{message}"),
            Severity::Error => error!(%account, %stage, "{message}"),
        }
    }
}

/// Per-account handle that stamps the account name onto events.
pub struct EventLog<'a> {
    account: &'a str,
    sink: &'a dyn EventSink,
}

impl<'a> EventLog<'a> {
    pub fn new(account: &'a str, sink: &'a dyn EventSink) -> Self {
        Self { account, sink }
    }

    pub fn emit(&self, stage: Stage, severity: Severity, message: impl Into<String>) {
        self.sink.emit(AgentEvent {
            account: self.account.to_string(),
            stage,
            severity,
            message: message.into(),
        });
    }

    pub fn info(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, Severity::Info, message);
    }

    pub fn success(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, Severity::Success, message);
    }

    pub fn warning(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, Severity::Warning, message);
    }

    pub fn error(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, Severity::Error, message);
    }
}
