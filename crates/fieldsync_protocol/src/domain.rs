//! Synced data domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A category of synced data.
///
/// Each domain carries its own default conflict policy. The set is closed:
/// adding a domain is a compile-time-checked enum extension, not an
/// open-ended string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Free-form journal entries.
    Journal,
    /// Attendance/clock records.
    Attendance,
    /// Work tasks.
    Task,
    /// Support tickets (with escalation state).
    Ticket,
    /// Work orders.
    WorkOrder,
}

impl Domain {
    /// All supported domains.
    pub const ALL: [Domain; 5] = [
        Domain::Journal,
        Domain::Attendance,
        Domain::Task,
        Domain::Ticket,
        Domain::WorkOrder,
    ];

    /// Returns the wire name of the domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Journal => "journal",
            Domain::Attendance => "attendance",
            Domain::Task => "task",
            Domain::Ticket => "ticket",
            Domain::WorkOrder => "work_order",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "journal" => Ok(Domain::Journal),
            "attendance" => Ok(Domain::Attendance),
            "task" => Ok(Domain::Task),
            "ticket" => Ok(Domain::Ticket),
            "work_order" => Ok(Domain::WorkOrder),
            other => Err(DomainParseError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown domain name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown domain: {0}")]
pub struct DomainParseError(pub String);
