// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store trait, the engine and the gateway.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// The class of visit a token was issued for.
///
/// Each class owns its own token number sequence and a fixed priority rank.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum VisitType {
    Appointment,
    #[default]
    #[strum(to_string = "walkin", serialize = "walk-in", serialize = "walk_in")]
    Walkin,
    Lab,
}

impl VisitType {
    /// All visit types in priority order.
    pub const ALL: [VisitType; 3] = [VisitType::Appointment, VisitType::Walkin, VisitType::Lab];

    /// Normalize a raw request value. Unknown or missing values become `Walkin`.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|s| Self::from_str(s).ok())
            .unwrap_or_default()
    }

    /// Priority rank; lower is served first at the entry stage.
    pub fn priority(self) -> i64 {
        match self {
            Self::Appointment => 1,
            Self::Walkin => 2,
            Self::Lab => 3,
        }
    }

    /// Reverse of [`VisitType::priority`].
    pub fn from_priority(priority: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.priority() == priority)
    }

    /// Column of the per-department session row holding this class's next number.
    pub fn sequence_column(self) -> &'static str {
        match self {
            Self::Appointment => "next_appointment_token",
            Self::Walkin => "next_walkin_token",
            Self::Lab => "next_lab_token",
        }
    }
}

/// Lifecycle status of a token. `Served` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStatus {
    Waiting,
    Called,
    Served,
}

/// Counter-selected filter applied when calling the next token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum CallMode {
    /// All priority classes are candidates.
    #[default]
    #[strum(to_string = "auto")]
    Auto,
    #[strum(to_string = "appointment", serialize = "appointment-only")]
    AppointmentOnly,
    #[strum(to_string = "walkin", serialize = "walkin-only", serialize = "walk-in")]
    WalkinOnly,
    #[strum(to_string = "lab", serialize = "lab-only")]
    LabOnly,
}

impl CallMode {
    /// Normalize a raw request value. Unknown or missing values become `Auto`.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|s| Self::from_str(s).ok())
            .unwrap_or_default()
    }

    /// The single priority class this mode restricts to, if any.
    pub fn priority_filter(self) -> Option<i64> {
        match self {
            Self::Auto => None,
            Self::AppointmentOnly => Some(VisitType::Appointment.priority()),
            Self::WalkinOnly => Some(VisitType::Walkin.priority()),
            Self::LabOnly => Some(VisitType::Lab.priority()),
        }
    }
}

/// How WAITING candidates at a stage are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOrder {
    /// Lowest priority first, then earliest arrival. Used at the entry stage.
    PriorityThenArrival,
    /// Earliest arrival into the stage only. Used at stages fed by transfer.
    Arrival,
}

/// Configured first number of each visit-type sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStarts {
    pub appointment: i64,
    pub walkin: i64,
    pub lab: i64,
}

impl TokenStarts {
    pub fn start_for(&self, visit_type: VisitType) -> i64 {
        match visit_type {
            VisitType::Appointment => self.appointment,
            VisitType::Walkin => self.walkin,
            VisitType::Lab => self.lab,
        }
    }
}

impl Default for TokenStarts {
    fn default() -> Self {
        Self {
            appointment: 1001,
            walkin: 2001,
            lab: 3001,
        }
    }
}

/// A stored token row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub token_no: i64,
    pub dept: String,
    pub visit_type: VisitType,
    pub stage: String,
    pub priority: i64,
    pub status: TokenStatus,
    pub arrival_seq: i64,
    pub created_at: String,
    pub called_at: Option<String>,
    pub called_by: Option<String>,
    pub served_at: Option<String>,
    pub transferred_at: Option<String>,
}

/// Result of issuing a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token_no: i64,
    pub dept: String,
    pub visit_type: VisitType,
}

/// Everything the store needs to select and call one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub dept: String,
    pub stage: String,
    pub counter: String,
    pub priority_filter: Option<i64>,
    pub order: QueueOrder,
}

/// What happens to the token a counter was serving when it moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishAction {
    /// Re-queue the token as WAITING at another stage.
    TransferTo(String),
    /// Mark the token SERVED.
    Complete,
}

/// Outcome of finishing the previous token and calling the next in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdvanceOutcome {
    /// Token the counter finished (transferred or completed), if it held one.
    pub finished: Option<i64>,
    /// Token now called to the counter, or `None` when the queue is empty.
    pub called: Option<i64>,
}

/// Persisted recall channel of one (dept, stage).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecallState {
    pub recall_seq: i64,
    pub counter: Option<String>,
}

/// Result of a successful recall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallOutcome {
    pub token_no: i64,
    pub counter: Option<String>,
    pub recall_seq: i64,
}

/// Point-in-time view of one (dept, stage) queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// WAITING tokens in the order they would be called.
    pub waiting: Vec<Token>,
    /// Most recently called token still in CALLED state.
    pub last_called: Option<i64>,
    pub called_count: usize,
    pub served_count: usize,
}

impl QueueSnapshot {
    /// Waiting token numbers, in call order.
    pub fn waiting_list(&self) -> Vec<i64> {
        self.waiting.iter().map(|t| t.token_no).collect()
    }

    /// Waiting token numbers of one visit class, in call order.
    pub fn waiting_list_for(&self, visit_type: VisitType) -> Vec<i64> {
        self.waiting
            .iter()
            .filter(|t| t.priority == visit_type.priority())
            .map(|t| t.token_no)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn visit_type_normalizes_known_values() {
        assert_eq!(VisitType::normalize(Some("appointment")), VisitType::Appointment);
        assert_eq!(VisitType::normalize(Some("  WalkIn ")), VisitType::Walkin);
        assert_eq!(VisitType::normalize(Some("walk-in")), VisitType::Walkin);
        assert_eq!(VisitType::normalize(Some("LAB")), VisitType::Lab);
    }

    #[test]
    fn visit_type_unknown_falls_back_to_walkin() {
        assert_eq!(VisitType::normalize(None), VisitType::Walkin);
        assert_eq!(VisitType::normalize(Some("")), VisitType::Walkin);
        assert_eq!(VisitType::normalize(Some("vip")), VisitType::Walkin);
    }

    #[test]
    fn priorities_follow_class_order() {
        assert!(VisitType::Appointment.priority() < VisitType::Walkin.priority());
        assert!(VisitType::Walkin.priority() < VisitType::Lab.priority());
        for vt in VisitType::ALL {
            assert_eq!(VisitType::from_priority(vt.priority()), Some(vt));
        }
        assert_eq!(VisitType::from_priority(9), None);
    }

    #[test]
    fn visit_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&VisitType::Walkin).unwrap(), "\"walkin\"");
        assert_eq!(VisitType::Appointment.to_string(), "appointment");
    }

    #[test]
    fn token_status_round_trips_uppercase() {
        assert_eq!(TokenStatus::Waiting.to_string(), "WAITING");
        assert_eq!(TokenStatus::from_str("SERVED").unwrap(), TokenStatus::Served);
    }

    #[test]
    fn call_mode_aliases() {
        assert_eq!(CallMode::normalize(Some("auto")), CallMode::Auto);
        assert_eq!(CallMode::normalize(Some("appointment-only")), CallMode::AppointmentOnly);
        assert_eq!(CallMode::normalize(Some("Walkin")), CallMode::WalkinOnly);
        assert_eq!(CallMode::normalize(Some("bogus")), CallMode::Auto);
        assert_eq!(CallMode::normalize(None), CallMode::Auto);
    }

    #[test]
    fn call_mode_filters() {
        assert_eq!(CallMode::Auto.priority_filter(), None);
        assert_eq!(CallMode::AppointmentOnly.priority_filter(), Some(1));
        assert_eq!(CallMode::WalkinOnly.priority_filter(), Some(2));
        assert_eq!(CallMode::LabOnly.priority_filter(), Some(3));
    }

    #[test]
    fn default_starts() {
        let starts = TokenStarts::default();
        assert_eq!(starts.start_for(VisitType::Appointment), 1001);
        assert_eq!(starts.start_for(VisitType::Walkin), 2001);
        assert_eq!(starts.start_for(VisitType::Lab), 3001);
    }

    proptest! {
        #[test]
        fn normalize_never_panics_and_is_stable(raw in ".{0,24}") {
            let vt = VisitType::normalize(Some(&raw));
            prop_assert_eq!(VisitType::normalize(Some(&vt.to_string())), vt);
            let mode = CallMode::normalize(Some(&raw));
            prop_assert_eq!(CallMode::normalize(Some(&mode.to_string())), mode);
        }
    }
}
