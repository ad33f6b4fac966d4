// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue topology the engine works against.

use std::collections::BTreeMap;

use tokenq_config::TokenqConfig;
use tokenq_core::{QueueOrder, TokenStarts};

/// Departments, stages, counters and sequence starts, resolved from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_dept: String,
    pub entry_stage: String,
    pub handoff_stage: String,
    pub stages: Vec<String>,
    pub counters: BTreeMap<String, Vec<String>>,
    pub starts: TokenStarts,
}

impl EngineSettings {
    /// Department named by a request, or the default when blank or absent.
    pub fn resolve_dept(&self, raw: Option<&str>) -> String {
        raw.map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.default_dept.as_str())
            .to_string()
    }

    /// Configured stage matching `raw` (ASCII case-insensitive), else the entry stage.
    pub fn resolve_stage(&self, raw: Option<&str>) -> String {
        self.match_stage(raw)
            .unwrap_or(self.entry_stage.as_str())
            .to_string()
    }

    /// Configured stage matching `raw`, else the hand-off stage.
    pub fn resolve_target_stage(&self, raw: Option<&str>) -> String {
        self.match_stage(raw)
            .unwrap_or(self.handoff_stage.as_str())
            .to_string()
    }

    fn match_stage(&self, raw: Option<&str>) -> Option<&str> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        self.stages
            .iter()
            .find(|s| s.eq_ignore_ascii_case(raw))
            .map(String::as_str)
    }

    pub fn is_entry(&self, stage: &str) -> bool {
        stage == self.entry_stage
    }

    /// Entry stage ranks by priority class; stages fed by transfer are FIFO.
    pub fn order_for(&self, stage: &str) -> QueueOrder {
        if self.is_entry(stage) {
            QueueOrder::PriorityThenArrival
        } else {
            QueueOrder::Arrival
        }
    }

    /// Counters configured for `stage` (empty when none).
    pub fn counters_for(&self, stage: &str) -> &[String] {
        self.counters.get(stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stage whose recall channel is reported as the downstream channel when
    /// viewing `stage`.
    pub fn downstream_recall_stage<'a>(&'a self, stage: &'a str) -> &'a str {
        if self.is_entry(stage) {
            &self.handoff_stage
        } else {
            stage
        }
    }
}

impl From<&TokenqConfig> for EngineSettings {
    fn from(config: &TokenqConfig) -> Self {
        Self {
            default_dept: config.queue.default_dept.clone(),
            entry_stage: config.queue.entry_stage.clone(),
            handoff_stage: config.queue.handoff_stage.clone(),
            stages: config.queue.stages.clone(),
            counters: config.queue.counters.clone(),
            starts: TokenStarts {
                appointment: config.tokens.appointment_start,
                walkin: config.tokens.walkin_start,
                lab: config.tokens.lab_start,
            },
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&TokenqConfig::default())
    }
}
