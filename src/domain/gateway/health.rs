//! Backend health tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health state of a backend, derived from its recent error count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendHealth {
    #[default]
    Healthy,
    Degraded,
    Unavailable,
}

/// Consecutive-error thresholds that drive health demotion
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HealthThresholds {
    /// Consecutive errors before a backend is considered Degraded
    pub degraded_after: u32,
    /// Consecutive errors before a backend is considered Unavailable
    pub unavailable_after: u32,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            degraded_after: 3,
            unavailable_after: 8,
        }
    }
}

/// Running health record for one backend
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealthRecord {
    name: String,
    health: BackendHealth,
    /// Consecutive errors since the last success
    error_count: u32,
    /// Cumulative errors over the record's lifetime
    total_errors: u64,
    request_count: u64,
    /// Latency of the most recent probe or request, when measured
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_checked_at: Option<DateTime<Utc>>,
}

impl BackendHealthRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: BackendHealth::Healthy,
            error_count: 0,
            total_errors: 0,
            request_count: 0,
            latency_ms: None,
            last_checked_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn health(&self) -> BackendHealth {
        self.health
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    /// Record a failed request and recompute health from the thresholds
    pub fn record_error(&mut self, thresholds: &HealthThresholds) {
        self.request_count += 1;
        self.total_errors += 1;
        self.error_count = self.error_count.saturating_add(1);

        self.health = if self.error_count >= thresholds.unavailable_after {
            BackendHealth::Unavailable
        } else if self.error_count >= thresholds.degraded_after {
            BackendHealth::Degraded
        } else {
            BackendHealth::Healthy
        };
    }

    /// Record a successful request. Success resets the consecutive error
    /// count and restores the backend to Healthy.
    pub fn record_success(&mut self) {
        self.request_count += 1;
        self.error_count = 0;
        self.health = BackendHealth::Healthy;
    }

    /// Record a completed health probe
    pub fn mark_checked(&mut self, latency_ms: u64) {
        self.latency_ms = Some(latency_ms);
        self.last_checked_at = Some(Utc::now());
    }
}
