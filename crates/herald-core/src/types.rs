use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Category of a delivery target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Main,
    Regional,
    Social,
    Webhook,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Regional => write!(f, "regional"),
            Self::Social => write!(f, "social"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

/// A configured external delivery target. Identity is the `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    pub kind: EndpointKind,
    #[serde(default)]
    pub auth_required: bool,
}

impl Endpoint {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        kind: EndpointKind,
        auth_required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind,
            auth_required,
        }
    }
}

/// Classification of a single delivery attempt.
///
/// Only `Delivered` counts as a success; the others are failures kept
/// distinct for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Delivered,
    Rejected,
    TimedOut,
    Unreachable,
    InternalError,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::Rejected => write!(f, "rejected"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Result of one (endpoint, record) attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub endpoint: String,
    pub kind: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DispatchOutcome {
    fn bare(endpoint: &str, kind: OutcomeKind) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            kind,
            http_status: None,
            elapsed_seconds: None,
            detail: None,
        }
    }

    pub fn delivered(endpoint: &str, status: u16, elapsed: Duration) -> Self {
        Self {
            http_status: Some(status),
            elapsed_seconds: Some(elapsed.as_secs_f64()),
            ..Self::bare(endpoint, OutcomeKind::Delivered)
        }
    }

    pub fn rejected(endpoint: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            http_status: Some(status),
            detail: Some(detail.into()),
            ..Self::bare(endpoint, OutcomeKind::Rejected)
        }
    }

    pub fn timed_out(endpoint: &str, timeout: Duration) -> Self {
        Self {
            detail: Some(format!("no response within {:.1}s", timeout.as_secs_f64())),
            ..Self::bare(endpoint, OutcomeKind::TimedOut)
        }
    }

    pub fn unreachable(endpoint: &str, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::bare(endpoint, OutcomeKind::Unreachable)
        }
    }

    pub fn internal_error(endpoint: &str, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::bare(endpoint, OutcomeKind::InternalError)
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.kind == OutcomeKind::Delivered
    }
}

/// The three campaign shapes that share the dispatch machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    Progress,
    Invitation,
    Lead,
}

impl CampaignKind {
    /// Prefix used for campaign identifiers of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Progress => "broadcast",
            Self::Invitation => "invitation",
            Self::Lead => "campaign",
        }
    }

    /// Fresh campaign identifier: kind prefix plus a UUIDv7, so ids sort by
    /// creation time and never collide within the same second.
    pub fn new_campaign_id(&self) -> String {
        format!("{}_{}", self.id_prefix(), Uuid::now_v7().simple())
    }
}

impl fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress => write!(f, "progress"),
            Self::Invitation => write!(f, "invitation"),
            Self::Lead => write!(f, "lead"),
        }
    }
}

/// Campaign-level aggregate of every endpoint outcome.
///
/// `delivered + failed == endpoints_tried` and
/// `success_rate == delivered / endpoints_tried` hold for every value built
/// by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResult {
    pub campaign_id: String,
    pub campaign_kind: CampaignKind,
    /// Project or campaign name the caller supplied.
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub endpoints_tried: usize,
    pub delivered: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub outcomes: Vec<DispatchOutcome>,
    /// Campaign-specific summary fields (project, progress, agents, …).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_follow_up: Option<DateTime<Utc>>,
}

impl CampaignResult {
    /// Outcomes that were not delivered, in registry order.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_delivered())
    }

    pub fn count_of(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }
}
