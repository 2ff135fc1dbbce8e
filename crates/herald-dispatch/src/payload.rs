//! Campaign payload shapes.
//!
//! Each payload knows its [`CampaignKind`], how to validate itself, which
//! wire fields it contributes to the outbound record, and which summary
//! fields are kept in history. Everything else about a campaign is shared.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use herald_core::config::CampaignContext;
use herald_core::types::{CampaignKind, CampaignResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Days until a lead campaign should be followed up.
pub const LEAD_FOLLOW_UP_DAYS: i64 = 7;

/// Record-building strategy for one campaign shape.
pub trait Payload: Send + Sync {
    const KIND: CampaignKind;

    /// Project or campaign name, used in logs and history.
    fn label(&self) -> &str;

    /// Reject unusable input before any endpoint is contacted.
    fn validate(&self) -> Result<(), String>;

    /// Kind-specific wire fields. `timestamp`, `call_to_action` and
    /// `hashtags` are added by [`OutboundRecord`](crate::record::OutboundRecord).
    fn fields(&self, context: &CampaignContext) -> Map<String, Value>;

    /// Summary kept on the [`CampaignResult`] in history.
    fn summary(&self) -> Value;

    /// Post-aggregation hook for kind-specific result fields.
    fn annotate(&self, _result: &mut CampaignResult) {}
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Progress broadcast for a project.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub project: String,
    pub message: String,
    /// 0–100.
    pub completion_percentage: f64,
    pub contributor: Option<String>,
}

/// Contributor credited when the caller does not name one.
pub const DEFAULT_CONTRIBUTOR: &str = "OpenClaw Team";

impl ProgressUpdate {
    pub fn new(
        project: impl Into<String>,
        message: impl Into<String>,
        completion_percentage: f64,
    ) -> Self {
        Self {
            project: project.into(),
            message: message.into(),
            completion_percentage,
            contributor: None,
        }
    }

    pub fn with_contributor(mut self, contributor: impl Into<String>) -> Self {
        self.contributor = Some(contributor.into());
        self
    }

    fn contributor(&self) -> &str {
        self.contributor.as_deref().unwrap_or(DEFAULT_CONTRIBUTOR)
    }
}

impl Payload for ProgressUpdate {
    const KIND: CampaignKind = CampaignKind::Progress;

    fn label(&self) -> &str {
        &self.project
    }

    fn validate(&self) -> Result<(), String> {
        require("project", &self.project)?;
        require("message", &self.message)?;
        let pct = self.completion_percentage;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(format!("completion percentage must be within 0..=100, got {pct}"));
        }
        Ok(())
    }

    fn fields(&self, context: &CampaignContext) -> Map<String, Value> {
        object(json!({
            "project_name": self.project,
            "progress_message": self.message,
            "completion_percentage": self.completion_percentage,
            "contributor": self.contributor(),
            "broadcast_type": "progress_update",
            "community_context": context.context,
        }))
    }

    fn summary(&self) -> Value {
        json!({
            "project": self.project,
            "progress": self.completion_percentage,
            "contributor": self.contributor(),
        })
    }
}

/// One agent inviting another to collaborate on a project.
#[derive(Debug, Clone)]
pub struct CollaborationInvitation {
    pub inviting_agent: String,
    pub target_agent: String,
    pub project: String,
    pub message: String,
}

impl Payload for CollaborationInvitation {
    const KIND: CampaignKind = CampaignKind::Invitation;

    fn label(&self) -> &str {
        &self.project
    }

    fn validate(&self) -> Result<(), String> {
        require("inviting agent", &self.inviting_agent)?;
        require("target agent", &self.target_agent)?;
        require("project", &self.project)?;
        require("message", &self.message)
    }

    fn fields(&self, context: &CampaignContext) -> Map<String, Value> {
        object(json!({
            "inviting_agent": self.inviting_agent,
            "target_agent": self.target_agent,
            "project_name": self.project,
            "invitation_message": self.message,
            "invitation_type": "collaboration",
            "community_context": context.context,
        }))
    }

    fn summary(&self) -> Value {
        json!({
            "invitingAgent": self.inviting_agent,
            "targetAgent": self.target_agent,
            "projectName": self.project,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(format!("unknown urgency: {other} (expected low, medium or high)")),
        }
    }
}

/// Lead-generation request pushed to every lead source.
#[derive(Debug, Clone)]
pub struct LeadRequest {
    pub campaign_name: String,
    pub lead_type: String,
    pub target_description: String,
    pub urgency: Urgency,
}

impl Payload for LeadRequest {
    const KIND: CampaignKind = CampaignKind::Lead;

    fn label(&self) -> &str {
        &self.campaign_name
    }

    fn validate(&self) -> Result<(), String> {
        require("campaign name", &self.campaign_name)?;
        require("lead type", &self.lead_type)?;
        require("target description", &self.target_description)
    }

    fn fields(&self, context: &CampaignContext) -> Map<String, Value> {
        let mut fields = object(json!({
            "campaign_name": self.campaign_name,
            "lead_type": self.lead_type,
            "target_description": self.target_description,
            "urgency_level": self.urgency,
            "audience_context": context.context,
        }));
        if let Some(source) = &context.source {
            fields.insert("lead_source".into(), json!(source));
        }
        if let Some(t) = &context.templates {
            fields.insert(
                "contact_details".into(),
                json!({
                    "email_template": t.email,
                    "message_template": t.message,
                    "follow_up_template": t.follow_up,
                }),
            );
        }
        fields
    }

    fn summary(&self) -> Value {
        json!({
            "campaignName": self.campaign_name,
            "leadType": self.lead_type,
            "urgency": self.urgency,
        })
    }

    fn annotate(&self, result: &mut CampaignResult) {
        result.next_follow_up = Some(result.created_at + Duration::days(LEAD_FOLLOW_UP_DAYS));
        if let Value::Object(meta) = &mut result.meta {
            meta.insert(
                "leadQualityEstimate".into(),
                json!(result.success_rate * 100.0),
            );
        }
    }
}
