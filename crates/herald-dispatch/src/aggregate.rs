use chrono::{DateTime, Utc};
use herald_core::types::{CampaignKind, CampaignResult, DispatchOutcome};
use herald_core::HeraldError;
use serde_json::Value;

use crate::error::Result;

/// Identity and descriptive fields of a campaign, fixed before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignMeta {
    pub campaign_id: String,
    pub kind: CampaignKind,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub summary: Value,
}

impl CampaignMeta {
    pub fn new(kind: CampaignKind, label: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            campaign_id: kind.new_campaign_id(),
            kind,
            label: label.into(),
            created_at,
            summary: Value::Null,
        }
    }

    pub fn with_summary(mut self, summary: Value) -> Self {
        self.summary = summary;
        self
    }
}

/// Fold per-endpoint outcomes into a campaign result.
///
/// Pure: no I/O, no clock. `success_rate` is left unrounded. An empty
/// outcome list means the registry was empty, which is a configuration
/// error rather than a zero-division case.
pub fn aggregate(meta: CampaignMeta, outcomes: Vec<DispatchOutcome>) -> Result<CampaignResult> {
    let endpoints_tried = outcomes.len();
    if endpoints_tried == 0 {
        return Err(HeraldError::Config(format!(
            "campaign {} has no endpoints to aggregate",
            meta.campaign_id
        ))
        .into());
    }

    let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();

    Ok(CampaignResult {
        campaign_id: meta.campaign_id,
        campaign_kind: meta.kind,
        label: meta.label,
        created_at: meta.created_at,
        endpoints_tried,
        delivered,
        failed: endpoints_tried - delivered,
        success_rate: delivered as f64 / endpoints_tried as f64,
        outcomes,
        meta: meta.summary,
        next_follow_up: None,
    })
}
