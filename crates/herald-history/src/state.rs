use chrono::{DateTime, Utc};
use herald_core::types::{CampaignKind, CampaignResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which history list a campaign result is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryBucket {
    Broadcast,
    Invitation,
    Lead,
}

impl From<CampaignKind> for HistoryBucket {
    fn from(kind: CampaignKind) -> Self {
        match kind {
            CampaignKind::Progress => HistoryBucket::Broadcast,
            CampaignKind::Invitation => HistoryBucket::Invitation,
            CampaignKind::Lead => HistoryBucket::Lead,
        }
    }
}

impl fmt::Display for HistoryBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => write!(f, "broadcasts"),
            Self::Invitation => write!(f, "invitations"),
            Self::Lead => write!(f, "leads"),
        }
    }
}

/// On-disk aggregate of every campaign ever run against one history file.
///
/// `total_* == *_history.len()` after every [`merge`](Self::merge) and after
/// loading, even if a hand-edited file disagrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    #[serde(default)]
    pub broadcast_history: Vec<CampaignResult>,
    #[serde(default)]
    pub invitation_history: Vec<CampaignResult>,
    #[serde(default)]
    pub lead_history: Vec<CampaignResult>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_broadcasts: usize,
    #[serde(default)]
    pub total_invitations: usize,
    #[serde(default)]
    pub total_leads: usize,
}

impl HistoryState {
    /// Append `result` to the list for `bucket` and recompute counters.
    pub fn merge(mut self, result: CampaignResult, bucket: HistoryBucket) -> Self {
        self.list_mut(bucket).push(result);
        self.recount();
        self.last_updated = Some(Utc::now());
        self
    }

    /// Re-derive the totals from list lengths.
    pub fn recount(&mut self) {
        self.total_broadcasts = self.broadcast_history.len();
        self.total_invitations = self.invitation_history.len();
        self.total_leads = self.lead_history.len();
    }

    pub fn list(&self, bucket: HistoryBucket) -> &[CampaignResult] {
        match bucket {
            HistoryBucket::Broadcast => &self.broadcast_history,
            HistoryBucket::Invitation => &self.invitation_history,
            HistoryBucket::Lead => &self.lead_history,
        }
    }

    fn list_mut(&mut self, bucket: HistoryBucket) -> &mut Vec<CampaignResult> {
        match bucket {
            HistoryBucket::Broadcast => &mut self.broadcast_history,
            HistoryBucket::Invitation => &mut self.invitation_history,
            HistoryBucket::Lead => &mut self.lead_history,
        }
    }

    pub fn total(&self, bucket: HistoryBucket) -> usize {
        match bucket {
            HistoryBucket::Broadcast => self.total_broadcasts,
            HistoryBucket::Invitation => self.total_invitations,
            HistoryBucket::Lead => self.total_leads,
        }
    }

    pub fn latest(&self, bucket: HistoryBucket) -> Option<&CampaignResult> {
        self.list(bucket).last()
    }

    /// Delivered / tried across every campaign in `bucket`.
    ///
    /// `None` when the bucket is empty.
    pub fn cumulative_success_rate(&self, bucket: HistoryBucket) -> Option<f64> {
        let (delivered, tried) = self
            .list(bucket)
            .iter()
            .fold((0usize, 0usize), |(d, t), r| (d + r.delivered, t + r.endpoints_tried));
        if tried == 0 {
            return None;
        }
        Some(delivered as f64 / tried as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.broadcast_history.is_empty()
            && self.invitation_history.is_empty()
            && self.lead_history.is_empty()
    }
}
