use chrono::{DateTime, SecondsFormat, Utc};
use herald_core::config::CampaignContext;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::payload::Payload;

/// The JSON object delivered to every endpoint of a campaign.
///
/// Keys are kept in sorted order, so [`to_bytes`](Self::to_bytes) is a
/// canonical encoding: the same record always produces the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutboundRecord {
    fields: Map<String, Value>,
}

impl OutboundRecord {
    /// Payload fields plus the fixed context shared by every record of the kind.
    pub fn build<P: Payload>(payload: &P, context: &CampaignContext, now: DateTime<Utc>) -> Self {
        let mut fields = payload.fields(context);
        fields.insert(
            "timestamp".into(),
            json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("call_to_action".into(), json!(context.call_to_action));
        fields.insert("hashtags".into(), json!(context.tags));
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.fields)
    }
}
