//! `herald-dispatch`: fan-out delivery of one record to many endpoints.
//!
//! # Flow
//!
//! ```text
//! Payload ─► OutboundRecord ─► Dispatch × N (bounded, ordered) ─► aggregate ─► HistoryStore
//! ```
//!
//! | Payload                   | History bucket | Id prefix     |
//! |---------------------------|----------------|---------------|
//! | `ProgressUpdate`          | broadcasts     | `broadcast_`  |
//! | `CollaborationInvitation` | invitations    | `invitation_` |
//! | `LeadRequest`             | leads          | `campaign_`   |

pub mod aggregate;
pub mod campaign;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod record;

pub use aggregate::{aggregate, CampaignMeta};
pub use campaign::{Campaign, CampaignRun};
pub use dispatcher::{classify, Attempt, Dispatch, HttpDispatcher};
pub use error::{CampaignError, Result};
pub use payload::{CollaborationInvitation, LeadRequest, Payload, ProgressUpdate, Urgency};
pub use record::OutboundRecord;
