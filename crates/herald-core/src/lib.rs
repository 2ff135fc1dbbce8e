//! `herald-core`: shared types, configuration and the endpoint registry.
//!
//! Everything here is plain data: no network or filesystem access beyond
//! reading the config file at startup.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{CampaignContext, ContactTemplates, HeraldConfig};
pub use error::{HeraldError, Result};
pub use registry::EndpointRegistry;
pub use types::{CampaignKind, CampaignResult, DispatchOutcome, Endpoint, EndpointKind, OutcomeKind};
