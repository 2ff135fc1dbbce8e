use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use herald_core::config::{
    ContextConfig, DispatchConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
};
use herald_core::types::{CampaignResult, DispatchOutcome};
use herald_core::EndpointRegistry;
use herald_history::{HistoryBucket, HistoryError, HistoryStore};
use tracing::{info, warn};

use crate::aggregate::{aggregate, CampaignMeta};
use crate::dispatcher::Dispatch;
use crate::error::{CampaignError, Result};
use crate::payload::Payload;
use crate::record::OutboundRecord;

/// What a finished campaign hands back to the caller.
///
/// The result is always present once dispatch ran; `persisted` reports
/// separately whether it also made it into history.
#[derive(Debug)]
pub struct CampaignRun {
    pub result: CampaignResult,
    pub persisted: std::result::Result<(), HistoryError>,
}

impl CampaignRun {
    pub fn success_rate(&self) -> f64 {
        self.result.success_rate
    }
}

/// Fan-out orchestrator, generic over the delivery strategy.
///
/// One `Campaign` serves every payload shape: `run` builds the record from
/// the payload, dispatches to each registry endpoint with bounded
/// parallelism, waits for all of them, aggregates, and records the result.
pub struct Campaign<D> {
    registry: EndpointRegistry,
    dispatcher: D,
    store: Arc<dyn HistoryStore>,
    context: ContextConfig,
    timeout: Duration,
    max_concurrency: usize,
}

impl<D: Dispatch> Campaign<D> {
    pub fn new(registry: EndpointRegistry, dispatcher: D, store: Arc<dyn HistoryStore>) -> Self {
        Self {
            registry,
            dispatcher,
            store,
            context: ContextConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_context(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clamped to at least 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Apply timeout and concurrency from `[dispatch]` config.
    pub fn with_dispatch_config(self, config: &DispatchConfig) -> Self {
        self.with_timeout(config.timeout())
            .with_max_concurrency(config.max_concurrency)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Run one campaign end to end.
    ///
    /// Fails only when the payload is invalid (before any dispatch). Endpoint
    /// failures are folded into the result; a history write failure is logged
    /// and reported through [`CampaignRun::persisted`].
    pub async fn run<P: Payload>(&self, payload: &P) -> Result<CampaignRun> {
        payload.validate().map_err(CampaignError::InvalidPayload)?;

        let now = Utc::now();
        let record = OutboundRecord::build(payload, self.context.for_kind(P::KIND), now);
        let meta = CampaignMeta::new(P::KIND, payload.label(), now).with_summary(payload.summary());

        info!(
            campaign = %meta.campaign_id,
            kind = %P::KIND,
            label = %meta.label,
            endpoints = self.registry.len(),
            "campaign started"
        );

        let outcomes = self.fan_out(&record).await;
        let mut result = aggregate(meta, outcomes)?;
        payload.annotate(&mut result);

        info!(
            campaign = %result.campaign_id,
            delivered = result.delivered,
            failed = result.failed,
            success_rate = result.success_rate,
            "campaign finished"
        );

        let persisted = self
            .store
            .record(&result, HistoryBucket::from(P::KIND))
            .map(|_| ());
        if let Err(e) = &persisted {
            warn!(
                campaign = %result.campaign_id,
                store = %self.store.describe(),
                error = %e,
                "failed to persist campaign history"
            );
        }

        Ok(CampaignRun { result, persisted })
    }

    /// Dispatch to every endpoint, at most `max_concurrency` at a time.
    ///
    /// Outcomes come back in registry order regardless of completion order.
    async fn fan_out(&self, record: &OutboundRecord) -> Vec<DispatchOutcome> {
        let dispatcher = &self.dispatcher;
        let timeout = self.timeout;

        stream::iter(self.registry.iter())
            .map(|endpoint| async move {
                let outcome = match tokio::time::timeout(
                    timeout,
                    dispatcher.dispatch(endpoint, record, timeout),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => DispatchOutcome::timed_out(&endpoint.name, timeout),
                };
                log_outcome(&outcome);
                outcome
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}

fn log_outcome(outcome: &DispatchOutcome) {
    if outcome.is_delivered() {
        info!(
            endpoint = %outcome.endpoint,
            elapsed_secs = outcome.elapsed_seconds.unwrap_or_default(),
            "delivered"
        );
    } else {
        warn!(
            endpoint = %outcome.endpoint,
            kind = %outcome.kind,
            status = outcome.http_status,
            detail = outcome.detail.as_deref().unwrap_or(""),
            "delivery failed"
        );
    }
}
