//! Plain-text rendering of campaign runs, history and registries.

use herald_core::types::{CampaignResult, DispatchOutcome};
use herald_core::EndpointRegistry;
use herald_dispatch::CampaignRun;
use herald_history::{HistoryBucket, HistoryState};

/// `0.75` → `"75%"`.
pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

fn outcome_suffix(outcome: &DispatchOutcome) -> String {
    let mut parts = Vec::new();
    if let Some(status) = outcome.http_status {
        parts.push(format!("HTTP {status}"));
    }
    if let Some(secs) = outcome.elapsed_seconds {
        parts.push(format!("{secs:.2}s"));
    }
    if let Some(detail) = &outcome.detail {
        parts.push(detail.replace('\n', " "));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn headline(result: &CampaignResult) -> String {
    format!(
        "{} {} \"{}\": {}/{} delivered ({})\n",
        result.campaign_kind,
        result.campaign_id,
        result.label,
        result.delivered,
        result.endpoints_tried,
        percent(result.success_rate)
    )
}

pub fn render_run(run: &CampaignRun, store: &str) -> String {
    let result = &run.result;
    let mut out = headline(result);
    for outcome in &result.outcomes {
        out.push_str(&format!(
            "  {:<14} {}{}\n",
            outcome.kind.to_string(),
            outcome.endpoint,
            outcome_suffix(outcome)
        ));
    }
    if let Some(follow_up) = result.next_follow_up {
        out.push_str(&format!("  next follow-up: {}\n", follow_up.format("%Y-%m-%d %H:%M UTC")));
    }
    match &run.persisted {
        Ok(()) => out.push_str(&format!("history saved to {store}\n")),
        Err(e) => out.push_str(&format!("warning: history not saved ({e})\n")),
    }
    out
}

pub fn render_history(state: &HistoryState, buckets: &[HistoryBucket]) -> String {
    let mut out = String::new();
    for &bucket in buckets {
        let total = state.total(bucket);
        out.push_str(&format!("{bucket}: {total} campaign(s)"));
        if let Some(rate) = state.cumulative_success_rate(bucket) {
            out.push_str(&format!(", cumulative success {}", percent(rate)));
        }
        out.push('\n');
        if let Some(latest) = state.latest(bucket) {
            out.push_str(&format!(
                "  latest: {} on {}\n",
                headline(latest).trim_end(),
                latest.created_at.format("%Y-%m-%d %H:%M UTC")
            ));
        }
    }
    if let Some(updated) = state.last_updated {
        out.push_str(&format!("last updated {}\n", updated.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out
}

pub fn render_endpoints(registry: &EndpointRegistry) -> String {
    let mut out = format!("{} ({} endpoints)\n", registry.family(), registry.len());
    for endpoint in registry {
        let auth = if endpoint.auth_required { " [auth]" } else { "" };
        out.push_str(&format!(
            "  {:<9} {:<28} {}{}\n",
            endpoint.kind.to_string(),
            endpoint.name,
            endpoint.url,
            auth
        ));
    }
    out
}
