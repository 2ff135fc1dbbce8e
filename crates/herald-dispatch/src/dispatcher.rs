//! Single-endpoint delivery and outcome classification.
//!
//! [`classify`] is a pure function from an [`Attempt`] to a
//! [`DispatchOutcome`], so every classification branch is testable without
//! a network. [`HttpDispatcher`] is the only code that turns reqwest results
//! into `Attempt`s.

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use herald_core::config::DispatchConfig;
use herald_core::types::{DispatchOutcome, Endpoint};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::record::OutboundRecord;

/// Delivery strategy for one endpoint.
///
/// Implementations never fail: every problem is folded into the returned
/// outcome. The orchestrator additionally enforces `timeout` as a hard
/// cancellation boundary, so a hung implementation still yields `TimedOut`.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        record: &OutboundRecord,
        timeout: Duration,
    ) -> DispatchOutcome;
}

/// What happened on the wire, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// A response arrived (any status). `elapsed` is time to headers.
    Responded {
        status: u16,
        body: String,
        elapsed: Duration,
    },
    /// No response within the budget.
    TimedOut { after: Duration },
    /// Connection could not be established (DNS, refused, TLS handshake).
    ConnectFailed(String),
    /// Anything else: request building, encoding, mid-stream I/O.
    Failed(String),
}

impl Attempt {
    fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Attempt::TimedOut { after: timeout }
        } else if err.is_connect() {
            Attempt::ConnectFailed(error_chain(err))
        } else {
            Attempt::Failed(error_chain(err))
        }
    }
}

/// Map an attempt to its outcome. Only status 200 counts as delivered.
pub fn classify(endpoint: &str, attempt: Attempt, max_detail_chars: usize) -> DispatchOutcome {
    match attempt {
        Attempt::TimedOut { after } => DispatchOutcome::timed_out(endpoint, after),
        Attempt::ConnectFailed(detail) => DispatchOutcome::unreachable(endpoint, detail),
        Attempt::Responded {
            status: 200,
            elapsed,
            ..
        } => DispatchOutcome::delivered(endpoint, 200, elapsed),
        Attempt::Responded { status, body, .. } => {
            DispatchOutcome::rejected(endpoint, status, truncate_chars(&body, max_detail_chars))
        }
        Attempt::Failed(detail) => DispatchOutcome::internal_error(endpoint, detail),
    }
}

/// First `max` characters of `s`, split on char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// reqwest's top-level message is generic; append the source chain so
/// "connection refused" and friends make it into the outcome detail.
fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// POSTs records as JSON over HTTP(S).
pub struct HttpDispatcher {
    client: reqwest::Client,
    client_header: String,
    client_identity: String,
    auth_token: Option<String>,
    max_detail_chars: usize,
}

impl HttpDispatcher {
    pub fn new(config: &DispatchConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Use a pre-built client (custom TLS roots, proxies, test setups).
    pub fn with_client(client: reqwest::Client, config: &DispatchConfig) -> Self {
        Self {
            client,
            client_header: config.client_header.clone(),
            client_identity: config.client_identity.clone(),
            auth_token: config.auth_token.clone(),
            max_detail_chars: config.max_detail_chars,
        }
    }

    async fn attempt(&self, endpoint: &Endpoint, body: Vec<u8>, timeout: Duration) -> Attempt {
        let mut builder = self
            .client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .header(self.client_header.as_str(), self.client_identity.as_str())
            .body(body);

        if endpoint.auth_required {
            match &self.auth_token {
                Some(token) => builder = builder.bearer_auth(token),
                None => {
                    return Attempt::Failed(
                        "endpoint requires authorization but no auth_token is configured".into(),
                    )
                }
            }
        }

        let started = Instant::now();
        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => return Attempt::from_transport(&e, timeout),
        };
        let elapsed = started.elapsed();
        let status = resp.status().as_u16();

        // Delivered responses don't need their body read.
        let body = if status == 200 {
            String::new()
        } else {
            match resp.text().await {
                Ok(text) => text,
                Err(e) if e.is_timeout() => return Attempt::TimedOut { after: timeout },
                Err(_) => String::new(),
            }
        };

        Attempt::Responded {
            status,
            body,
            elapsed,
        }
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        record: &OutboundRecord,
        timeout: Duration,
    ) -> DispatchOutcome {
        let body = match record.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                return classify(
                    &endpoint.name,
                    Attempt::Failed(format!("record encoding failed: {e}")),
                    self.max_detail_chars,
                )
            }
        };

        debug!(
            endpoint = %endpoint.name,
            url = %endpoint.url,
            bytes = body.len(),
            "dispatching record"
        );

        let bounded = tokio::time::timeout(timeout, self.attempt(endpoint, body, timeout));
        let attempt = match bounded.await {
            Ok(attempt) => attempt,
            Err(_) => Attempt::TimedOut { after: timeout },
        };
        classify(&endpoint.name, attempt, self.max_detail_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::OutcomeKind;

    #[test]
    fn status_200_is_delivered_with_elapsed() {
        let outcome = classify(
            "main",
            Attempt::Responded {
                status: 200,
                body: String::new(),
                elapsed: Duration::from_millis(1500),
            },
            100,
        );
        assert_eq!(outcome.kind, OutcomeKind::Delivered);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.elapsed_seconds, Some(1.5));
        assert!(outcome.detail.is_none());
    }

    #[test]
    fn other_2xx_is_still_rejected() {
        let outcome = classify(
            "main",
            Attempt::Responded {
                status: 201,
                body: "created".into(),
                elapsed: Duration::ZERO,
            },
            100,
        );
        assert_eq!(outcome.kind, OutcomeKind::Rejected);
        assert_eq!(outcome.http_status, Some(201));
    }

    #[test]
    fn rejected_body_is_truncated() {
        let outcome = classify(
            "main",
            Attempt::Responded {
                status: 503,
                body: "x".repeat(500),
                elapsed: Duration::ZERO,
            },
            100,
        );
        assert_eq!(outcome.kind, OutcomeKind::Rejected);
        assert_eq!(outcome.http_status, Some(503));
        assert_eq!(outcome.detail.as_deref().map(str::len), Some(100));
        assert!(outcome.elapsed_seconds.is_none());
    }

    #[test]
    fn timeout_connect_and_other_failures_are_distinct() {
        let timed_out = classify("a", Attempt::TimedOut { after: Duration::from_secs(30) }, 100);
        let unreachable = classify("b", Attempt::ConnectFailed("connection refused".into()), 100);
        let internal = classify("c", Attempt::Failed("builder error".into()), 100);

        assert_eq!(timed_out.kind, OutcomeKind::TimedOut);
        assert_eq!(unreachable.kind, OutcomeKind::Unreachable);
        assert_eq!(unreachable.detail.as_deref(), Some("connection refused"));
        assert_eq!(internal.kind, OutcomeKind::InternalError);
        assert_eq!(internal.endpoint, "c");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
        // Each '€' is three bytes.
        assert_eq!(truncate_chars(&"€".repeat(10), 4), "€€€€");
    }
}
