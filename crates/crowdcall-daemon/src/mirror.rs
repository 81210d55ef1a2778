//! Best-effort secondary-ledger mirror.
//!
//! Lifecycle events can be mirrored to an external ledger endpoint. The
//! mirror is strictly fire-and-forget: it runs on a detached task, failures
//! are logged and swallowed, and the primary outcome is never affected.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

/// An event worth mirroring to the secondary ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MirrorEvent {
    PredictionCreated {
        prediction_id: String,
        creator_id: String,
        question: String,
        end_date: i64,
    },
    VoteCast {
        vote_id: String,
        prediction_id: String,
        user_id: String,
        choice: String,
    },
    PredictionResolved {
        prediction_id: String,
        result: String,
        rewarded_voters: usize,
    },
}

/// Sink for mirrored lifecycle events.
pub trait LedgerMirror: Send + Sync + 'static {
    /// Record an event. Must not block and must not surface errors.
    fn record(&self, event: MirrorEvent);
}

/// Mirror that drops every event, used when no endpoint is configured.
pub struct NoopMirror;

impl LedgerMirror for NoopMirror {
    fn record(&self, _event: MirrorEvent) {}
}

/// Mirror that POSTs each event as JSON to a configured HTTP endpoint.
pub struct HttpMirror {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMirror {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl LedgerMirror for HttpMirror {
    fn record(&self, event: MirrorEvent) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            match client.post(&endpoint).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(endpoint = %endpoint, "Mirrored ledger event");
                }
                Ok(response) => {
                    warn!(
                        endpoint = %endpoint,
                        status = %response.status(),
                        "Ledger mirror rejected event"
                    );
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Ledger mirror unreachable");
                }
            }
        });
    }
}

/// Build a mirror from the optional configured endpoint.
pub fn from_endpoint(endpoint: Option<String>) -> Arc<dyn LedgerMirror> {
    match endpoint {
        Some(url) => Arc::new(HttpMirror::new(url)),
        None => Arc::new(NoopMirror),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let event = MirrorEvent::VoteCast {
            vote_id: "v1".into(),
            prediction_id: "p1".into(),
            user_id: "u1".into(),
            choice: "yes".into(),
        };
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["event"], "vote_cast");
        assert_eq!(json["choice"], "yes");
    }

    #[test]
    fn noop_mirror_accepts_events() {
        NoopMirror.record(MirrorEvent::PredictionResolved {
            prediction_id: "p1".into(),
            result: "no".into(),
            rewarded_voters: 0,
        });
    }
}
