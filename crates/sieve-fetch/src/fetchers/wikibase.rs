//! Wikibase fetcher (MediaWiki Action API)
//!
//! Loads entities one at a time through `action=wbgetentities`. Calls block
//! the current thread, bounded by the configured connect and read timeouts.

use crate::config::WikibaseConfig;
use crate::fetcher::EntityFetcher;
use crate::wire::parse_entity_response;
use sieve_core::{EntityDocument, EntityId, Result, SieveError};
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
/// Replication lag (seconds) above which the API asks clients to back off
const MAXLAG_SECS: &str = "5";

/// Fetches entity documents from a Wikibase API endpoint
pub struct WikibaseFetcher {
    api_endpoint: String,
    user_agent: String,
    agent: ureq::Agent,
}

impl WikibaseFetcher {
    pub fn new(api_endpoint: &str, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            api_endpoint: api_endpoint.to_string(),
            user_agent: format!("sieve/{}", env!("CARGO_PKG_VERSION")),
            agent: build_agent(connect_timeout, read_timeout),
        }
    }

    /// Create a fetcher from the `[wikibase]` config section
    pub fn from_config(config: &WikibaseConfig) -> Self {
        Self {
            api_endpoint: config.api_endpoint.clone(),
            user_agent: config.user_agent.clone(),
            agent: build_agent(config.connect_timeout(), config.read_timeout()),
        }
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn request(&self, id: &EntityId) -> std::result::Result<serde_json::Value, ureq::Error> {
        self.agent
            .get(&self.api_endpoint)
            .query("action", "wbgetentities")
            .query("ids", id.as_str())
            .query("props", "claims")
            .query("format", "json")
            .query("maxlag", MAXLAG_SECS)
            .header("User-Agent", &self.user_agent)
            .call()?
            .body_mut()
            .read_json()
    }

    /// Fetch the raw response, retrying transport failures and `maxlag`
    /// refusals. A lagged response on the last attempt is returned as is and
    /// surfaces as a remote error when parsed.
    fn get_entity_json(&self, id: &EntityId) -> Result<serde_json::Value> {
        let mut attempt = 0;
        loop {
            let last = attempt + 1 >= MAX_ATTEMPTS;
            match self.request(id) {
                Ok(body) if !last && is_lagged(&body) => {
                    tracing::debug!(entity = %id, attempt, "Server lagged, backing off");
                }
                Ok(body) => return Ok(body),
                Err(e) if !last && is_transient(&e) => {
                    tracing::debug!(entity = %id, attempt, error = %e, "Retrying entity fetch");
                }
                Err(e) => {
                    return Err(SieveError::Remote(format!(
                        "Request for {} to {} failed: {}",
                        id, self.api_endpoint, e
                    )));
                }
            }
            std::thread::sleep(retry_delay(attempt));
            attempt += 1;
        }
    }
}

impl EntityFetcher for WikibaseFetcher {
    fn name(&self) -> &str {
        "wikibase"
    }

    fn fetch(&self, id: &EntityId) -> Result<EntityDocument> {
        let response = self.get_entity_json(id)?;
        parse_entity_response(&response, id)
    }
}

fn build_agent(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(connect_timeout))
        .timeout_recv_response(Some(read_timeout))
        .timeout_recv_body(Some(read_timeout))
        .build();
    config.into()
}

/// Failures worth another attempt: the network, or the server shedding load
fn is_transient(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => *code == 429 || (500..=599).contains(code),
        _ => false,
    }
}

/// Whether the API refused the request because replicas are lagging
fn is_lagged(body: &serde_json::Value) -> bool {
    body.pointer("/error/code").and_then(|c| c.as_str()) == Some("maxlag")
}

fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .saturating_mul(1 << attempt.min(16))
        .min(RETRY_MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = WikibaseConfig {
            api_endpoint: "https://wikibase.example.org/w/api.php".to_string(),
            ..Default::default()
        };
        let fetcher = WikibaseFetcher::from_config(&config);
        assert_eq!(fetcher.name(), "wikibase");
        assert_eq!(fetcher.api_endpoint(), "https://wikibase.example.org/w/api.php");
    }

    #[test]
    fn test_unreachable_endpoint_is_remote_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let fetcher = WikibaseFetcher::new(
            "http://127.0.0.1:9/w/api.php",
            Duration::from_millis(200),
            Duration::from_millis(200),
        );
        let err = fetcher.fetch(&EntityId::new("Q42")).unwrap_err();
        assert!(matches!(err, SieveError::Remote(_)));
    }

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient(&ureq::Error::StatusCode(503)));
        assert!(is_transient(&ureq::Error::StatusCode(429)));
        assert!(is_transient(&ureq::Error::StatusCode(520)));
        assert!(!is_transient(&ureq::Error::StatusCode(404)));
    }

    #[test]
    fn test_maxlag_response_is_lagged() {
        let lagged = serde_json::json!({
            "error": {"code": "maxlag", "info": "Waiting for 10.64.48.35: 6 seconds lagged", "lag": 6}
        });
        let missing = serde_json::json!({"error": {"code": "no-such-entity", "info": ""}});
        let ok = serde_json::json!({"entities": {}});

        assert!(is_lagged(&lagged));
        assert!(!is_lagged(&missing));
        assert!(!is_lagged(&ok));
    }

    #[test]
    fn test_retry_delay_doubles_up_to_cap() {
        assert_eq!(retry_delay(0), Duration::from_millis(500));
        assert_eq!(retry_delay(1), Duration::from_secs(1));
        assert_eq!(retry_delay(2), Duration::from_secs(2));
        assert_eq!(retry_delay(10), RETRY_MAX_DELAY);
    }
}
