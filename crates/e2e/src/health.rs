//! Readiness probe for the Niffler frontend

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

const PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Wait until `url` answers with a success or redirect status
pub async fn wait_for_frontend(url: &str, timeout: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => {
                info!("Frontend is up at {} ({})", url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Frontend probe returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for frontend at {}...", url);
                }
                if !e.is_connect() {
                    warn!("Frontend probe error: {}", e);
                }
            }
        }

        if start.elapsed() >= timeout {
            break;
        }
        sleep(PROBE_INTERVAL).await;
    }

    Err(E2eError::FrontendUnavailable(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_frontend_reports_attempts() {
        // Port 9 (discard) is not served on loopback in test environments
        let err = wait_for_frontend("http://127.0.0.1:9/", Duration::from_millis(600))
            .await
            .unwrap_err();
        match err {
            E2eError::FrontendUnavailable(attempts) => assert!(attempts >= 1),
            other => panic!("expected FrontendUnavailable, got {:?}", other),
        }
    }
}
