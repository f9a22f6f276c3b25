mod client;
mod error;
mod prompt;

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

pub use client::{GeminiClient, RecommendationSource};
pub use error::{RecommendationError, RecommendationErrorKind};
pub use prompt::{image_prompt, recommendation_prompt, recommendation_schema};

/// Build the outbound HTTP client. System proxy discovery can panic on
/// some platforms, so the build is attempted behind a catch and retried
/// with discovery disabled.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, String> {
    // Tests never need a proxy; the env var is an escape hatch for
    // runtimes where discovery itself misbehaves.
    if cfg!(test)
        || matches!(
            std::env::var("SCENTHOOD_DISABLE_SYSTEM_PROXY_DISCOVERY").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        )
    {
        return Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e));
    }

    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        Client::builder().timeout(timeout).build()
    })) {
        Ok(Ok(client)) => return Ok(client),
        Ok(Err(e)) => {
            warn!(error = %e, "HTTP client build failed; retrying without proxy discovery");
        }
        Err(_) => {
            warn!("HTTP client build panicked in proxy discovery; retrying without it");
        }
    }

    Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}
