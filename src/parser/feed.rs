use log::{info, warn};
use reqwest::header::ACCEPT;

use crate::error::ImportError;

/// Calendar apps publish feeds as `webcal://`; the transport is plain HTTPS
pub fn normalize_feed_url(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Fetches the raw text of an ICS feed.
///
/// One attempt, no retry. Transport failures and non-success statuses both
/// come back as `ImportError::Fetch`.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String, ImportError> {
    let url = normalize_feed_url(url);
    info!("Fetching calendar feed {}", url);

    let response = client
        .get(&url)
        .header(ACCEPT, "text/calendar, text/plain;q=0.9, */*;q=0.5")
        .send()
        .await
        .map_err(|e| {
            warn!("Calendar feed request failed: {}", e);
            ImportError::Fetch {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Calendar feed returned {}", status);
        return Err(ImportError::Fetch {
            status: Some(status.as_u16()),
            message: status.canonical_reason().unwrap_or("request failed").to_string(),
        });
    }

    response.text().await.map_err(|e| ImportError::Fetch {
        status: Some(status.as_u16()),
        message: e.to_string(),
    })
}
