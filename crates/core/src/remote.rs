//! Thin client for the remote filter API.
//!
//! Server-side filters are opaque: the client uploads a photo to
//! `{base}/api/{filter}` as multipart form data and gets JPEG bytes back.
//! Transient failures (408/429/5xx, connect/timeout errors) are retried a
//! few times with linear backoff; everything else surfaces immediately.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_ATTEMPTS: usize = 3;
const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug)]
pub struct FilterClient {
    base_url: Url,
}

impl FilterClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(Self { base_url: parsed }),
            scheme => Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{scheme}' (expected http/https)"),
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, filter: &str) -> String {
        format!(
            "{}/api/{filter}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Upload `image` and return the filtered JPEG bytes.
    pub fn apply_filter(&self, image: &[u8], filter: &str) -> Result<Vec<u8>> {
        let failed = |reason: String| Error::RemoteFilter {
            filter: filter.to_string(),
            reason,
        };

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| failed(format!("failed to build HTTP client: {e}")))?;

        let endpoint = self.endpoint(filter);

        for attempt in 1..=MAX_ATTEMPTS {
            let part = Part::bytes(image.to_vec())
                .file_name("photo.jpg")
                .mime_str("image/jpeg")
                .map_err(|e| failed(format!("failed to build upload form: {e}")))?;
            let form = Form::new().part("file", part);

            match client.post(&endpoint).multipart(form).send() {
                Ok(response) if response.status().is_success() => {
                    return response
                        .bytes()
                        .map(|b| b.to_vec())
                        .map_err(|e| failed(format!("failed reading response body: {e}")));
                }
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < MAX_ATTEMPTS {
                        debug!(%endpoint, attempt, status = status.as_u16(), "Filter request failed; retrying");
                        backoff(attempt);
                        continue;
                    }
                    return Err(failed(format!("server returned HTTP {}", status.as_u16())));
                }
                Err(e) => {
                    if is_retryable_error(&e) && attempt < MAX_ATTEMPTS {
                        debug!(%endpoint, attempt, error = %e, "Filter request failed; retrying");
                        backoff(attempt);
                        continue;
                    }
                    return Err(failed(format!("request failed: {e}")));
                }
            }
        }

        Err(failed(format!(
            "request failed after {MAX_ATTEMPTS} attempts"
        )))
    }
}

fn backoff(attempt: usize) {
    let backoff_ms = RETRY_BACKOFF_MS.saturating_mul(attempt as u64);
    std::thread::sleep(Duration::from_millis(backoff_ms));
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}
