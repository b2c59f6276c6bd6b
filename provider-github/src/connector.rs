//! GitHub contents API connector
//!
//! Implements the `VersionedBlobStore` trait for a single file in a
//! repository branch.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bridge_traits::blob::{BlobWrite, VersionedBlob, VersionedBlobStore};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use core_runtime::config::RemoteTarget;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{GitHubError, Result};
use crate::types::{ApiErrorBody, ContentFile, PutContentRequest, PutContentResponse};

/// Media type for the versioned REST API
const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Media type returning raw file bytes
const ACCEPT_RAW: &str = "application/vnd.github.raw";

const API_VERSION: &str = "2022-11-28";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub contents API connector
///
/// # Features
///
/// - Reads with retry and exponential backoff on 429 and 5xx
/// - Falls back to the raw download URL for files too large to inline
/// - Conditional writes keyed on the blob `sha` (never retried)
///
/// # Example
///
/// ```ignore
/// use provider_github::GitHubContentsConnector;
/// use core_runtime::config::RemoteTarget;
///
/// let connector = GitHubContentsConnector::new(http_client, RemoteTarget::new("octo", "albums"));
/// let blob = connector.fetch(Some(token)).await?;
/// ```
pub struct GitHubContentsConnector {
    http_client: Arc<dyn HttpClient>,
    target: RemoteTarget,
    retry: RetryPolicy,
}

impl GitHubContentsConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, target: RemoteTarget) -> Self {
        Self {
            http_client,
            target,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy used for reads.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    /// `{base}/repos/{owner}/{repo}/contents/{path}` with each path segment
    /// percent-encoded.
    fn contents_url(&self) -> String {
        let path = self
            .target
            .path
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.target.api_base_url,
            urlencoding::encode(&self.target.owner),
            urlencoding::encode(&self.target.repo),
            path
        )
    }

    fn request(&self, method: HttpMethod, url: String, credential: Option<&str>) -> HttpRequest {
        let request = HttpRequest::new(method, url)
            .header("Accept", ACCEPT_JSON)
            .header("X-GitHub-Api-Version", API_VERSION)
            .timeout(REQUEST_TIMEOUT);

        match credential {
            Some(token) => request.bearer_token(token),
            None => request,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        if !self.retry.use_exponential_backoff {
            return self.retry.base_delay;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry
            .base_delay
            .saturating_mul(factor)
            .min(self.retry.max_delay)
    }

    /// Execute a read with retry
    ///
    /// Retries transport failures, 429, and 5xx. Any other response is
    /// returned for the caller to interpret; the final response is returned
    /// once retries are exhausted.
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.http_client.execute(request.clone()).await {
                Ok(response) => {
                    let status = response.status;
                    let retryable = status == 429 || (500..600).contains(&status);

                    if !retryable || attempt >= max_attempts {
                        debug!(status, attempt, "API request completed");
                        return Ok(response);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                        attempt,
                        max_attempts,
                        status,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        warn!("API request failed after {} attempts: {}", max_attempts, e);
                        return Err(e.into());
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Map a non-success response onto a provider error.
    fn status_error(response: &HttpResponse) -> GitHubError {
        let message = serde_json::from_slice::<ApiErrorBody>(&response.body)
            .map(|body| body.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).into_owned());

        match response.status {
            401 => GitHubError::Unauthorized(message),
            403 if Self::rate_limit_exhausted(response) => GitHubError::RateLimited(message),
            403 => GitHubError::Unauthorized(message),
            409 | 422 => GitHubError::Conflict(message),
            429 => GitHubError::RateLimited(message),
            status => GitHubError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    fn rate_limit_exhausted(response: &HttpResponse) -> bool {
        response
            .header("x-ratelimit-remaining")
            .is_some_and(|remaining| remaining.trim() == "0")
    }

    fn decode_base64(content: &str) -> Result<Bytes> {
        let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64
            .decode(cleaned)
            .map(Bytes::from)
            .map_err(|e| GitHubError::ParseError(format!("Invalid base64 content: {}", e)))
    }

    /// GET the contents resource on the target branch. `None` when the file
    /// does not exist yet.
    async fn get_contents(&self, credential: Option<&str>) -> Result<Option<ContentFile>> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(),
            urlencoding::encode(&self.target.branch)
        );
        let response = self
            .execute_with_retry(self.request(HttpMethod::Get, url, credential))
            .await?;

        match response.status {
            200 => serde_json::from_slice(&response.body)
                .map(Some)
                .map_err(|e| GitHubError::ParseError(e.to_string())),
            404 => {
                debug!("Remote file does not exist yet");
                Ok(None)
            }
            _ => Err(Self::status_error(&response)),
        }
    }

    /// Read the file and its blob sha.
    #[instrument(skip(self, credential), fields(path = %self.target.path, branch = %self.target.branch))]
    pub async fn fetch_file(&self, credential: Option<&str>) -> Result<Option<VersionedBlob>> {
        let Some(file) = self.get_contents(credential).await? else {
            return Ok(None);
        };

        let inlined = file.encoding.as_deref().unwrap_or("base64") == "base64"
            && (!file.content.is_empty() || file.size == 0);

        let content = if inlined {
            Self::decode_base64(&file.content)?
        } else {
            self.download_raw(&file, credential).await?
        };

        info!(sha = %file.sha, bytes = content.len(), "Fetched remote file");
        Ok(Some(VersionedBlob {
            content,
            version: file.sha,
        }))
    }

    /// Current blob sha only. The content is neither decoded nor downloaded.
    #[instrument(skip(self, credential), fields(path = %self.target.path, branch = %self.target.branch))]
    pub async fn fetch_sha(&self, credential: Option<&str>) -> Result<Option<String>> {
        Ok(self.get_contents(credential).await?.map(|file| file.sha))
    }

    /// Download a file whose content was not inlined in the contents
    /// response.
    async fn download_raw(&self, file: &ContentFile, credential: Option<&str>) -> Result<Bytes> {
        let url = file.download_url.clone().ok_or_else(|| {
            GitHubError::ParseError("File content not inlined and no download URL".to_string())
        })?;

        debug!(size = file.size, "Downloading large file");
        let request = self
            .request(HttpMethod::Get, url, credential)
            .header("Accept", ACCEPT_RAW);
        let response = self.execute_with_retry(request).await?;

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(Self::status_error(&response))
        }
    }

    /// Commit new content, returning the new blob sha.
    #[instrument(skip(self, write, credential), fields(path = %self.target.path, bytes = write.content.len()))]
    pub async fn put_file(&self, write: BlobWrite, credential: &str) -> Result<String> {
        let body = PutContentRequest {
            message: &write.message,
            content: BASE64.encode(&write.content),
            sha: write.previous_version.as_deref(),
            branch: &self.target.branch,
        };

        let request = self
            .request(HttpMethod::Put, self.contents_url(), Some(credential))
            .json(&body)?;

        // Not retried: a repeated conditional write can only conflict.
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            let error = Self::status_error(&response);
            warn!(status = response.status, error = %error, "Remote write rejected");
            return Err(error);
        }

        let committed: PutContentResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;

        info!(sha = %committed.content.sha, "Committed remote file");
        Ok(committed.content.sha)
    }
}

#[async_trait]
impl VersionedBlobStore for GitHubContentsConnector {
    fn blob_name(&self) -> &str {
        &self.target.path
    }

    async fn fetch(
        &self,
        credential: Option<&str>,
    ) -> bridge_traits::error::Result<Option<VersionedBlob>> {
        self.fetch_file(credential).await.map_err(Into::into)
    }

    async fn fetch_version(
        &self,
        credential: Option<&str>,
    ) -> bridge_traits::error::Result<Option<String>> {
        self.fetch_sha(credential).await.map_err(Into::into)
    }

    async fn put(&self, write: BlobWrite, credential: &str) -> bridge_traits::error::Result<String> {
        self.put_file(write, credential).await.map_err(Into::into)
    }
}
