//! Shared HTTP plumbing for the cloud REST APIs.
//!
//! Every service client in this crate wraps a [`ForgeApi`], which owns
//! the [`reqwest::Client`], the base URL, the bearer token and the retry
//! policy.

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use takeoff_core::error::CoreError;

use crate::retry::{is_retryable_error, is_retryable_status, jittered_delay, RetryConfig};

/// Errors from the cloud REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ForgeApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Forge API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A request argument could not be turned into a valid call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading a local package failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ForgeApiError> for CoreError {
    fn from(err: ForgeApiError) -> Self {
        CoreError::Transport(err.to_string())
    }
}

/// Authenticated client for one cloud API host.
#[derive(Clone)]
pub struct ForgeApi {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    retry: RetryConfig,
}

impl ForgeApi {
    /// Create a client for `base_url` (e.g. `https://developer.api.autodesk.com`).
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        retry: RetryConfig,
    ) -> Result<Self, ForgeApiError> {
        let client = reqwest::Client::builder()
            .timeout(retry.request_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url, access_token, retry))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Absolute URL for an API path starting with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- typed helpers ----

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ForgeApiError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Self::parse_response(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ForgeApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::parse_response(response).await
    }

    /// POST and discard whatever body comes back.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), ForgeApiError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::check_status(response).await
    }

    /// PATCH and discard whatever body comes back.
    pub async fn patch_unit<B>(&self, path: &str, body: &B) -> Result<(), ForgeApiError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::PATCH, path, Some(body)).await?;
        Self::check_status(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ForgeApiError> {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        Self::check_status(response).await
    }

    /// POST a multipart form to an absolute, pre-signed `url`.
    ///
    /// Sent once without the bearer token: the form carries its own
    /// credentials and a streamed body cannot be replayed.
    pub async fn upload_form(&self, url: &str, form: Form) -> Result<(), ForgeApiError> {
        tracing::debug!(%url, "Uploading multipart form");
        let response = self.client.post(url).multipart(form).send().await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Send with the bearer token, retrying per [`RetryConfig`].
    ///
    /// Returns the last response once it is final or retries run out;
    /// status checking is left to the caller.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response, ForgeApiError>
    where
        B: Serialize + ?Sized,
    {
        let idempotent = method != Method::POST;
        let url = self.url(path);
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let mut retry = 0u32;
        loop {
            let attempt = Self::clone_builder(&builder)?;
            tracing::debug!(%method, %url, retry, "Sending Forge request");

            match attempt.send().await {
                Ok(response)
                    if retry < self.retry.max_retries
                        && is_retryable_status(response.status(), idempotent) =>
                {
                    tracing::warn!(%method, %url, status = %response.status(), retry, "Retryable Forge response");
                }
                Ok(response) => return Ok(response),
                Err(e) if retry < self.retry.max_retries && is_retryable_error(&e, idempotent) => {
                    tracing::warn!(%method, %url, error = %e, retry, "Forge request failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            retry += 1;
            self.sleep_before(retry).await;
        }
    }

    fn clone_builder(builder: &RequestBuilder) -> Result<RequestBuilder, ForgeApiError> {
        builder
            .try_clone()
            .ok_or_else(|| ForgeApiError::InvalidRequest("request body cannot be replayed".into()))
    }

    async fn sleep_before(&self, retry: u32) {
        let delay: Duration = jittered_delay(retry, &self.retry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ForgeApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: Response) -> Result<Response, ForgeApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ForgeApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ForgeApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: Response) -> Result<(), ForgeApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Paged list envelope used by the asset and cost services.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct Results<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}
