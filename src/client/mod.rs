//! Platform API client
//!
//! The platform ingress multiplexes several logical services behind one
//! base URL and routes on the Host header, so every request carries a host
//! chosen from its path. Failures come back as typed response objects with
//! a `success` discriminant; callers never see a transport error directly.

use reqwest::{Method, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Host header for portfolio-manager routes
pub const PORTFOLIO_HOST: &str = "portfolio-manager.folio-platform.local";
/// Host header for market-data routes
pub const MARKET_DATA_HOST: &str = "market-data.folio-platform.local";

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const TIMEOUT: Duration = Duration::from_secs(10);

/// Typed response envelope; check `success` before touching `data`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Pick the Host header for a request path.
///
/// The ingress knows the services by host name; everything unrecognized
/// falls through to the mock data API on localhost.
pub fn host_for(path: &str) -> &'static str {
    if path.contains("/api/v1/portfolios") {
        PORTFOLIO_HOST
    } else if path.contains("/quotes") {
        MARKET_DATA_HOST
    } else {
        "localhost"
    }
}

/// Server errors are worth retrying, client errors never are
fn retryable(status: StatusCode) -> bool {
    status.is_server_error()
}

/// HTTP client for the platform services
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client against a base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> crate::Result<Self> {
        let http = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResponse<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResponse<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// Issue a request with bounded retry.
    ///
    /// Network failures and 5xx responses retry up to [`MAX_RETRIES`] times
    /// with exponential backoff; 4xx responses fail immediately.
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResponse<T> {
        let url = format!("{}{}", self.base_url, path);
        let host = host_for(path);
        let mut last_error = String::new();

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tracing::debug!("Retrying {} {} (attempt {})", method, url, attempt + 1);
                tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
            }

            let mut req = self
                .http
                .request(method.clone(), &url)
                .header(header::HOST, host);
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return match response.json::<T>().await {
                            Ok(data) => ApiResponse::ok(data),
                            Err(e) => ApiResponse::fail(format!("Invalid response body: {}", e)),
                        };
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| status.to_string());
                    if !retryable(status) {
                        return ApiResponse::fail(format!("{}: {}", status, message));
                    }
                    last_error = format!("{}: {}", status, message);
                }
                Err(e) => {
                    last_error = format!("Unable to connect to the server: {}", e);
                }
            }
        }

        ApiResponse::fail(last_error)
    }
}
