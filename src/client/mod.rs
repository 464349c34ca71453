//! HTTP client bound to one endpoint group of the remote service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{BackupError, Result};
use crate::version::VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Alerts,
    Synthetics,
    LabelSynthetics,
    Insights,
    Infrastructure,
    GraphQl,
}

impl Endpoint {
    fn base_url(self, config: &AppConfig) -> &str {
        let endpoints = &config.endpoints;
        match self {
            Endpoint::Alerts => &endpoints.alerts,
            Endpoint::Synthetics => &endpoints.synthetics,
            Endpoint::LabelSynthetics => &endpoints.label_synthetics,
            Endpoint::Insights => &endpoints.insights,
            Endpoint::Infrastructure => &endpoints.infrastructure,
            Endpoint::GraphQl => &endpoints.graphql,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Sent verbatim. The label endpoint takes a bare `category:name`.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Last path segment of the `Location` header, where the monitor API
    /// reports the id of a created monitor.
    pub fn location_id(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(|l| l.trim_end_matches('/'))
            .and_then(|l| l.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    endpoint: Endpoint,
    retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    pub fn new(config: &AppConfig, endpoint: Endpoint) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|e| {
            BackupError::ClientConstruction(format!("Invalid API key header value: {e}"))
        })?;
        headers.insert("x-api-key", api_key);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(proxy_auth) = &config.proxy_auth {
            let encoded = format!("Basic {}", STANDARD.encode(proxy_auth.as_bytes()));
            let value = HeaderValue::from_str(&encoded).map_err(|e| {
                BackupError::ClientConstruction(format!("Invalid proxy auth value: {e}"))
            })?;
            headers.insert(header::PROXY_AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(format!("nrbackup/{VERSION}"))
            .timeout(config.request_timeout);
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                BackupError::ClientConstruction(format!("Invalid proxy '{proxy}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| BackupError::ClientConstruction(e.to_string()))?;

        Ok(Self {
            http,
            base_url: endpoint.base_url(config).to_string(),
            endpoint,
            retries: config.retries.max(1),
            retry_backoff: config.retry_backoff,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one logical request. Transport errors and non-2xx answers are
    /// retried with a fixed backoff; the last non-2xx answer is returned as is
    /// so callers can record and classify it.
    pub async fn send(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> Result<ApiResponse> {
        self.send_with_headers(operation, method, path, query, &[], body)
            .await
    }

    /// [`ApiClient::send`] with extra headers on top of the client defaults.
    pub async fn send_with_headers(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
        body: RequestBody,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        let mut attempt = 1;
        loop {
            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            for (name, value) in headers {
                request = request.header(*name, value.as_str());
            }
            request = match &body {
                RequestBody::Empty => request,
                RequestBody::Json(value) => request.json(value),
                RequestBody::Raw(text) => request.body(text.clone()),
            };

            debug!(operation, %method, %url, attempt, "Sending request.");
            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let location = response
                        .headers()
                        .get(header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let text = response.text().await.map_err(|source| BackupError::RemoteCall {
                        operation: operation.to_string(),
                        source,
                    })?;
                    let api_response = ApiResponse {
                        status,
                        location,
                        body: text,
                    };
                    if api_response.is_success() || attempt >= self.retries {
                        return Ok(api_response);
                    }
                    warn!(operation, %url, status, attempt, "Non-success status, retrying.");
                }
                Err(source) => {
                    if attempt >= self.retries {
                        return Err(BackupError::RemoteCall {
                            operation: operation.to_string(),
                            source,
                        });
                    }
                    warn!(operation, %url, error = %source, attempt, "Request failed, retrying.");
                }
            }
            attempt += 1;
            tokio::time::sleep(self.retry_backoff).await;
        }
    }
}

/// One client per endpoint group, built from the same configuration.
#[derive(Debug, Clone)]
pub struct Clients {
    pub alerts: ApiClient,
    pub synthetics: ApiClient,
    pub label_synthetics: ApiClient,
    pub insights: ApiClient,
    pub infrastructure: ApiClient,
    pub graphql: ApiClient,
}

impl Clients {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            alerts: ApiClient::new(config, Endpoint::Alerts)?,
            synthetics: ApiClient::new(config, Endpoint::Synthetics)?,
            label_synthetics: ApiClient::new(config, Endpoint::LabelSynthetics)?,
            insights: ApiClient::new(config, Endpoint::Insights)?,
            infrastructure: ApiClient::new(config, Endpoint::Infrastructure)?,
            graphql: ApiClient::new(config, Endpoint::GraphQl)?,
        })
    }
}
