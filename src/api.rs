//! REST client for the phrase API.
//!
//! Every call returns the server's response envelope. Failures (transport,
//! non-2xx status, `success: false`, undecodable bodies) come back as
//! [`ApiError`] values for the caller to turn into notifications; nothing is
//! cached at this layer.

use crate::config::Config;
use crate::models::{Language, Phrase, PhrasePayload, SearchParams};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Base resource every endpoint hangs off
const RESOURCE: &str = "phrase";

/// Sub-resources of `/phrase` that a phrase id must not shadow
const RESERVED_SEGMENTS: [&str; 3] = ["search", "languages", "translations"];

/// Pagination details attached to list responses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: u64,
    #[serde(default)]
    pub current_page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub last_page: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Normalized response envelope returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: HashMap<String, String>,
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub message: String,
    pub stack_trace: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, treating a null `data` as an error
    pub fn into_data(self) -> Result<T, ApiError> {
        let path = self.path;
        self.data.ok_or(ApiError::MissingData { path })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Request to {path} failed: {message}")]
    Transport { path: String, message: String },

    #[error("API error ({status_code}) at {path}: {message}")]
    Api {
        status_code: u16,
        path: String,
        message: String,
        errors: HashMap<String, String>,
    },

    #[error("Failed to parse response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Response from {path} contained no data")]
    MissingData { path: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Field-scoped messages reported by the server
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Api { errors, .. } => Some(errors),
            _ => None,
        }
    }

    fn from_envelope<T>(envelope: ApiResponse<T>, fallback_status: u16, fallback_path: &str) -> Self {
        Self::Api {
            status_code: if envelope.status_code == 0 {
                fallback_status
            } else {
                envelope.status_code
            },
            path: if envelope.path.is_empty() {
                fallback_path.to_string()
            } else {
                envelope.path
            },
            message: envelope.message,
            errors: envelope.errors,
        }
    }
}

#[derive(Debug, Serialize)]
struct DeleteTranslationsBody<'a> {
    ids: &'a [String],
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                path: config.api_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self::with_client(http, &config.api_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(suffix: &str) -> String {
        format!("/{}{}", RESOURCE, suffix)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// `/phrase/{id}` with `id` percent-encoded as one path segment
    fn phrase_url(&self, id: &str) -> Result<(Url, String), ApiError> {
        if id.is_empty() || id == "." || id == ".." || RESERVED_SEGMENTS.contains(&id) {
            return Err(ApiError::InvalidRequest(format!("invalid phrase id '{}'", id)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ApiError::InvalidRequest(format!("invalid API URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidRequest(format!("API URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push(RESOURCE)
            .push(id);

        Ok((url, Self::endpoint(&format!("/{}", id))))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport {
            path: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            path: endpoint.to_string(),
            message: format!("<failed to read body: {}>", e),
        })?;

        if !status.is_success() {
            let error = match serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
                Ok(envelope) => ApiError::from_envelope(envelope, status.as_u16(), endpoint),
                Err(_) => ApiError::Api {
                    status_code: status.as_u16(),
                    path: endpoint.to_string(),
                    message: if body.is_empty() {
                        status.to_string()
                    } else {
                        body
                    },
                    errors: HashMap::new(),
                },
            };
            warn!("{}", error);
            return Err(error);
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode {
                path: endpoint.to_string(),
                message: e.to_string(),
            })?;

        if !envelope.success {
            let error = ApiError::from_envelope(envelope, status.as_u16(), endpoint);
            warn!("{}", error);
            return Err(error);
        }

        debug!("{} -> {}", endpoint, envelope.status_code);
        Ok(envelope)
    }

    /// `GET /phrase`
    pub async fn list(&self) -> Result<ApiResponse<Vec<Phrase>>, ApiError> {
        let endpoint = Self::endpoint("");
        self.send(self.http.get(self.url(&endpoint)), &endpoint).await
    }

    /// `GET /phrase/{id}`
    pub async fn one(&self, id: &str) -> Result<ApiResponse<Phrase>, ApiError> {
        let (url, endpoint) = self.phrase_url(id)?;
        self.send(self.http.get(url), &endpoint).await
    }

    /// `POST /phrase`
    pub async fn create(&self, payload: &PhrasePayload) -> Result<ApiResponse<Phrase>, ApiError> {
        let endpoint = Self::endpoint("");
        self.send(self.http.post(self.url(&endpoint)).json(payload), &endpoint)
            .await
    }

    /// `PATCH /phrase/{id}`
    pub async fn update(
        &self,
        id: &str,
        payload: &PhrasePayload,
    ) -> Result<ApiResponse<Phrase>, ApiError> {
        let (url, endpoint) = self.phrase_url(id)?;
        self.send(self.http.patch(url).json(payload), &endpoint)
            .await
    }

    /// `DELETE /phrase/{id}`
    pub async fn remove(&self, id: &str) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let (url, endpoint) = self.phrase_url(id)?;
        self.send(self.http.delete(url), &endpoint).await
    }

    /// `GET /phrase/languages`
    pub async fn get_languages(&self) -> Result<ApiResponse<Vec<Language>>, ApiError> {
        let endpoint = Self::endpoint("/languages");
        self.send(self.http.get(self.url(&endpoint)), &endpoint).await
    }

    /// `DELETE /phrase/translations` with body `{ids}`.
    ///
    /// An empty id list is rejected without touching the network.
    pub async fn delete_translations(
        &self,
        ids: &[String],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::InvalidRequest(
                "at least one translation id is required".to_string(),
            ));
        }

        let endpoint = Self::endpoint("/translations");
        let body = DeleteTranslationsBody { ids };
        self.send(self.http.delete(self.url(&endpoint)).json(&body), &endpoint)
            .await
    }

    /// `GET /phrase/search?query=&sort=&searchFields=`
    pub async fn search(&self, params: &SearchParams) -> Result<ApiResponse<Vec<Phrase>>, ApiError> {
        let endpoint = Self::endpoint("/search");
        self.send(self.http.get(self.url(&endpoint)).query(params), &endpoint)
            .await
    }
}
