use super::{from_predicted_items, Suggestion};
use crate::config::Config;
use crate::util::truncate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Separator between session fields in the prompt text
pub const INPUT_SEPARATOR: &str = ", ";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    MalformedResponse(String),
}

/// Result of one Generate call that reached the server
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Items(Vec<Suggestion>),
    /// The endpoint answered with an explicit `{ "error": .. }`
    Error(String),
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    predicted_items: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    age: &'a str,
    weight: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    predicted_salary: f64,
}

/// Join session field values into the single prompt string the ML API expects
pub fn build_input_text(fields: &[String]) -> String {
    fields.join(INPUT_SEPARATOR)
}

/// HTTP client for the ML suggestion endpoints.
///
/// Every call is a single attempt. Callers decide what to show on failure.
#[derive(Debug, Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SuggestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        // Url::join replaces the last segment unless the base ends in '/'
        let with_slash = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&with_slash).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.effective_api_base_url(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: format!("{}{}", self.base_url, endpoint),
                source,
            })
    }

    /// POST `{ inputText }` to a suggestion endpoint
    pub async fn generate(
        &self,
        endpoint: &str,
        fields: &[String],
    ) -> Result<GenerateOutcome, ClientError> {
        let url = self.endpoint_url(endpoint)?;
        let input_text = build_input_text(fields);
        debug!(%url, chars = input_text.len(), "requesting suggestions");

        let response = self
            .http
            .post(url)
            .json(&GenerateRequest {
                input_text: &input_text,
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let parsed: GenerateResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(ClientError::MalformedResponse(format!(
                    "{}: {}",
                    e,
                    truncate(&text, 200)
                )))
            }
            Err(_) => {
                return Err(ClientError::Status {
                    status: status.as_u16(),
                    body: truncate(&text, 200),
                })
            }
        };

        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            warn!(endpoint, %error, "endpoint reported an error");
            return Ok(GenerateOutcome::Error(error));
        }

        match parsed.predicted_items {
            Some(items) => Ok(GenerateOutcome::Items(from_predicted_items(items))),
            None if !status.is_success() => Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate(&text, 200),
            }),
            None => Err(ClientError::MalformedResponse(
                "missing 'predicted_items'".to_string(),
            )),
        }
    }

    /// POST age and weight to `/predict`, returning the raw salary figure
    pub async fn predict_salary(&self, age: &str, weight: &str) -> Result<f64, ClientError> {
        let url = self.endpoint_url("/predict")?;
        let response = self
            .http
            .post(url)
            .json(&PredictRequest { age, weight })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate(&text, 200),
            });
        }

        let parsed: PredictResponse = serde_json::from_str(&text).map_err(|e| {
            ClientError::MalformedResponse(format!("{}: {}", e, truncate(&text, 200)))
        })?;
        Ok(parsed.predicted_salary)
    }
}
