use log::{error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the Ollama server
    base_url: String,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Ollama generation request
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// The model to use
    model: String,

    /// The prompt to complete
    prompt: String,

    /// System prompt to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Whether to stream the response
    stream: bool,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Ollama generation response
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// The model that generated the response
    #[serde(default)]
    pub model: String,

    /// The generated text
    #[serde(default)]
    pub response: String,

    /// Whether generation finished
    #[serde(default)]
    pub done: bool,

    /// Number of prompt tokens evaluated
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,

    /// Number of tokens generated
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl Ollama {
    /// Create a new Ollama client with default retry settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::new_with_config(base_url, 3, 1000, 120)
    }

    /// Create a new Ollama client with explicit retry configuration
    pub fn new_with_config(
        base_url: impl Into<String>,
        max_retries: u32,
        backoff_base_ms: u64,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// Generate text from the Ollama API with retry logic
    ///
    /// Server and network errors are retried with exponential backoff;
    /// client errors are returned immediately.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        let mut last_error = ProviderError::RequestFailed("No request attempted".to_string());

        while attempt <= self.max_retries {
            let response_result = self.client.post(&url).json(&request).send().await;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let response_text = response.text().await.map_err(|e| {
                            ProviderError::ParseError(format!(
                                "Failed to get response text from Ollama API: {}",
                                e
                            ))
                        })?;

                        return Self::parse_generation_response(&response_text);
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());

                    if status.is_server_error() {
                        warn!("Ollama API server error ({}): {}", status, error_text);
                        last_error = ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        };
                    } else {
                        // Client error - retrying will not help
                        error!("Ollama API error ({}): {}", status, error_text);
                        return Err(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    }
                }
                Err(e) => {
                    warn!("Ollama API request failed: {}", e);
                    last_error = ProviderError::ConnectionError(e.to_string());
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error)
    }

    /// Parse a generation response body
    ///
    /// The API normally returns one JSON object, but misconfigured servers
    /// reply in streaming JSONL; in that case the pieces are concatenated.
    fn parse_generation_response(response_text: &str) -> Result<GenerationResponse, ProviderError> {
        match serde_json::from_str::<GenerationResponse>(response_text) {
            Ok(response) => Ok(response),
            Err(e) => {
                let lines: Vec<&str> = response_text
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .collect();

                if lines.len() <= 1 {
                    return Err(ProviderError::ParseError(format!(
                        "Failed to parse Ollama API response: {}",
                        e
                    )));
                }

                let mut full_response = String::new();
                let mut model = String::new();
                let mut done = false;

                for line in &lines {
                    let value: serde_json::Value =
                        serde_json::from_str(line).map_err(|e| {
                            ProviderError::ParseError(format!(
                                "Failed to parse Ollama streaming line: {}",
                                e
                            ))
                        })?;

                    if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                        full_response.push_str(part);
                    }
                    if let Some(m) = value.get("model").and_then(|v| v.as_str()) {
                        model = m.to_string();
                    }
                    if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
                        done = true;
                    }
                }

                Ok(GenerationResponse {
                    model,
                    response: full_response,
                    done,
                    prompt_eval_count: None,
                    eval_count: None,
                })
            }
        }
    }

    /// Test the connection to the Ollama server
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ConnectionError(format!(
                "Ollama server responded with status {}",
                response.status()
            )))
        }
    }
}
