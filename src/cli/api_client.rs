use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::env;

use crate::cli::error::{CliError, CliResult};

/// Environment variable naming the API server URL.
pub const API_URL_ENV: &str = "CLASSROOM_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// API client for communicating with the classroom REST API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// Priority for base URL:
    /// 1. Explicit `api_url` parameter
    /// 2. CLASSROOM_API_URL environment variable
    /// 3. Default: http://localhost:3000
    pub fn new(api_url: Option<String>) -> Self {
        let base_url = api_url
            .or_else(|| env::var(API_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL being used
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a GET request builder
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.get(&url)
    }

    /// Create a POST request builder
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.post(&url)
    }

    /// Create a PATCH request builder
    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.patch(&url)
    }

    /// Create a PUT request builder
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.put(&url)
    }

    /// Create a DELETE request builder
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.delete(&url)
    }

    /// Handle API response with standardized error handling
    ///
    /// Returns the deserialized response body on success,
    /// or a CliError::ApiError on non-success status codes.
    pub async fn handle_response<T: DeserializeOwned>(response: Response) -> CliResult<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::InvalidResponse {
                    message: e.to_string(),
                })
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Handle a response that carries no body on success (204).
    pub async fn handle_empty_response(response: Response) -> CliResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: Response) -> CliError {
        let status = response.status().as_u16();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // Prefer the server's {"error": "..."} message over the raw body
        let message = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(error_text);

        CliError::ApiError { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Initialize crypto provider once for all tests
    fn init_crypto() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    #[test]
    fn test_new_with_explicit_url() {
        init_crypto();
        let client = ApiClient::new(Some("http://custom:8080".to_string()));
        assert_eq!(client.base_url(), "http://custom:8080");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        init_crypto();
        let client = ApiClient::new(Some("http://custom:8080/".to_string()));
        assert_eq!(client.base_url(), "http://custom:8080");
    }

    #[test]
    #[serial]
    fn test_env_var_used_when_no_explicit_url() {
        init_crypto();
        unsafe {
            env::set_var(API_URL_ENV, "http://from-env:9000");
        }

        let client = ApiClient::new(None);
        assert_eq!(client.base_url(), "http://from-env:9000");

        // Explicit URL still wins
        let client = ApiClient::new(Some("http://explicit:7777".to_string()));
        assert_eq!(client.base_url(), "http://explicit:7777");

        unsafe {
            env::remove_var(API_URL_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_new_with_default() {
        init_crypto();
        unsafe {
            env::remove_var(API_URL_ENV);
        }
        let client = ApiClient::new(None);
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
