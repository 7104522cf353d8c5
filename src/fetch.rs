//! HTTP request plumbing for the Matchpoint API
//!
//! Responses are returned as raw [`serde_json::Value`] bodies; turning them
//! into canonical types is the normalizer's job ([`crate::normalize`]).
//! Non-2xx statuses are mapped to [`Error::Api`] here, extracting the
//! backend's error envelope when one is present.

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, Method, RequestBuilder,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use crate::error::{fallback_message, Error};

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Option<HashMap<String, String>>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: None,
            body: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Add query parameters to the request
    pub fn query(mut self, params: HashMap<String, String>) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// Build the request
    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if let Some(params) = &self.query_params {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and return the decoded JSON body
    ///
    /// Non-2xx responses become [`Error::Api`] with the message extracted
    /// from the backend's error envelope.
    pub async fn execute(&self) -> Result<Value, Error> {
        let req = self.build()?;
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            let message = body
                .as_ref()
                .and_then(extract_error_message)
                .unwrap_or_else(|| fallback_message(status.as_u16()));
            return Err(Error::api(status.as_u16(), message));
        }

        // Some endpoints reply 2xx with an empty body; treat that as null.
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        let value = serde_json::from_slice(&bytes)?;
        Ok(value)
    }
}

/// Extract the user-facing message from an error envelope
/// `{statusCode?, message: string | string[], error?}`
fn extract_error_message(body: &Value) -> Option<String> {
    match body.get("message") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => items
            .iter()
            .find_map(|item| item.as_str())
            .map(|s| s.to_string()),
        _ => body
            .get("error")
            .and_then(|e| e.as_str())
            .map(|s| s.to_string()),
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}
