//! Client for the msgq HTTP API

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Client for interacting with msgq
pub struct MsgQClient {
    base_url: String,
    client: Client,
}

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    status_code: u16,
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    code: String,
    message: String,
}

/// Reply to a create
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: String,
    pub cursor: u64,
}

/// A message as returned by the GET actions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueMessage {
    pub id: String,
    #[serde(default)]
    pub cid: Option<String>,
    pub cursor: u64,
    pub content: String,
    pub sent_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueSummary {
    pub queue_name: String,
    pub depth: usize,
    pub reserved: usize,
}

/// Optional fields of a create request
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub cid: Option<String>,
    pub expiry_seconds: Option<u64>,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    queue_name: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry_seconds: Option<u64>,
}

impl MsgQClient {
    /// Create a new client
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // === Create ===

    /// Append a message to a queue
    pub async fn create(&self, queue: &str, content: &str) -> Result<Created, ClientError> {
        self.create_with(queue, content, CreateOptions::default())
            .await
    }

    /// Append a message with a correlation id and/or expiry
    pub async fn create_with(
        &self,
        queue: &str,
        content: &str,
        options: CreateOptions,
    ) -> Result<Created, ClientError> {
        let body = CreateBody {
            queue_name: queue,
            content,
            cid: options.cid.as_deref(),
            expiry_seconds: options.expiry_seconds,
        };
        let response = self
            .client
            .post(format!("{}/api/create", self.base_url))
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    // === Actions ===

    /// Run an action; `Ok(None)` when no message matched
    pub async fn action(
        &self,
        queue: &str,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Option<QueueMessage>, ClientError> {
        let mut query = vec![("action", action.to_string())];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .client
            .get(format!("{}/api/{}", self.base_url, queue))
            .query(&query)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    pub async fn browse(
        &self,
        queue: &str,
        mid: Option<&str>,
    ) -> Result<Option<QueueMessage>, ClientError> {
        let params: Vec<(&str, String)> = mid.map(|m| ("mid", m.to_string())).into_iter().collect();
        self.action(queue, "browse", &params).await
    }

    pub async fn get(&self, queue: &str) -> Result<Option<QueueMessage>, ClientError> {
        self.action(queue, "get", &[]).await
    }

    pub async fn reserve(
        &self,
        queue: &str,
        seconds: u64,
    ) -> Result<Option<QueueMessage>, ClientError> {
        self.action(queue, "reserve", &[("reservation_seconds", seconds.to_string())])
            .await
    }

    pub async fn confirm(&self, queue: &str, mid: &str) -> Result<Option<QueueMessage>, ClientError> {
        self.action(queue, "confirm", &[("mid", mid.to_string())])
            .await
    }

    pub async fn return_message(
        &self,
        queue: &str,
        mid: &str,
    ) -> Result<Option<QueueMessage>, ClientError> {
        self.action(queue, "return", &[("mid", mid.to_string())])
            .await
    }

    /// Summary of one queue via `action=query`
    pub async fn query(&self, queue: &str) -> Result<QueueSummary, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/{}", self.base_url, queue))
            .query(&[("action", "query")])
            .send()
            .await?;
        decode(response).await
    }

    // === Listing ===

    pub async fn list_queues(&self) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn summaries(&self) -> Result<Vec<QueueSummary>, ClientError> {
        let response = self
            .client
            .get(format!("{}/summary", self.base_url))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<Envelope<ErrorData>>(&text) {
            Ok(envelope) => ClientError::Api {
                status: status.as_u16(),
                code: envelope.data.code,
                message: envelope.data.message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: String::new(),
                message: text,
            },
        });
    }

    serde_json::from_str::<Envelope<T>>(&text)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::ParseError(e.to_string()))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API error {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Parse error: {0}")]
    ParseError(String),
}
