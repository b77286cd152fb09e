//! HTTP handlers for queues

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use msgq_core::{ApiError, ApiSuccess, ErrorCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::model::{
    Action, GetOptions, Message, NewMessage, OptionsError, QueueName, QueueNameEmptyError,
    QueueSummary, MAX_DURATION_SECS,
};
use crate::storage::{MessageStore, StoreError};

/// State for queue handlers
pub struct QueueState {
    pub store: Arc<dyn MessageStore>,
}

impl QueueState {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }
}

// === Error mapping ===

impl From<QueueNameEmptyError> for ApiError {
    fn from(e: QueueNameEmptyError) -> Self {
        ApiError::new(ErrorCode::InvalidQueueName, e.to_string())
    }
}

impl From<OptionsError> for ApiError {
    fn from(e: OptionsError) -> Self {
        match e {
            OptionsError::MissingParameter(_) => {
                ApiError::new(ErrorCode::MissingParameter, e.to_string())
            }
            OptionsError::InvalidParameter(_) => {
                ApiError::new(ErrorCode::InvalidParameter, e.to_string())
            }
            OptionsError::QueueName(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NoMessage(_) => ApiError::new(ErrorCode::NoMessage, e.to_string()),
            StoreError::QueueNotFound(_) => ApiError::new(ErrorCode::QueueNotFound, e.to_string()),
            StoreError::ContentTooLarge { .. } => {
                ApiError::new(ErrorCode::PayloadTooLarge, e.to_string())
            }
            StoreError::Options(e) => e.into(),
            StoreError::Internal(cause) => ApiError::internal(cause),
        }
    }
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub queue_name: String,
    pub content: String,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub expiry_seconds: Option<u64>,
}

impl CreateMessageRequest {
    fn try_into_domain(self) -> Result<(QueueName, NewMessage), OptionsError> {
        let queue_name = QueueName::new(&self.queue_name)?;
        let mut message = NewMessage::new(self.content);
        if let Some(cid) = self.cid {
            let cid = Uuid::try_parse(cid.trim())
                .map_err(|_| OptionsError::InvalidParameter("cid"))?;
            message = message.with_cid(cid);
        }
        if let Some(seconds) = self.expiry_seconds {
            if seconds > MAX_DURATION_SECS {
                return Err(OptionsError::InvalidParameter("expiry_seconds"));
            }
            message = message.with_expiry(Duration::from_secs(seconds));
        }
        Ok((queue_name, message))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedMessage {
    pub id: Uuid,
    pub cursor: u64,
}

impl From<&Message> for CreatedMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.mid(),
            cursor: message.cursor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<Uuid>,
    pub cursor: u64,
    pub content: String,
    pub sent_timestamp: i64,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.mid(),
            cid: message.cid(),
            cursor: message.cursor(),
            content: message.content().to_string(),
            sent_timestamp: message.sent_at().timestamp_millis(),
        }
    }
}

// === Handlers ===

/// `POST /api/create`
pub async fn create_message(
    State(state): State<Arc<QueueState>>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<ApiSuccess<CreatedMessage>, ApiError> {
    let (queue_name, message) = body.try_into_domain()?;
    let message = state.store.create_message(&queue_name, message).await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, (&message).into()))
}

/// `GET /api/{queue_name}?action=...`
pub async fn queue_action(
    State(state): State<Arc<QueueState>>,
    Path(queue_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let options = GetOptions::from_query(&queue_name, &params)?;
    debug!(queue = %options.queue_name(), action = %options.action(), "Queue action");

    if options.action() == Action::Query {
        let summary = state.store.queue_summary(options.queue_name()).await?;
        return Ok(ApiSuccess::ok(summary).into_response());
    }

    let message = state.store.get_message(&options).await?;
    Ok(ApiSuccess::ok(MessageView::from(&message)).into_response())
}

/// `GET /api`
pub async fn list_queues(
    State(state): State<Arc<QueueState>>,
) -> Result<ApiSuccess<Vec<String>>, ApiError> {
    let names = state.store.list_queues().await?;
    Ok(ApiSuccess::ok(
        names.iter().map(ToString::to_string).collect(),
    ))
}

/// `GET /summary`
pub async fn queue_summaries(
    State(state): State<Arc<QueueState>>,
) -> Result<ApiSuccess<Vec<QueueSummary>>, ApiError> {
    Ok(ApiSuccess::ok(state.store.queue_summaries().await?))
}

/// `GET /summary/{queue_name}`
pub async fn queue_summary(
    State(state): State<Arc<QueueState>>,
    Path(queue_name): Path<String>,
) -> Result<ApiSuccess<Vec<QueueSummary>>, ApiError> {
    let queue_name = QueueName::new(&queue_name)?;
    let summary = state.store.queue_summary(&queue_name).await?;
    Ok(ApiSuccess::ok(vec![summary]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn state() -> Arc<QueueState> {
        Arc::new(QueueState::new(Arc::new(MemoryStore::new())))
    }

    fn create_body(queue_name: &str, content: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            queue_name: queue_name.to_string(),
            content: content.to_string(),
            cid: None,
            expiry_seconds: None,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_create_returns_created() {
        let state = state();
        let result = create_message(State(state), Json(create_body("orders", "hello")))
            .await
            .unwrap();
        assert_eq!(result.status(), StatusCode::CREATED);
        assert_eq!(result.data().cursor, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_queue() {
        let err = create_message(State(state()), Json(create_body("  ", "hello")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQueueName);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_cid() {
        let mut body = create_body("orders", "hello");
        body.cid = Some("nope".to_string());
        let err = create_message(State(state()), Json(body)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }

    #[tokio::test]
    async fn test_create_rejects_unbounded_expiry() {
        let mut body = create_body("orders", "hello");
        body.expiry_seconds = Some(u64::MAX);
        let err = create_message(State(state()), Json(body)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
        assert_eq!(err.message, "invalid value for parameter expiry_seconds");
    }

    #[tokio::test]
    async fn test_action_on_missing_queue_is_not_found() {
        let err = queue_action(
            State(state()),
            Path("nowhere".to_string()),
            query(&[("action", "browse")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoMessage);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_on_missing_queue_is_not_found() {
        let err = queue_action(
            State(state()),
            Path("nowhere".to_string()),
            query(&[("action", "query")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::QueueNotFound);
    }

    #[tokio::test]
    async fn test_action_validation_errors() {
        let err = queue_action(State(state()), Path("q".to_string()), query(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = queue_action(
            State(state()),
            Path("q".to_string()),
            query(&[("action", "confirm")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);
        assert_eq!(err.message, "missing parameter mid");
    }

    #[tokio::test]
    async fn test_summary_of_created_queue() {
        let state = state();
        create_message(State(state.clone()), Json(create_body(" orders ", "a")))
            .await
            .unwrap();

        let result = queue_summary(State(state), Path("orders".to_string()))
            .await
            .unwrap();
        assert_eq!(
            result.data(),
            &vec![QueueSummary {
                queue_name: "orders".to_string(),
                depth: 1,
                reserved: 0,
            }]
        );
    }

    #[test]
    fn test_internal_store_error_is_hidden() {
        let err: ApiError = StoreError::Internal("disk on fire".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().data.message, "Internal server error");
    }

    #[test]
    fn test_message_view_omits_missing_cid() {
        let message = Message::new(
            7,
            NewMessage::new("payload"),
            tokio::time::Instant::now(),
        );
        let json = serde_json::to_value(MessageView::from(&message)).unwrap();
        assert_eq!(json["cursor"], 7);
        assert_eq!(json["content"], "payload");
        assert!(json.get("cid").is_none());
        assert_eq!(json["id"], message.mid().to_string());
    }
}
