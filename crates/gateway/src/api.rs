//! JSON endpoints: `POST /chat` and `POST /upload-knowledge`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use sitechat_chat::ChatRequest;
use sitechat_core::{SessionId, SiteId, ValidationError};
use tracing::{error, info, warn};

use crate::SharedState;

/// Body of `POST /chat`.
///
/// A missing `message` is treated like an empty one so every caller
/// mistake gets the same reply shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply of `POST /chat`, identical for success and failure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

pub(crate) async fn chat_handler(
    State(state): State<SharedState>,
    Json(body): Json<ChatBody>,
) -> (StatusCode, Json<ChatReply>) {
    let request = ChatRequest {
        message: body.message,
        site: body.site,
        session: body.session_id.map(SessionId),
    };

    match state.pipeline.handle(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ChatReply {
                reply: outcome.reply,
                is_error: outcome.is_error,
                session_id: outcome.session.map(|s| s.0),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Rejected chat request");
            (
                StatusCode::BAD_REQUEST,
                Json(ChatReply {
                    reply: e.to_string(),
                    is_error: true,
                    session_id: None,
                }),
            )
        }
    }
}

/// Body of `POST /upload-knowledge`; `message` is the knowledge text.
#[derive(Debug, Default, Deserialize)]
pub struct UploadBody {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
}

impl UploadResponse {
    fn success(message: String) -> Self {
        Self {
            status: "success".into(),
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".into(),
            message,
        }
    }
}

pub(crate) async fn upload_knowledge_handler(
    State(state): State<SharedState>,
    Json(body): Json<UploadBody>,
) -> (StatusCode, Json<UploadResponse>) {
    let site = match SiteId::parse(&body.site) {
        Ok(site) => site,
        Err(e) => {
            warn!(error = %e, "Rejected knowledge upload");
            return (StatusCode::BAD_REQUEST, Json(UploadResponse::error(e.to_string())));
        }
    };

    if body.message.trim().is_empty() {
        let e = ValidationError::EmptyKnowledge;
        warn!(site = %site, error = %e, "Rejected knowledge upload");
        return (StatusCode::BAD_REQUEST, Json(UploadResponse::error(e.to_string())));
    }

    match state.store.save(&site, &body.message).await {
        Ok(_) => {
            info!(site = %site, "Knowledge uploaded");
            (
                StatusCode::OK,
                Json(UploadResponse::success(format!("Knowledge for {site} updated"))),
            )
        }
        Err(e) => {
            error!(site = %site, error = %e, "Knowledge upload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadResponse::error(format!("Could not save knowledge for {site}"))),
            )
        }
    }
}
