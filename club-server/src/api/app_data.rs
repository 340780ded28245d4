//! 共享文档路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | APP_DATA_PATH | GET | 拉取整份文档 | 无 |
//! | APP_DATA_PATH | POST | 整份替换 (最后写入者胜出) | 管理员 PIN |

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::get,
};

use shared::request::{APP_DATA_PATH, PushRequest};

use super::envelope;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route(APP_DATA_PATH, get(fetch).post(push))
}

async fn fetch(State(state): State<ServerState>) -> Response {
    envelope(state.snapshot().await)
}

async fn push(
    State(state): State<ServerState>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = body?;
    if request.pin.trim().is_empty() || request.pin.trim() != state.config.admin_pin {
        tracing::warn!("Push rejected: invalid admin PIN");
        return Err(AppError::Unauthorized);
    }

    let stored = state.replace(request.payload).await?;
    tracing::info!(version = stored.version, "Shared document replaced");
    Ok(envelope(stored))
}
