//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`app_data`] - 共享文档拉取与整份推送
//! - [`mutate`] - 会员操作 (预订、取消、答题)

pub mod app_data;
pub mod health;
pub mod mutate;

use axum::Json;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use shared::document::SharedDocument;
use shared::response::AppDataEnvelope;

/// `{ok: true, payload}`, never cached by intermediaries
pub(crate) fn envelope(doc: SharedDocument) -> Response {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(AppDataEnvelope::success(doc)),
    )
        .into_response()
}
