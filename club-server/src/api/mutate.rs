//! 会员操作路由
//!
//! `POST MUTATE_PATH` with `{type, tessera, ...}`; capacity and one-answer
//! rules are enforced here, against the current canonical document.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::post,
};

use shared::request::{MUTATE_PATH, MutationRequest};

use super::envelope;
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route(MUTATE_PATH, post(mutate))
}

async fn mutate(
    State(state): State<ServerState>,
    body: Result<Json<MutationRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = body?;
    let kind = request.mutation.name();

    match state.apply_mutation(&request).await {
        Ok(stored) => {
            tracing::info!(kind, card = %request.tessera, version = stored.version, "Mutation applied");
            Ok(envelope(stored))
        }
        Err(e) => {
            tracing::info!(kind, card = %request.tessera, error = %e, "Mutation rejected");
            Err(e)
        }
    }
}
