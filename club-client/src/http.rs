//! HTTP transport for the club document service

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use shared::document::SharedDocument;
use shared::request::{MutationRequest, PushRequest};
use shared::response::AppDataEnvelope;

use crate::{ClientConfig, ClientError, ClientResult};

/// Network side of the sync engine
///
/// Every call returns the server's copy of the document when the envelope
/// carries one.
#[async_trait]
pub trait ClubApi: Send + Sync {
    /// Pull the canonical document
    async fn fetch_app_data(&self) -> ClientResult<Option<SharedDocument>>;

    /// Replace the canonical document (admin credential required)
    async fn push_app_data(
        &self,
        pin: &str,
        payload: &SharedDocument,
    ) -> ClientResult<Option<SharedDocument>>;

    /// Send one cooperative mutation
    async fn mutate(&self, request: &MutationRequest) -> ClientResult<Option<SharedDocument>>;
}

/// reqwest-backed [`ClubApi`]
#[derive(Debug, Clone)]
pub struct HttpClubApi {
    client: Client,
    app_data_url: String,
    mutate_url: String,
}

impl HttpClubApi {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            app_data_url: config.url(&config.app_data_path),
            mutate_url: config.url(&config.mutate_path),
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> ClientResult<Option<SharedDocument>> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response(response: reqwest::Response) -> ClientResult<Option<SharedDocument>> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<AppDataEnvelope>(&text)
                .ok()
                .and_then(|env| env.error)
                .unwrap_or(text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::FORBIDDEN => ClientError::Forbidden(message),
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ClientError::Validation(message)
                }
                StatusCode::CONFLICT => ClientError::Conflict(message),
                s if s.is_server_error() => ClientError::Internal(message),
                _ => ClientError::InvalidResponse(format!("{}: {}", status, message)),
            });
        }

        let envelope: AppDataEnvelope = serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if !envelope.ok {
            return Err(ClientError::InvalidResponse(
                envelope.error.unwrap_or_else(|| "request not accepted".into()),
            ));
        }
        Ok(envelope.payload)
    }
}

#[async_trait]
impl ClubApi for HttpClubApi {
    async fn fetch_app_data(&self) -> ClientResult<Option<SharedDocument>> {
        let response = self
            .client
            .get(&self.app_data_url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn push_app_data(
        &self,
        pin: &str,
        payload: &SharedDocument,
    ) -> ClientResult<Option<SharedDocument>> {
        let body = PushRequest {
            pin: pin.to_string(),
            payload: payload.clone(),
        };
        self.post(&self.app_data_url, &body).await
    }

    async fn mutate(&self, request: &MutationRequest) -> ClientResult<Option<SharedDocument>> {
        tracing::debug!(kind = request.mutation.name(), card = %request.tessera, "Sending mutation");
        self.post(&self.mutate_url, request).await
    }
}
