//! REST adapter.
//!
//! The REST backend is consumed as a fixed external contract: paginated
//! fetches take `limit`/`offset` and return newest-first arrays, send
//! endpoints return the created record synchronously, and every response
//! body arrives wrapped as `{"success": true, "data": ...}`.
//!
//! No retry lives at this layer; a timeout surfaces exactly like a network
//! error and the caller decides what to do. The [`MessageApi`] trait is the
//! seam the pagination adapter (and its tests) work against.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use pinge_proto::{
    Contact, ContactRequest, DirectMessage, GroupMessage, GroupSummary, SendDirectMessage,
    SendGroupMessage, UnreadSummary,
};

/// REST failure surfaced to the caller as a rejected operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status, with the backend's detail message if any.
    #[error("http {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail, or the canonical reason phrase.
        message: String,
    },

    /// Response body did not match the contract.
    #[error("decode error: {0}")]
    Decode(String),

    /// Client could not be constructed.
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The message-fetch operations the pagination adapter needs.
///
/// `RestClient` is the production implementation; tests drive the pager
/// with an in-memory fake instead of a live backend.
pub trait MessageApi: Send + Sync {
    /// One page of direct-message history with a contact, newest first.
    fn direct_messages(
        &self,
        contact_id: &str,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<DirectMessage>, ApiError>> + Send;

    /// One page of a group's message history, newest first.
    fn group_messages(
        &self,
        group_id: &str,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<GroupMessage>, ApiError>> + Send;
}

/// Success envelope every backend response is wrapped in.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope<T> {
    data: T,
}

/// Error body shape the backend uses for failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Typed client for the Pinge REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestClient {
    /// Build a client for the given base URL and session token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Setup`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: &str,
        token: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::unwrap_body(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::unwrap_body(response).await
    }

    /// POST with no meaningful response body.
    async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check_status(&response)?;
        Ok(())
    }

    fn check_status(response: &reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("request failed").to_string(),
        })
    }

    async fn unwrap_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                });
            return Err(ApiError::Status { status: status.as_u16(), message });
        }
        let envelope: ResponseEnvelope<T> =
            response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    // Messages

    /// Send a direct message; returns the created record with its
    /// server-assigned id and timestamp.
    pub async fn send_direct(&self, payload: &SendDirectMessage) -> Result<DirectMessage, ApiError> {
        self.post("/messages/direct", payload).await
    }

    /// Aggregate unread totals plus per-conversation breakdowns.
    pub async fn unread_summary(&self) -> Result<UnreadSummary, ApiError> {
        self.get("/messages/unread/count").await
    }

    /// Mark every message from a contact as read.
    ///
    /// Read state is per direct conversation only; groups have no
    /// server-side mark-read route.
    pub async fn mark_contact_read(&self, contact_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("/messages/mark-read/contact/{contact_id}")).await
    }

    // Groups

    /// Groups this user belongs to.
    pub async fn groups(&self) -> Result<Vec<GroupSummary>, ApiError> {
        self.get("/messages/groups").await
    }

    /// Send a message to a group.
    pub async fn send_group(
        &self,
        group_id: &str,
        payload: &SendGroupMessage,
    ) -> Result<GroupMessage, ApiError> {
        self.post(&format!("/messages/groups/{group_id}/messages"), payload).await
    }

    // Contacts

    /// Confirmed contacts.
    pub async fn contacts(&self) -> Result<Vec<Contact>, ApiError> {
        self.get("/contacts").await
    }

    /// Pending contact requests addressed to this user.
    pub async fn contact_requests(&self) -> Result<Vec<ContactRequest>, ApiError> {
        self.get("/contacts/requests").await
    }

    /// Accept a pending contact request.
    pub async fn accept_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("/contacts/accept/{request_id}")).await
    }

    /// Reject a pending contact request.
    pub async fn reject_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("/contacts/reject/{request_id}")).await
    }
}

impl MessageApi for RestClient {
    async fn direct_messages(
        &self,
        contact_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DirectMessage>, ApiError> {
        self.get(&format!("/messages/direct/{contact_id}?limit={limit}&offset={offset}")).await
    }

    async fn group_messages(
        &self,
        group_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GroupMessage>, ApiError> {
        self.get(&format!("/messages/groups/{group_id}/messages?limit={limit}&offset={offset}"))
            .await
    }
}
