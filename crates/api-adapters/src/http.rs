//! # HTTP Board API
//!
//! `reqwest` implementation of [`BoardApi`]. Each instance owns its own
//! cookie jar, so one instance is one backend session: create a new one per
//! visitor. Every call is a single request, never retried.

use std::time::Duration;

use async_trait::async_trait;
use domains::wire::{
    AdminPostListEnvelope, CommentBody, CommentEditBody, CommentEnvelope, EchoEnvelope, ErrorBody,
    LoginBody, PostDetailEnvelope, PostPageEnvelope, PostingBody, ReportBody, ReportEnvelope,
    ReportListEnvelope, ResolveBody, SignupBody, UserEnvelope, UserListEnvelope, VoteBody,
    VoteEnvelope,
};
use domains::{
    AdminPostQuery, AdminPosting, ApiError, ApiResult, BoardApi, Comment, CommentId, Credentials,
    FiledReport, Identity, PostDetail, PostId, PostPage, PostQuery, PostingDraft, PostingEcho,
    Registration, Report, ReportId, ReportQuery, ResolveAction, UserSummary, VoteKind, VoteTally,
};
use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    base_url: String,
}

impl HttpBoardApi {
    pub fn new(config: &HttpApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and turns transport failures and non-2xx statuses
    /// into [`ApiError`]. Returns the raw success body.
    async fn execute(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);
        debug!(status = status.as_u16(), message = ?message, "backend refused request");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "unexpected response shape");
            ApiError::Decode(e.to_string())
        })
    }

    /// For endpoints whose success body carries nothing the client needs.
    async fn fire(&self, request: RequestBuilder) -> ApiResult<()> {
        self.execute(request).await.map(|_| ())
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn signup(&self, registration: &Registration) -> ApiResult<Identity> {
        let body = SignupBody {
            username: registration.username.trim(),
            email: registration.email.trim(),
            password: registration.password.expose_secret(),
        };
        let envelope: UserEnvelope = self
            .fetch(self.client.post(self.url("/auth/signup")).json(&body))
            .await?;
        Ok(envelope.into_identity()?)
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> ApiResult<Identity> {
        let body = LoginBody {
            username: credentials.username.trim(),
            password: credentials.password.expose_secret(),
        };
        let envelope: UserEnvelope = self
            .fetch(self.client.post(self.url("/auth/login")).json(&body))
            .await?;
        Ok(envelope.into_identity()?)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> ApiResult<()> {
        self.fire(self.client.post(self.url("/auth/logout"))).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> ApiResult<Identity> {
        let envelope: UserEnvelope = self.fetch(self.client.get(self.url("/auth/me"))).await?;
        Ok(envelope.into_identity()?)
    }

    #[instrument(skip(self))]
    async fn list_postings(&self, query: &PostQuery) -> ApiResult<PostPage> {
        let envelope: PostPageEnvelope = self
            .fetch(self.client.get(self.url("/posts")).query(query))
            .await?;
        Ok(envelope.into_page()?)
    }

    #[instrument(skip(self))]
    async fn get_posting(&self, id: PostId) -> ApiResult<PostDetail> {
        let envelope: PostDetailEnvelope = self
            .fetch(self.client.get(self.url(&format!("/posts/{id}"))))
            .await?;
        Ok(envelope.into_detail()?)
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_posting(&self, draft: &PostingDraft) -> ApiResult<PostingEcho> {
        let envelope: EchoEnvelope = self
            .fetch(
                self.client
                    .post(self.url("/posts"))
                    .json(&PostingBody::from(draft)),
            )
            .await?;
        Ok(envelope.into_echo()?)
    }

    #[instrument(skip(self, draft))]
    async fn update_posting(&self, id: PostId, draft: &PostingDraft) -> ApiResult<PostingEcho> {
        let envelope: EchoEnvelope = self
            .fetch(
                self.client
                    .put(self.url(&format!("/posts/{id}")))
                    .json(&PostingBody::from(draft)),
            )
            .await?;
        Ok(envelope.into_echo()?)
    }

    #[instrument(skip(self))]
    async fn delete_posting(&self, id: PostId) -> ApiResult<()> {
        self.fire(self.client.delete(self.url(&format!("/posts/{id}"))))
            .await
    }

    #[instrument(skip(self))]
    async fn vote(&self, post_id: PostId, kind: VoteKind) -> ApiResult<VoteTally> {
        let body = VoteBody {
            post_id,
            vote_type: kind,
        };
        let envelope: VoteEnvelope = self
            .fetch(self.client.post(self.url("/votes")).json(&body))
            .await?;
        Ok(envelope.into_tally(post_id))
    }

    #[instrument(skip(self, content))]
    async fn create_comment(&self, post_id: PostId, content: &str) -> ApiResult<Comment> {
        let envelope: CommentEnvelope = self
            .fetch(
                self.client
                    .post(self.url("/comments"))
                    .json(&CommentBody { post_id, content }),
            )
            .await?;
        Ok(envelope.into_comment()?)
    }

    #[instrument(skip(self, content))]
    async fn update_comment(&self, id: CommentId, content: &str) -> ApiResult<Comment> {
        let envelope: CommentEnvelope = self
            .fetch(
                self.client
                    .put(self.url(&format!("/comments/{id}")))
                    .json(&CommentEditBody { content }),
            )
            .await?;
        Ok(envelope.into_comment()?)
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, id: CommentId) -> ApiResult<()> {
        self.fire(self.client.delete(self.url(&format!("/comments/{id}"))))
            .await
    }

    #[instrument(skip(self, reason))]
    async fn file_report(&self, post_id: PostId, reason: &str) -> ApiResult<FiledReport> {
        let envelope: ReportEnvelope = self
            .fetch(
                self.client
                    .post(self.url("/reports"))
                    .json(&ReportBody { post_id, reason }),
            )
            .await?;
        Ok(envelope.into_filed()?)
    }

    #[instrument(skip(self))]
    async fn list_reports(&self, query: &ReportQuery) -> ApiResult<Vec<Report>> {
        let envelope: ReportListEnvelope = self
            .fetch(self.client.get(self.url("/reports")).query(query))
            .await?;
        Ok(envelope.into_reports()?)
    }

    #[instrument(skip(self))]
    async fn resolve_report(&self, id: ReportId, action: ResolveAction) -> ApiResult<()> {
        self.fire(
            self.client
                .post(self.url(&format!("/reports/{id}/resolve")))
                .json(&ResolveBody { action }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_admin_postings(&self, query: &AdminPostQuery) -> ApiResult<Vec<AdminPosting>> {
        let envelope: AdminPostListEnvelope = self
            .fetch(self.client.get(self.url("/admin/posts")).query(query))
            .await?;
        Ok(envelope.into_rows()?)
    }

    #[instrument(skip(self))]
    async fn moderate_delete(&self, id: PostId) -> ApiResult<()> {
        self.fire(self.client.post(self.url(&format!("/admin/posts/{id}/delete"))))
            .await
    }

    #[instrument(skip(self))]
    async fn moderate_restore(&self, id: PostId) -> ApiResult<()> {
        self.fire(self.client.post(self.url(&format!("/admin/posts/{id}/restore"))))
            .await
    }

    #[instrument(skip(self))]
    async fn list_users(&self, page: u32, per_page: u32) -> ApiResult<Vec<UserSummary>> {
        let envelope: UserListEnvelope = self
            .fetch(
                self.client
                    .get(self.url("/admin/users"))
                    .query(&[("page", page), ("per_page", per_page)]),
            )
            .await?;
        Ok(envelope.into_users()?)
    }
}
