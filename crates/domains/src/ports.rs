//! # Ports
//!
//! The one contract the rest of the client depends on: a typed call per
//! backend operation. Implementations own no state beyond their transport
//! (the HTTP adapter keeps the session cookie); there are no retries, no
//! caching and no request de-duplication. Callers gate duplicate submissions.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{
    AdminPostQuery, AdminPosting, Comment, CommentId, Credentials, FiledReport, Identity, PostDetail,
    PostId, PostPage, PostQuery, PostingDraft, PostingEcho, Registration, Report, ReportId,
    ReportQuery, ResolveAction, UserSummary, VoteKind, VoteTally,
};

/// Typed access to the board backend.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardApi: Send + Sync {
    // Auth
    async fn signup(&self, registration: &Registration) -> ApiResult<Identity>;
    async fn login(&self, credentials: &Credentials) -> ApiResult<Identity>;
    async fn logout(&self) -> ApiResult<()>;
    /// Fails with 401 when there is no backend session.
    async fn current_user(&self) -> ApiResult<Identity>;

    // Postings
    async fn list_postings(&self, query: &PostQuery) -> ApiResult<PostPage>;
    async fn get_posting(&self, id: PostId) -> ApiResult<PostDetail>;
    async fn create_posting(&self, draft: &PostingDraft) -> ApiResult<PostingEcho>;
    async fn update_posting(&self, id: PostId, draft: &PostingDraft) -> ApiResult<PostingEcho>;
    async fn delete_posting(&self, id: PostId) -> ApiResult<()>;

    /// Casting the same direction twice clears the vote; the opposite flips it.
    async fn vote(&self, id: PostId, kind: VoteKind) -> ApiResult<VoteTally>;

    // Comments
    async fn create_comment(&self, post: PostId, content: &str) -> ApiResult<Comment>;
    async fn update_comment(&self, id: CommentId, content: &str) -> ApiResult<Comment>;
    async fn delete_comment(&self, id: CommentId) -> ApiResult<()>;

    // Reports
    async fn file_report(&self, post: PostId, reason: &str) -> ApiResult<FiledReport>;
    async fn list_reports(&self, query: &ReportQuery) -> ApiResult<Vec<Report>>;
    async fn resolve_report(&self, id: ReportId, action: ResolveAction) -> ApiResult<()>;

    // Moderation
    async fn list_admin_postings(&self, query: &AdminPostQuery) -> ApiResult<Vec<AdminPosting>>;
    async fn moderate_delete(&self, id: PostId) -> ApiResult<()>;
    async fn moderate_restore(&self, id: PostId) -> ApiResult<()>;
    async fn list_users(&self, page: u32, per_page: u32) -> ApiResult<Vec<UserSummary>>;
}
