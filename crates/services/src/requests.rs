//! Pending requests handed out by the views.
//!
//! A request owns the [`Ticket`] that keeps its control disabled. The caller
//! sends it (without holding any lock on the view), then passes it back to
//! the view together with the backend's answer.

use async_trait::async_trait;
use domains::{
    validation, ApiResult, AuthorRef, BoardApi, Comment, CommentId, Credentials, Field,
    FiledReport, Identity, PostId, PostingDraft, PostingEcho, Registration, ReportId,
    ResolveAction, VoteKind, VoteTally,
};

use crate::error::ActionRejected;
use crate::inflight::{Action, InFlight, Ticket};
use crate::session::SessionStore;

/// A request that has taken its ticket and can be sent to the backend.
/// Sending borrows the request, so it can be handed back to the view that
/// issued it together with the reply.
#[async_trait]
pub trait Outbound: Send + Sync {
    type Reply: Send;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<Self::Reply>;
}

fn require_signed_in(session: &SessionStore) -> Result<(), ActionRejected> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(ActionRejected::NotSignedIn)
    }
}

fn require_admin(session: &SessionStore) -> Result<(), ActionRejected> {
    require_signed_in(session)?;
    if session.is_admin() {
        Ok(())
    } else {
        Err(ActionRejected::Forbidden)
    }
}

/// Login with credentials that already passed the form checks.
#[derive(Debug)]
pub struct LoginRequest {
    pub(crate) ticket: Ticket,
    pub credentials: Credentials,
}

impl LoginRequest {
    pub(crate) fn begin(gate: &mut InFlight, credentials: Credentials) -> Result<Self, ActionRejected> {
        let ticket = gate.begin(Action::Authenticate)?;
        Ok(Self { ticket, credentials })
    }
}

#[async_trait]
impl Outbound for LoginRequest {
    type Reply = Identity;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<Identity> {
        api.login(&self.credentials).await
    }
}

#[derive(Debug)]
pub struct SignupRequest {
    pub(crate) ticket: Ticket,
    pub registration: Registration,
}

impl SignupRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        registration: Registration,
    ) -> Result<Self, ActionRejected> {
        let ticket = gate.begin(Action::Authenticate)?;
        Ok(Self { ticket, registration })
    }
}

#[async_trait]
impl Outbound for SignupRequest {
    type Reply = Identity;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<Identity> {
        api.signup(&self.registration).await
    }
}

#[derive(Debug)]
pub struct VoteRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
    pub kind: VoteKind,
}

impl VoteRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
        kind: VoteKind,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        let ticket = gate.begin(Action::Vote(post_id))?;
        Ok(Self { ticket, post_id, kind })
    }
}

#[async_trait]
impl Outbound for VoteRequest {
    type Reply = VoteTally;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<VoteTally> {
        api.vote(self.post_id, self.kind).await
    }
}

#[derive(Debug)]
pub struct ReportRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
    pub reason: String,
}

impl ReportRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
        reason: &str,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        validation::check(Field::Reason, validation::report_reason(reason))?;
        let ticket = gate.begin(Action::Report(post_id))?;
        Ok(Self {
            ticket,
            post_id,
            reason: reason.trim().to_string(),
        })
    }
}

#[async_trait]
impl Outbound for ReportRequest {
    type Reply = FiledReport;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<FiledReport> {
        api.file_report(self.post_id, &self.reason).await
    }
}

#[derive(Debug)]
pub struct CommentRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
    pub content: String,
}

impl CommentRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
        content: &str,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        validation::check(Field::Comment, validation::comment(content))?;
        let ticket = gate.begin(Action::Comment(post_id))?;
        Ok(Self {
            ticket,
            post_id,
            content: content.trim().to_string(),
        })
    }
}

#[async_trait]
impl Outbound for CommentRequest {
    type Reply = Comment;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<Comment> {
        api.create_comment(self.post_id, &self.content).await
    }
}

#[derive(Debug)]
pub struct CommentEditRequest {
    pub(crate) ticket: Ticket,
    pub comment_id: CommentId,
    pub content: String,
}

impl CommentEditRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        comment_id: CommentId,
        content: &str,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        validation::check(Field::Comment, validation::comment(content))?;
        let ticket = gate.begin(Action::EditComment(comment_id))?;
        Ok(Self {
            ticket,
            comment_id,
            content: content.trim().to_string(),
        })
    }
}

#[async_trait]
impl Outbound for CommentEditRequest {
    type Reply = Comment;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<Comment> {
        api.update_comment(self.comment_id, &self.content).await
    }
}

#[derive(Debug)]
pub struct CommentDeleteRequest {
    pub(crate) ticket: Ticket,
    pub comment_id: CommentId,
}

impl CommentDeleteRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        comment_id: CommentId,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        let ticket = gate.begin(Action::DeleteComment(comment_id))?;
        Ok(Self { ticket, comment_id })
    }
}

#[async_trait]
impl Outbound for CommentDeleteRequest {
    type Reply = ();

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<()> {
        api.delete_comment(self.comment_id).await
    }
}

#[derive(Debug)]
pub struct PostingCreateRequest {
    pub(crate) ticket: Ticket,
    pub draft: PostingDraft,
}

impl PostingCreateRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        draft: PostingDraft,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        let ticket = gate.begin(Action::CreatePosting)?;
        Ok(Self { ticket, draft })
    }
}

#[async_trait]
impl Outbound for PostingCreateRequest {
    type Reply = PostingEcho;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<PostingEcho> {
        api.create_posting(&self.draft).await
    }
}

#[derive(Debug)]
pub struct PostingEditRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
    pub draft: PostingDraft,
}

impl PostingEditRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
        draft: PostingDraft,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        let ticket = gate.begin(Action::EditPosting(post_id))?;
        Ok(Self { ticket, post_id, draft })
    }
}

#[async_trait]
impl Outbound for PostingEditRequest {
    type Reply = PostingEcho;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<PostingEcho> {
        api.update_posting(self.post_id, &self.draft).await
    }
}

#[derive(Debug)]
pub struct PostingDeleteRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
}

impl PostingDeleteRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
    ) -> Result<Self, ActionRejected> {
        require_signed_in(session)?;
        let ticket = gate.begin(Action::DeletePosting(post_id))?;
        Ok(Self { ticket, post_id })
    }
}

#[async_trait]
impl Outbound for PostingDeleteRequest {
    type Reply = ();

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<()> {
        api.delete_posting(self.post_id).await
    }
}

#[derive(Debug)]
pub struct ResolveRequest {
    pub(crate) ticket: Ticket,
    pub report_id: ReportId,
    pub action: ResolveAction,
    /// Recorded as the reviewer once the backend confirms.
    pub actor: Option<AuthorRef>,
}

impl ResolveRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        report_id: ReportId,
        action: ResolveAction,
    ) -> Result<Self, ActionRejected> {
        require_admin(session)?;
        let ticket = gate.begin(Action::Resolve(report_id))?;
        let actor = session.identity().map(|identity| AuthorRef {
            id: identity.id,
            username: identity.username.clone(),
        });
        Ok(Self {
            ticket,
            report_id,
            action,
            actor,
        })
    }
}

#[async_trait]
impl Outbound for ResolveRequest {
    type Reply = ();

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<()> {
        api.resolve_report(self.report_id, self.action).await
    }
}

/// Soft-delete or restore from the moderation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Delete,
    Restore,
}

#[derive(Debug)]
pub struct ModerateRequest {
    pub(crate) ticket: Ticket,
    pub post_id: PostId,
    pub op: Moderation,
}

impl ModerateRequest {
    pub(crate) fn begin(
        gate: &mut InFlight,
        session: &SessionStore,
        post_id: PostId,
        op: Moderation,
    ) -> Result<Self, ActionRejected> {
        require_admin(session)?;
        let ticket = gate.begin(Action::Moderate(post_id))?;
        Ok(Self { ticket, post_id, op })
    }
}

#[async_trait]
impl Outbound for ModerateRequest {
    type Reply = ();

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<()> {
        match self.op {
            Moderation::Delete => api.moderate_delete(self.post_id).await,
            Moderation::Restore => api.moderate_restore(self.post_id).await,
        }
    }
}
