//! # Posting Detail
//!
//! One posting with its comment thread. Every mutation is a begin/finish
//! pair: `begin_*` checks the session and takes the control's ticket,
//! `finish_*` releases it and patches local state from the backend response
//! (or leaves it untouched and records a notice).

use async_trait::async_trait;
use domains::{
    ApiResult, BoardApi, Comment, CommentId, FiledReport, PostDetail, PostId, Posting,
    PostingDraft, PostingEcho, VoteKind, VoteTally,
};
use tracing::{debug, info};

use crate::error::{ActionRejected, FormError};
use crate::inflight::{Action, InFlight, Ticket};
use crate::listing::REPORT_THANKS;
use crate::notice::Notice;
use crate::requests::{
    CommentDeleteRequest, CommentEditRequest, CommentRequest, Outbound, PostingDeleteRequest,
    PostingEditRequest, ReportRequest, VoteRequest,
};
use crate::session::SessionStore;

#[derive(Debug)]
pub struct DetailFetch {
    ticket: Ticket,
    pub post_id: PostId,
}

#[async_trait]
impl Outbound for DetailFetch {
    type Reply = PostDetail;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<PostDetail> {
        api.get_posting(self.post_id).await
    }
}

#[derive(Debug)]
pub struct PostDetailView {
    post_id: PostId,
    posting: Option<Posting>,
    comments: Vec<Comment>,
    error: Option<String>,
    gate: InFlight,
    notices: Vec<Notice>,
    patched: bool,
    removed: bool,
}

impl PostDetailView {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            posting: None,
            comments: Vec::new(),
            error: None,
            gate: InFlight::new(),
            notices: Vec::new(),
            patched: false,
            removed: false,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn posting(&self) -> Option<&Posting> {
        self.posting.as_ref()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_busy(Action::Fetch)
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.gate.is_busy(action)
    }

    /// Set once the posting was deleted from this screen; the caller should
    /// navigate home.
    pub fn was_removed(&self) -> bool {
        self.removed
    }

    /// Like the list: render from local state only right after a patch.
    pub fn needs_fetch(&mut self) -> bool {
        let patched = std::mem::take(&mut self.patched);
        !patched || self.posting.is_none()
    }

    fn loaded(&self) -> Result<&Posting, ActionRejected> {
        self.posting.as_ref().ok_or(ActionRejected::NotLoaded)
    }

    // ── Load ─────────────────────────────────────────────────────────────────

    pub fn begin_load(&mut self) -> Result<DetailFetch, ActionRejected> {
        let ticket = self.gate.begin(Action::Fetch)?;
        Ok(DetailFetch {
            ticket,
            post_id: self.post_id,
        })
    }

    pub fn finish_load(&mut self, fetch: DetailFetch, result: ApiResult<PostDetail>) -> bool {
        self.gate.finish(fetch.ticket);
        if fetch.post_id != self.post_id {
            return false;
        }
        match result {
            Ok(detail) if detail.posting.id == self.post_id => {
                self.posting = Some(detail.posting);
                self.comments = detail.comments;
                self.error = None;
            }
            Ok(detail) => {
                debug!(expected = %self.post_id, got = %detail.posting.id, "detail for another posting");
                return false;
            }
            Err(err) => {
                debug!(post_id = %self.post_id, error = %err, "posting load failed");
                self.posting = None;
                self.comments.clear();
                self.error = Some(err.user_message("Failed to load post"));
            }
        }
        self.patched = false;
        true
    }

    pub async fn load(&mut self, api: &dyn BoardApi) -> Result<(), ActionRejected> {
        let fetch = self.begin_load()?;
        let result = fetch.send(api).await;
        self.finish_load(fetch, result);
        Ok(())
    }

    // ── Vote ─────────────────────────────────────────────────────────────────

    pub fn begin_vote(
        &mut self,
        session: &SessionStore,
        kind: VoteKind,
    ) -> Result<VoteRequest, ActionRejected> {
        self.loaded()?;
        VoteRequest::begin(&mut self.gate, session, self.post_id, kind)
    }

    pub fn finish_vote(&mut self, request: VoteRequest, result: ApiResult<VoteTally>) {
        self.gate.finish(request.ticket);
        match (result, self.posting.as_mut()) {
            (Ok(tally), Some(posting)) => {
                posting.apply_tally(&tally);
                self.patched = true;
            }
            (Ok(_), None) => {}
            (Err(err), _) => {
                debug!(post_id = %request.post_id, error = %err, "vote rejected");
                self.notices.push(Notice::from_api(&err, "Failed to vote"));
            }
        }
    }

    pub async fn vote(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        kind: VoteKind,
    ) -> Result<(), ActionRejected> {
        let request = self.begin_vote(session, kind)?;
        let result = request.send(api).await;
        self.finish_vote(request, result);
        Ok(())
    }

    // ── Comments ─────────────────────────────────────────────────────────────

    pub fn begin_comment(
        &mut self,
        session: &SessionStore,
        content: &str,
    ) -> Result<CommentRequest, ActionRejected> {
        self.loaded()?;
        CommentRequest::begin(&mut self.gate, session, self.post_id, content)
    }

    /// Appends the server's comment and bumps the count by exactly one.
    pub fn finish_comment(&mut self, request: CommentRequest, result: ApiResult<Comment>) {
        self.gate.finish(request.ticket);
        match result {
            Ok(comment) => {
                if self.comments.iter().any(|c| c.id == comment.id) {
                    return;
                }
                if let Some(posting) = self.posting.as_mut() {
                    posting.comment_count = posting.comment_count.saturating_add(1);
                }
                self.comments.push(comment);
                self.patched = true;
            }
            Err(err) => {
                self.notices.push(Notice::from_api(&err, "Failed to add comment"));
            }
        }
    }

    pub async fn add_comment(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        content: &str,
    ) -> Result<(), ActionRejected> {
        let request = self.begin_comment(session, content)?;
        let result = request.send(api).await;
        self.finish_comment(request, result);
        Ok(())
    }

    fn editable_comment(&self, id: CommentId) -> Result<&Comment, ActionRejected> {
        let comment = self.comment(id).ok_or(ActionRejected::NotLoaded)?;
        if comment.can_edit {
            Ok(comment)
        } else {
            Err(ActionRejected::Forbidden)
        }
    }

    pub fn begin_edit_comment(
        &mut self,
        session: &SessionStore,
        id: CommentId,
        content: &str,
    ) -> Result<CommentEditRequest, ActionRejected> {
        self.editable_comment(id)?;
        CommentEditRequest::begin(&mut self.gate, session, id, content)
    }

    pub fn finish_edit_comment(&mut self, request: CommentEditRequest, result: ApiResult<Comment>) {
        self.gate.finish(request.ticket);
        match result {
            Ok(updated) => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.id == request.comment_id) {
                    comment.content = updated.content;
                    self.patched = true;
                }
            }
            Err(err) => {
                self.notices.push(Notice::from_api(&err, "Failed to update comment"));
            }
        }
    }

    pub fn begin_delete_comment(
        &mut self,
        session: &SessionStore,
        id: CommentId,
    ) -> Result<CommentDeleteRequest, ActionRejected> {
        self.editable_comment(id)?;
        CommentDeleteRequest::begin(&mut self.gate, session, id)
    }

    pub fn finish_delete_comment(&mut self, request: CommentDeleteRequest, result: ApiResult<()>) {
        self.gate.finish(request.ticket);
        match result {
            Ok(()) => {
                let before = self.comments.len();
                self.comments.retain(|c| c.id != request.comment_id);
                if self.comments.len() < before {
                    if let Some(posting) = self.posting.as_mut() {
                        posting.comment_count = posting.comment_count.saturating_sub(1);
                    }
                    self.patched = true;
                }
            }
            Err(err) => {
                self.notices.push(Notice::from_api(&err, "Failed to delete comment"));
            }
        }
    }

    // ── Posting edit / delete ────────────────────────────────────────────────

    fn editable_posting(&self) -> Result<(), ActionRejected> {
        if self.loaded()?.can_edit {
            Ok(())
        } else {
            Err(ActionRejected::Forbidden)
        }
    }

    pub fn begin_edit_posting(
        &mut self,
        session: &SessionStore,
        draft: PostingDraft,
    ) -> Result<PostingEditRequest, ActionRejected> {
        self.editable_posting()?;
        PostingEditRequest::begin(&mut self.gate, session, self.post_id, draft)
    }

    /// The edit form shows the failure inline, so it comes back as a
    /// [`FormError`] instead of a notice.
    pub fn finish_edit_posting(
        &mut self,
        request: PostingEditRequest,
        result: ApiResult<PostingEcho>,
    ) -> Result<(), FormError> {
        self.gate.finish(request.ticket);
        match result {
            Ok(echo) => {
                if let Some(posting) = self.posting.as_mut() {
                    posting.apply_echo(&echo);
                    self.patched = true;
                }
                info!(post_id = %request.post_id, "posting updated");
                Ok(())
            }
            Err(err) => Err(FormError::from_api(&err, "Failed to update post")),
        }
    }

    pub fn begin_delete_posting(
        &mut self,
        session: &SessionStore,
    ) -> Result<PostingDeleteRequest, ActionRejected> {
        self.editable_posting()?;
        PostingDeleteRequest::begin(&mut self.gate, session, self.post_id)
    }

    pub fn finish_delete_posting(&mut self, request: PostingDeleteRequest, result: ApiResult<()>) {
        self.gate.finish(request.ticket);
        match result {
            Ok(()) => {
                info!(post_id = %request.post_id, "posting deleted");
                self.removed = true;
            }
            Err(err) => {
                self.notices.push(Notice::from_api(&err, "Failed to delete post"));
            }
        }
    }

    // ── Report ───────────────────────────────────────────────────────────────

    pub fn begin_report(
        &mut self,
        session: &SessionStore,
        reason: &str,
    ) -> Result<ReportRequest, ActionRejected> {
        self.loaded()?;
        ReportRequest::begin(&mut self.gate, session, self.post_id, reason)
    }

    pub fn finish_report(&mut self, request: ReportRequest, result: ApiResult<FiledReport>) {
        self.gate.finish(request.ticket);
        self.notices.push(match result {
            Ok(_) => Notice::info(REPORT_THANKS),
            Err(err) => Notice::from_api(&err, "Failed to report post"),
        });
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domains::{ApiError, AuthorRef, Identity, MockBoardApi, PostStatus, Role, UserId};

    fn author() -> AuthorRef {
        AuthorRef { id: UserId(9), username: "ada".into() }
    }

    fn detail(id: i64, comments: usize) -> PostDetail {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        PostDetail {
            posting: Posting {
                id: PostId(id),
                title: "Data platform intern".into(),
                description: "Build ingestion jobs with the analytics team.".into(),
                company: None,
                link: "https://example.com/apply".into(),
                tags: Default::default(),
                author: author(),
                vote_score: 2,
                own_vote: None,
                comment_count: comments as u32,
                created_at: at,
                updated_at: at,
                status: PostStatus::Active,
                can_edit: true,
            },
            comments: (0..comments)
                .map(|i| Comment {
                    id: CommentId(100 + i as i64),
                    content: format!("comment {i}"),
                    author: author(),
                    created_at: at,
                    can_edit: true,
                })
                .collect(),
        }
    }

    fn member() -> SessionStore {
        let mut store = SessionStore::new();
        let _ = store.apply_login(Ok(Identity {
            id: UserId(9),
            username: "ada".into(),
            email: None,
            role: Role::Member,
            created_at: None,
        }));
        store
    }

    fn loaded(id: i64, comments: usize) -> PostDetailView {
        let mut view = PostDetailView::new(PostId(id));
        let fetch = view.begin_load().unwrap();
        assert!(view.finish_load(fetch, Ok(detail(id, comments))));
        view
    }

    #[tokio::test]
    async fn comment_appends_server_copy_and_counts_once() {
        let mut api = MockBoardApi::new();
        api.expect_create_comment().times(1).returning(|_, content| {
            Ok(Comment {
                id: CommentId(777),
                content: content.to_string(),
                author: AuthorRef { id: UserId(9), username: "ada".into() },
                created_at: Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap(),
                can_edit: true,
            })
        });

        let session = member();
        let mut view = loaded(7, 2);
        view.add_comment(&api, &session, "  Applied last week, great team  ")
            .await
            .unwrap();

        assert_eq!(view.posting().unwrap().comment_count, 3);
        let last = view.comments().last().unwrap();
        assert_eq!(last.id, CommentId(777));
        assert_eq!(last.content, "Applied last week, great team");
    }

    #[test]
    fn failed_comment_changes_nothing() {
        let session = member();
        let mut view = loaded(7, 1);
        let request = view.begin_comment(&session, "hello there").unwrap();
        view.finish_comment(request, Err(ApiError::Network("timed out".into())));

        assert_eq!(view.comments().len(), 1);
        assert_eq!(view.posting().unwrap().comment_count, 1);
        assert_eq!(view.take_notices(), vec![Notice::error("Failed to add comment")]);
    }

    #[test]
    fn blank_comment_is_rejected_before_sending() {
        let session = member();
        let mut view = loaded(7, 0);
        assert!(matches!(
            view.begin_comment(&session, "   "),
            Err(ActionRejected::Invalid(_))
        ));
        assert!(!view.is_busy(Action::Comment(PostId(7))));
    }

    #[test]
    fn deleting_a_comment_decrements_without_underflow() {
        let session = member();
        let mut view = loaded(7, 1);
        view.posting.as_mut().unwrap().comment_count = 0;

        let request = view.begin_delete_comment(&session, CommentId(100)).unwrap();
        view.finish_delete_comment(request, Ok(()));
        assert!(view.comments().is_empty());
        assert_eq!(view.posting().unwrap().comment_count, 0);
    }

    #[test]
    fn edit_comment_takes_server_content() {
        let session = member();
        let mut view = loaded(7, 1);
        let request = view.begin_edit_comment(&session, CommentId(100), "edited").unwrap();
        let mut updated = view.comment(CommentId(100)).unwrap().clone();
        updated.content = "edited (server)".into();
        view.finish_edit_comment(request, Ok(updated));
        assert_eq!(view.comment(CommentId(100)).unwrap().content, "edited (server)");
    }

    #[test]
    fn vote_applies_tally() {
        let session = member();
        let mut view = loaded(7, 0);
        let request = view.begin_vote(&session, VoteKind::Down).unwrap();
        view.finish_vote(
            request,
            Ok(VoteTally { post_id: PostId(7), score: 1, own_vote: Some(VoteKind::Down) }),
        );
        let posting = view.posting().unwrap();
        assert_eq!((posting.vote_score, posting.own_vote), (1, Some(VoteKind::Down)));
    }

    #[test]
    fn delete_posting_flags_navigation_only_on_success() {
        let session = member();
        let mut view = loaded(7, 0);

        let request = view.begin_delete_posting(&session).unwrap();
        view.finish_delete_posting(
            request,
            Err(ApiError::Http { status: 403, message: Some("Not authorized".into()) }),
        );
        assert!(!view.was_removed());
        assert_eq!(view.take_notices(), vec![Notice::error("Not authorized")]);

        let request = view.begin_delete_posting(&session).unwrap();
        view.finish_delete_posting(request, Ok(()));
        assert!(view.was_removed());
    }

    #[test]
    fn others_postings_cannot_be_edited() {
        let session = member();
        let mut view = loaded(7, 0);
        view.posting.as_mut().unwrap().can_edit = false;
        assert_eq!(
            view.begin_delete_posting(&session).unwrap_err(),
            ActionRejected::Forbidden
        );
    }

    #[test]
    fn load_failure_uses_fallback() {
        let mut view = PostDetailView::new(PostId(3));
        let fetch = view.begin_load().unwrap();
        view.finish_load(fetch, Err(ApiError::Http { status: 404, message: None }));
        assert_eq!(view.error(), Some("Failed to load post"));
        assert!(view.posting().is_none());
    }
}
