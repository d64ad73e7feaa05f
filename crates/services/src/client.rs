//! # Client Session
//!
//! Everything one browser session owns: the backend handle (with its own
//! cookie jar), the session store and the state of each screen. Nothing
//! here is global; the web tier keeps one of these per visitor.

use std::sync::Arc;

use domains::{
    ApiResult, BoardApi, Credentials, Identity, PostId, PostingDraft, PostingEcho, Registration,
};
use tracing::info;

use crate::admin::AdminPanel;
use crate::detail::PostDetailView;
use crate::error::{ActionRejected, FormError};
use crate::inflight::{Action, InFlight};
use crate::listing::PostListView;
use crate::notice::Notice;
use crate::requests::{LoginRequest, PostingCreateRequest, SignupRequest};
use crate::session::SessionStore;

/// Page sizes for the screens of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSizes {
    pub per_page: u32,
    pub admin_per_page: u32,
}

impl Default for ViewSizes {
    fn default() -> Self {
        Self {
            per_page: 20,
            admin_per_page: 50,
        }
    }
}

pub struct ClientSession {
    api: Arc<dyn BoardApi>,
    pub session: SessionStore,
    pub home: PostListView,
    detail: Option<PostDetailView>,
    pub admin: AdminPanel,
    /// Login, signup and the create form. Survives `reset_screens`.
    forms: InFlight,
    notices: Vec<Notice>,
    sizes: ViewSizes,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("session", &self.session)
            .field("detail", &self.detail.as_ref().map(PostDetailView::post_id))
            .finish_non_exhaustive()
    }
}

impl ClientSession {
    pub fn new(api: Arc<dyn BoardApi>, sizes: ViewSizes) -> Self {
        Self {
            api,
            session: SessionStore::new(),
            home: PostListView::new(sizes.per_page),
            detail: None,
            admin: AdminPanel::new(sizes.admin_per_page),
            forms: InFlight::new(),
            notices: Vec::new(),
            sizes,
        }
    }

    pub fn api(&self) -> Arc<dyn BoardApi> {
        Arc::clone(&self.api)
    }

    /// The detail screen for `id`, replacing whatever posting was open
    /// before. Responses still in flight for the old one are discarded when
    /// they come back.
    pub fn open_detail(&mut self, id: PostId) -> &mut PostDetailView {
        if self.detail.as_ref().map(PostDetailView::post_id) != Some(id) {
            self.detail = None;
        }
        self.detail.get_or_insert_with(|| PostDetailView::new(id))
    }

    pub fn detail(&self) -> Option<&PostDetailView> {
        self.detail.as_ref()
    }

    /// The open detail screen, only when it shows `id`.
    pub fn detail_for(&mut self, id: PostId) -> Option<&mut PostDetailView> {
        self.detail.as_mut().filter(|view| view.post_id() == id)
    }

    /// The detail screen for `id` next to the session store, for starting an
    /// action on the posting it shows.
    pub fn detail_and_session(
        &mut self,
        id: PostId,
    ) -> Result<(&mut PostDetailView, &SessionStore), ActionRejected> {
        let view = self
            .detail
            .as_mut()
            .filter(|view| view.post_id() == id)
            .ok_or(ActionRejected::NotLoaded)?;
        Ok((view, &self.session))
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.forms.is_busy(action)
    }

    // ── Forms ────────────────────────────────────────────────────────────────

    /// Credentials must already have passed [`SessionStore::validate_login`].
    pub fn begin_login(&mut self, credentials: Credentials) -> Result<LoginRequest, ActionRejected> {
        LoginRequest::begin(&mut self.forms, credentials)
    }

    pub fn finish_login(
        &mut self,
        request: LoginRequest,
        result: ApiResult<Identity>,
    ) -> Result<(), FormError> {
        self.forms.finish(request.ticket);
        self.session.apply_login(result)?;
        self.reset_screens();
        Ok(())
    }

    pub fn begin_signup(
        &mut self,
        registration: Registration,
    ) -> Result<SignupRequest, ActionRejected> {
        SignupRequest::begin(&mut self.forms, registration)
    }

    pub fn finish_signup(
        &mut self,
        request: SignupRequest,
        result: ApiResult<Identity>,
    ) -> Result<(), FormError> {
        self.forms.finish(request.ticket);
        self.session.apply_signup(result)?;
        self.reset_screens();
        Ok(())
    }

    /// The draft comes from [`crate::PostingForm::validate`].
    pub fn begin_create(
        &mut self,
        draft: PostingDraft,
    ) -> Result<PostingCreateRequest, ActionRejected> {
        PostingCreateRequest::begin(&mut self.forms, &self.session, draft)
    }

    pub fn finish_create(
        &mut self,
        request: PostingCreateRequest,
        result: ApiResult<PostingEcho>,
    ) -> Result<PostingEcho, FormError> {
        self.forms.finish(request.ticket);
        let echo = result.map_err(|err| FormError::from_api(&err, "Failed to create post"))?;
        info!(post_id = %echo.id, "posting created");
        Ok(echo)
    }

    /// Session-wide notices (login, logout, guard redirects).
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drains session notices plus those of every screen.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = std::mem::take(&mut self.notices);
        notices.extend(self.home.take_notices());
        if let Some(detail) = self.detail.as_mut() {
            notices.extend(detail.take_notices());
        }
        notices.extend(self.admin.take_notices());
        notices
    }

    /// Signing out drops every screen's state along with the identity.
    pub async fn logout(&mut self) {
        let api = self.api();
        self.session.logout(api.as_ref()).await;
        self.reset_screens();
    }

    pub fn reset_screens(&mut self) {
        self.home = PostListView::new(self.sizes.per_page);
        self.detail = None;
        self.admin = AdminPanel::new(self.sizes.admin_per_page);
    }
}
