//! # Moderation Panel
//!
//! Two tabs over the moderation endpoints: the report queue and the table
//! of every posting. Rows change only once the backend confirms an action;
//! a row the current filter no longer admits is dropped.

use async_trait::async_trait;
use domains::{
    AdminPostQuery, AdminPosting, ApiResult, BoardApi, PostFilter, PostId, PostStatus, Report,
    ReportFilter, ReportId, ReportQuery, ReportStatus, ResolveAction,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ActionRejected;
use crate::inflight::{Action, InFlight, Ticket};
use crate::notice::Notice;
use crate::requests::{ModerateRequest, Moderation, Outbound, ResolveRequest};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Reports,
    Postings,
}

impl AdminTab {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminTab::Reports => "reports",
            AdminTab::Postings => "postings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminQuery {
    Reports(ReportQuery),
    Postings(AdminPostQuery),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRows {
    Reports(Vec<Report>),
    Postings(Vec<AdminPosting>),
}

#[derive(Debug)]
pub struct AdminFetch {
    ticket: Ticket,
    pub query: AdminQuery,
}

#[async_trait]
impl Outbound for AdminFetch {
    type Reply = AdminRows;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<AdminRows> {
        match &self.query {
            AdminQuery::Reports(query) => api.list_reports(query).await.map(AdminRows::Reports),
            AdminQuery::Postings(query) => {
                api.list_admin_postings(query).await.map(AdminRows::Postings)
            }
        }
    }
}

#[derive(Debug)]
pub struct AdminPanel {
    tab: AdminTab,
    report_filter: ReportFilter,
    post_filter: PostFilter,
    per_page: u32,
    reports: Vec<Report>,
    postings: Vec<AdminPosting>,
    error: Option<String>,
    gate: InFlight,
    notices: Vec<Notice>,
    shown: Option<AdminQuery>,
    patched: bool,
}

impl AdminPanel {
    pub fn new(per_page: u32) -> Self {
        Self {
            tab: AdminTab::default(),
            report_filter: ReportFilter::default(),
            post_filter: PostFilter::default(),
            per_page,
            reports: Vec::new(),
            postings: Vec::new(),
            error: None,
            gate: InFlight::new(),
            notices: Vec::new(),
            shown: None,
            patched: false,
        }
    }

    pub fn tab(&self) -> AdminTab {
        self.tab
    }

    pub fn report_filter(&self) -> ReportFilter {
        self.report_filter
    }

    pub fn post_filter(&self) -> PostFilter {
        self.post_filter
    }

    pub fn set_tab(&mut self, tab: AdminTab) {
        self.tab = tab;
    }

    pub fn set_report_filter(&mut self, filter: ReportFilter) {
        self.report_filter = filter;
    }

    pub fn set_post_filter(&mut self, filter: PostFilter) {
        self.post_filter = filter;
    }

    pub fn query(&self) -> AdminQuery {
        match self.tab {
            AdminTab::Reports => AdminQuery::Reports(ReportQuery {
                status: self.report_filter,
                per_page: self.per_page,
            }),
            AdminTab::Postings => AdminQuery::Postings(AdminPostQuery {
                status: self.post_filter,
                per_page: self.per_page,
            }),
        }
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn postings(&self) -> &[AdminPosting] {
        &self.postings
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.gate.is_busy(Action::Fetch)
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.gate.is_busy(action)
    }

    pub fn needs_fetch(&mut self) -> bool {
        let patched = std::mem::take(&mut self.patched);
        !patched || self.shown != Some(self.query())
    }

    // ── Fetch ────────────────────────────────────────────────────────────────

    pub fn begin_fetch(&mut self, session: &SessionStore) -> Result<AdminFetch, ActionRejected> {
        if !session.is_admin() {
            return Err(ActionRejected::Forbidden);
        }
        let ticket = self.gate.begin(Action::Fetch)?;
        Ok(AdminFetch {
            ticket,
            query: self.query(),
        })
    }

    /// Discards the rows when the tab or filter changed while they were in
    /// flight.
    pub fn finish_fetch(&mut self, fetch: AdminFetch, result: ApiResult<AdminRows>) -> bool {
        self.gate.finish(fetch.ticket);
        if fetch.query != self.query() {
            debug!("discarding stale moderation rows");
            return false;
        }
        match result {
            Ok(AdminRows::Reports(reports)) => {
                self.reports = reports;
                self.error = None;
                self.shown = Some(fetch.query);
            }
            Ok(AdminRows::Postings(postings)) => {
                self.postings = postings;
                self.error = None;
                self.shown = Some(fetch.query);
            }
            Err(err) => {
                let fallback = match self.tab {
                    AdminTab::Reports => "Failed to load reports",
                    AdminTab::Postings => "Failed to load posts",
                };
                debug!(error = %err, "moderation fetch failed");
                self.error = Some(err.user_message(fallback));
            }
        }
        self.patched = false;
        true
    }

    pub async fn refresh(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
    ) -> Result<(), ActionRejected> {
        let fetch = self.begin_fetch(session)?;
        let result = fetch.send(api).await;
        self.finish_fetch(fetch, result);
        Ok(())
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    pub fn begin_resolve(
        &mut self,
        session: &SessionStore,
        id: ReportId,
        action: ResolveAction,
    ) -> Result<ResolveRequest, ActionRejected> {
        if !self.reports.iter().any(|r| r.id == id) {
            return Err(ActionRejected::NotLoaded);
        }
        ResolveRequest::begin(&mut self.gate, session, id, action)
    }

    pub fn finish_resolve(&mut self, request: ResolveRequest, result: ApiResult<()>) {
        self.gate.finish(request.ticket);
        if let Err(err) = result {
            debug!(report_id = %request.report_id, error = %err, "resolve rejected");
            self.notices.push(Notice::error(match err.server_message() {
                Some(message) => format!("Failed to resolve report: {message}"),
                None => "Failed to resolve report".to_string(),
            }));
            return;
        }

        info!(report_id = %request.report_id, action = request.action.as_str(), "report resolved");
        let new_status = request.action.resulting_status();
        let mut affected = None;
        if let Some(report) = self.reports.iter_mut().find(|r| r.id == request.report_id) {
            report.status = ReportStatus::Resolved;
            report.resolved_by = request.actor.clone();
            if let Some(status) = new_status {
                report.posting.status = status;
                affected = Some(report.posting.id);
            }
        }
        if let (Some(post_id), Some(status)) = (affected, new_status) {
            self.set_posting_status(post_id, status);
        }
        let filter = self.report_filter;
        self.reports.retain(|r| filter.admits(r.status));
        self.patched = true;
    }

    pub async fn resolve(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        id: ReportId,
        action: ResolveAction,
    ) -> Result<(), ActionRejected> {
        let request = self.begin_resolve(session, id, action)?;
        let result = request.send(api).await;
        self.finish_resolve(request, result);
        Ok(())
    }

    // ── Postings ─────────────────────────────────────────────────────────────

    pub fn begin_moderate(
        &mut self,
        session: &SessionStore,
        id: PostId,
        op: Moderation,
    ) -> Result<ModerateRequest, ActionRejected> {
        if !self.postings.iter().any(|row| row.posting.id == id) {
            return Err(ActionRejected::NotLoaded);
        }
        ModerateRequest::begin(&mut self.gate, session, id, op)
    }

    pub fn finish_moderate(&mut self, request: ModerateRequest, result: ApiResult<()>) {
        self.gate.finish(request.ticket);
        if let Err(err) = result {
            debug!(post_id = %request.post_id, error = %err, "moderation rejected");
            let fallback = match request.op {
                Moderation::Delete => "Failed to delete post",
                Moderation::Restore => "Failed to restore post",
            };
            self.notices.push(Notice::from_api(&err, fallback));
            return;
        }
        let status = match request.op {
            Moderation::Delete => PostStatus::Deleted,
            Moderation::Restore => PostStatus::Active,
        };
        info!(post_id = %request.post_id, status = status.as_str(), "posting moderated");
        self.set_posting_status(request.post_id, status);
        for report in self.reports.iter_mut().filter(|r| r.posting.id == request.post_id) {
            report.posting.status = status;
        }
        self.patched = true;
    }

    pub async fn delete_posting(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        id: PostId,
    ) -> Result<(), ActionRejected> {
        self.moderate(api, session, id, Moderation::Delete).await
    }

    pub async fn restore_posting(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        id: PostId,
    ) -> Result<(), ActionRejected> {
        self.moderate(api, session, id, Moderation::Restore).await
    }

    async fn moderate(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        id: PostId,
        op: Moderation,
    ) -> Result<(), ActionRejected> {
        let request = self.begin_moderate(session, id, op)?;
        let result = request.send(api).await;
        self.finish_moderate(request, result);
        Ok(())
    }

    fn set_posting_status(&mut self, id: PostId, status: PostStatus) {
        for row in self.postings.iter_mut().filter(|row| row.posting.id == id) {
            row.posting.status = status;
        }
        let filter = self.post_filter;
        self.postings.retain(|row| filter.admits(row.posting.status));
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
    use domains::{
        ApiError, AuthorRef, Identity, MockBoardApi, Posting, ReportedPosting, Role, UserId,
    };

    fn who(id: i64, name: &str) -> AuthorRef {
        AuthorRef { id: UserId(id), username: name.into() }
    }

    fn report(id: i64, post: i64) -> Report {
        Report {
            id: ReportId(id),
            posting: ReportedPosting {
                id: PostId(post),
                title: "Suspicious posting".into(),
                author: who(3, "spammer"),
                status: PostStatus::Active,
            },
            reporter: who(4, "ada"),
            reason: "Looks like a scam".into(),
            status: ReportStatus::Pending,
            resolved_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            resolved_at: None,
        }
    }

    fn row(id: i64, status: PostStatus) -> AdminPosting {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        AdminPosting {
            posting: Posting {
                id: PostId(id),
                title: "Research assistant".into(),
                description: "Assist with a compilers research project.".into(),
                company: None,
                link: "https://uni.example.edu/ra".into(),
                tags: Default::default(),
                author: who(3, "prof"),
                vote_score: 0,
                own_vote: None,
                comment_count: 0,
                created_at: at,
                updated_at: at,
                status,
                can_edit: true,
            },
            report_count: 1,
            approved: true,
        }
    }

    fn signed_in(id: i64, username: &str, role: Role) -> SessionStore {
        let mut store = SessionStore::new();
        let _ = store.apply_login(Ok(Identity {
            id: UserId(id),
            username: username.into(),
            email: None,
            role,
            created_at: None,
        }));
        store
    }

    fn admin() -> SessionStore {
        signed_in(1, "root", Role::Admin)
    }

    fn with_reports(panel: &mut AdminPanel, session: &SessionStore, reports: Vec<Report>) {
        let fetch = panel.begin_fetch(session).unwrap();
        assert!(panel.finish_fetch(fetch, Ok(AdminRows::Reports(reports))));
    }

    #[tokio::test]
    async fn all_filter_is_sent_explicitly() {
        let mut api = MockBoardApi::new();
        api.expect_list_reports()
            .withf(|query| query.status == ReportFilter::All && query.per_page == 50)
            .times(1)
            .returning(|_| Ok(vec![report(1, 10)]));

        let session = admin();
        let mut panel = AdminPanel::new(50);
        panel.set_report_filter(ReportFilter::All);
        panel.refresh(&api, &session).await.unwrap();
        assert_eq!(panel.reports().len(), 1);
    }

    #[test]
    fn only_admins_open_the_panel() {
        let mut panel = AdminPanel::new(50);
        for role in [Role::Member, Role::Moderator] {
            let session = signed_in(2, "grace", role);
            assert_eq!(panel.begin_fetch(&session).unwrap_err(), ActionRejected::Forbidden);
        }
        assert!(!panel.is_fetching());
    }

    #[test]
    fn moderators_cannot_resolve_or_moderate() {
        let mut panel = AdminPanel::new(50);
        with_reports(&mut panel, &admin(), vec![report(1, 10)]);

        let moderator = signed_in(2, "grace", Role::Moderator);
        assert_eq!(
            panel
                .begin_resolve(&moderator, ReportId(1), ResolveAction::Dismiss)
                .unwrap_err(),
            ActionRejected::Forbidden
        );
        assert!(!panel.is_busy(Action::Resolve(ReportId(1))));
    }

    #[test]
    fn fetch_error_shows_the_server_message() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        panel.set_tab(AdminTab::Postings);
        let fetch = panel.begin_fetch(&session).unwrap();
        panel.finish_fetch(
            fetch,
            Err(ApiError::Http { status: 403, message: Some("Admin access required".into()) }),
        );
        assert_eq!(panel.error(), Some("Admin access required"));

        panel.set_tab(AdminTab::Reports);
        let fetch = panel.begin_fetch(&session).unwrap();
        panel.finish_fetch(fetch, Err(ApiError::Http { status: 500, message: None }));
        assert_eq!(panel.error(), Some("Failed to load reports"));
    }

    #[test]
    fn resolved_report_leaves_pending_queue() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        with_reports(&mut panel, &session, vec![report(1, 10), report(2, 11)]);

        let request = panel
            .begin_resolve(&session, ReportId(1), ResolveAction::Dismiss)
            .unwrap();
        assert!(panel.is_busy(Action::Resolve(ReportId(1))));
        panel.finish_resolve(request, Ok(()));

        assert_eq!(panel.reports().len(), 1);
        assert_eq!(panel.reports()[0].id, ReportId(2));
    }

    #[test]
    fn resolving_under_all_filter_patches_in_place() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        panel.set_report_filter(ReportFilter::All);
        with_reports(&mut panel, &session, vec![report(1, 10)]);

        let request = panel
            .begin_resolve(&session, ReportId(1), ResolveAction::ExpirePost)
            .unwrap();
        panel.finish_resolve(request, Ok(()));

        let report = &panel.reports()[0];
        assert_eq!(report.status, ReportStatus::Resolved);
        assert_eq!(report.posting.status, PostStatus::Expired);
        assert_eq!(report.resolved_by, Some(who(1, "root")));
    }

    #[test]
    fn failed_resolve_keeps_row_and_explains() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        with_reports(&mut panel, &session, vec![report(1, 10)]);

        let request = panel
            .begin_resolve(&session, ReportId(1), ResolveAction::DeletePost)
            .unwrap();
        panel.finish_resolve(
            request,
            Err(ApiError::Http { status: 400, message: Some("Report already resolved".into()) }),
        );

        assert_eq!(panel.reports()[0].status, ReportStatus::Pending);
        assert_eq!(
            panel.take_notices(),
            vec![Notice::error("Failed to resolve report: Report already resolved")]
        );
    }

    #[test]
    fn restore_drops_row_from_deleted_filter() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        panel.set_tab(AdminTab::Postings);
        panel.set_post_filter(PostFilter::Deleted);
        let fetch = panel.begin_fetch(&session).unwrap();
        panel.finish_fetch(
            fetch,
            Ok(AdminRows::Postings(vec![row(5, PostStatus::Deleted), row(6, PostStatus::Deleted)])),
        );

        let request = panel.begin_moderate(&session, PostId(5), Moderation::Restore).unwrap();
        panel.finish_moderate(request, Ok(()));
        assert_eq!(panel.postings().len(), 1);
        assert_eq!(panel.postings()[0].posting.id, PostId(6));

        let request = panel.begin_moderate(&session, PostId(6), Moderation::Restore).unwrap();
        panel.finish_moderate(request, Err(ApiError::Network("down".into())));
        assert_eq!(panel.postings().len(), 1);
        assert_eq!(panel.take_notices(), vec![Notice::error("Failed to restore post")]);
    }

    #[test]
    fn moderation_error_shows_the_server_message() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        panel.set_tab(AdminTab::Postings);
        let fetch = panel.begin_fetch(&session).unwrap();
        panel.finish_fetch(fetch, Ok(AdminRows::Postings(vec![row(5, PostStatus::Active)])));

        let request = panel.begin_moderate(&session, PostId(5), Moderation::Delete).unwrap();
        panel.finish_moderate(
            request,
            Err(ApiError::Http { status: 404, message: Some("Post not found".into()) }),
        );

        assert_eq!(panel.postings()[0].posting.status, PostStatus::Active);
        assert_eq!(panel.take_notices(), vec![Notice::error("Post not found")]);
    }

    #[test]
    fn resolve_without_server_message_hides_transport_detail() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        with_reports(&mut panel, &session, vec![report(1, 10)]);

        let request = panel
            .begin_resolve(&session, ReportId(1), ResolveAction::Dismiss)
            .unwrap();
        panel.finish_resolve(request, Err(ApiError::Network("connection reset".into())));

        assert_eq!(panel.take_notices(), vec![Notice::error("Failed to resolve report")]);
    }

    #[test]
    fn switching_tab_mid_fetch_discards_rows() {
        let session = admin();
        let mut panel = AdminPanel::new(50);
        let fetch = panel.begin_fetch(&session).unwrap();
        panel.set_tab(AdminTab::Postings);
        assert!(!panel.finish_fetch(fetch, Ok(AdminRows::Reports(vec![report(1, 10)]))));
        assert!(panel.reports().is_empty());
    }
}
