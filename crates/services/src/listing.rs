//! # Posting List
//!
//! Home screen state: filters, the current page of cards and the pagination
//! controls. Votes and reports issued from a card follow the same rule as
//! everywhere else: the card changes only after the backend confirms, and
//! only to the values the backend returned.

use async_trait::async_trait;
use domains::{
    wire, ApiResult, BoardApi, FiledReport, Pagination, PostId, PostPage, PostQuery, Posting,
    SortOrder, VoteKind, VoteTally,
};
use serde::Serialize;
use tracing::debug;

use crate::error::ActionRejected;
use crate::inflight::{Action, InFlight, Ticket};
use crate::notice::Notice;
use crate::requests::{Outbound, ReportRequest, VoteRequest};
use crate::session::SessionStore;

pub const REPORT_THANKS: &str =
    "Post reported successfully. Thank you for helping keep the community clean.";

/// What the visitor typed or picked. `search` and `tags` are kept raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub search: String,
    pub tags: String,
    pub sort: SortOrder,
    pub page: u32,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            tags: String::new(),
            sort: SortOrder::Recent,
            page: 1,
        }
    }
}

/// State of the prev/next controls under the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub page: u32,
    pub pages: u32,
    /// Hidden entirely when everything fits on one page.
    pub visible: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug)]
pub struct PostFetch {
    ticket: Ticket,
    pub query: PostQuery,
}

#[async_trait]
impl Outbound for PostFetch {
    type Reply = PostPage;

    async fn send(&self, api: &dyn BoardApi) -> ApiResult<PostPage> {
        api.list_postings(&self.query).await
    }
}

#[derive(Debug)]
pub struct PostListView {
    filters: ListFilters,
    per_page: u32,
    posts: Vec<Posting>,
    pagination: Option<Pagination>,
    error: Option<String>,
    gate: InFlight,
    notices: Vec<Notice>,
    /// Query of the page currently held.
    shown: Option<PostQuery>,
    patched: bool,
}

impl PostListView {
    pub fn new(per_page: u32) -> Self {
        Self {
            filters: ListFilters::default(),
            per_page,
            posts: Vec::new(),
            pagination: None,
            error: None,
            gate: InFlight::new(),
            notices: Vec::new(),
            shown: None,
            patched: false,
        }
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    /// The query the current filters translate to. Blank search and tag
    /// inputs are left out; tags are normalised before being joined.
    pub fn query(&self) -> PostQuery {
        let search = self.filters.search.trim();
        let tags = wire::join_tags(&wire::parse_tags(&self.filters.tags));
        PostQuery {
            page: self.filters.page,
            per_page: self.per_page,
            search: (!search.is_empty()).then(|| search.to_string()),
            tags: (!tags.is_empty()).then_some(tags),
            sort: self.filters.sort,
        }
    }

    pub fn cards(&self) -> &[Posting] {
        &self.posts
    }

    pub fn card(&self, id: PostId) -> Option<&Posting> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.pagination.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.gate.is_busy(Action::Fetch)
    }

    pub fn is_voting(&self, id: PostId) -> bool {
        self.gate.is_busy(Action::Vote(id))
    }

    pub fn is_reporting(&self, id: PostId) -> bool {
        self.gate.is_busy(Action::Report(id))
    }

    pub fn pagination(&self) -> PaginationControls {
        let page = self.filters.page;
        let pages = self.pagination.map_or(1, |p| p.pages.max(1));
        let idle = !self.is_fetching();
        PaginationControls {
            page,
            pages,
            visible: pages > 1,
            prev_enabled: idle && page > 1,
            next_enabled: idle && page < pages,
        }
    }

    // ── Filters ──────────────────────────────────────────────────────────────

    /// Submitting the search form always starts again from page 1.
    pub fn apply_search(&mut self, search: impl Into<String>, tags: impl Into<String>) {
        self.filters.search = search.into();
        self.filters.tags = tags.into();
        self.filters.page = 1;
    }

    /// Keeps the current page.
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.filters.sort = sort;
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.filters.page = page.max(1);
    }

    pub fn next_page(&mut self) -> bool {
        let controls = self.pagination();
        if controls.next_enabled {
            self.filters.page += 1;
        }
        controls.next_enabled
    }

    pub fn previous_page(&mut self) -> bool {
        let controls = self.pagination();
        if controls.prev_enabled {
            self.filters.page -= 1;
        }
        controls.prev_enabled
    }

    /// True when the page must be fetched again before it is shown: nothing
    /// loaded yet, the query moved since the last fetch, or no mutation has
    /// patched the cards since they were last rendered.
    pub fn needs_fetch(&mut self) -> bool {
        let patched = std::mem::take(&mut self.patched);
        !patched || self.shown.as_ref() != Some(&self.query())
    }

    // ── Fetch ────────────────────────────────────────────────────────────────

    pub fn begin_fetch(&mut self) -> Result<PostFetch, ActionRejected> {
        let ticket = self.gate.begin(Action::Fetch)?;
        Ok(PostFetch {
            ticket,
            query: self.query(),
        })
    }

    /// Returns false when the filters moved on while the request was out and
    /// the response was discarded.
    pub fn finish_fetch(&mut self, fetch: PostFetch, result: ApiResult<PostPage>) -> bool {
        self.gate.finish(fetch.ticket);
        if fetch.query != self.query() {
            debug!(page = fetch.query.page, "discarding stale posting page");
            return false;
        }
        match result {
            Ok(page) => {
                self.filters.page = page.pagination.page.max(1);
                self.posts = page.posts;
                self.pagination = Some(page.pagination);
                self.error = None;
                self.shown = Some(self.query());
            }
            Err(err) => {
                debug!(error = %err, "posting list fetch failed");
                self.error = Some(err.user_message("Failed to load posts"));
            }
        }
        self.patched = false;
        true
    }

    pub async fn refresh(&mut self, api: &dyn BoardApi) -> Result<(), ActionRejected> {
        let fetch = self.begin_fetch()?;
        let result = fetch.send(api).await;
        self.finish_fetch(fetch, result);
        Ok(())
    }

    // ── Card actions ─────────────────────────────────────────────────────────

    pub fn begin_vote(
        &mut self,
        session: &SessionStore,
        id: PostId,
        kind: VoteKind,
    ) -> Result<VoteRequest, ActionRejected> {
        if self.card(id).is_none() {
            return Err(ActionRejected::NotLoaded);
        }
        VoteRequest::begin(&mut self.gate, session, id, kind)
    }

    pub fn finish_vote(&mut self, request: VoteRequest, result: ApiResult<VoteTally>) {
        self.gate.finish(request.ticket);
        match result {
            Ok(tally) => {
                if let Some(card) = self.posts.iter_mut().find(|p| p.id == tally.post_id) {
                    card.apply_tally(&tally);
                    self.patched = true;
                }
            }
            Err(err) => {
                debug!(post_id = %request.post_id, error = %err, "vote rejected");
                self.notices.push(Notice::from_api(&err, "Failed to vote"));
            }
        }
    }

    pub async fn vote(
        &mut self,
        api: &dyn BoardApi,
        session: &SessionStore,
        id: PostId,
        kind: VoteKind,
    ) -> Result<(), ActionRejected> {
        let request = self.begin_vote(session, id, kind)?;
        let result = request.send(api).await;
        self.finish_vote(request, result);
        Ok(())
    }

    pub fn begin_report(
        &mut self,
        session: &SessionStore,
        id: PostId,
        reason: &str,
    ) -> Result<ReportRequest, ActionRejected> {
        if self.card(id).is_none() {
            return Err(ActionRejected::NotLoaded);
        }
        ReportRequest::begin(&mut self.gate, session, id, reason)
    }

    pub fn finish_report(&mut self, request: ReportRequest, result: ApiResult<FiledReport>) {
        self.gate.finish(request.ticket);
        self.notices.push(match result {
            Ok(_) => Notice::info(REPORT_THANKS),
            Err(err) => Notice::from_api(&err, "Failed to report post"),
        });
    }

    // ── Notices ──────────────────────────────────────────────────────────────

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
