//! # Domain Models
//!
//! Canonical shapes of the entities the board backend owns. The client only
//! ever holds possibly-stale copies of these; every field is whatever the
//! backend last returned.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Backend-assigned user identifier.
    UserId
);
id_type!(
    /// Backend-assigned posting identifier.
    PostId
);
id_type!(CommentId);
id_type!(ReportId);

/// Account role. Admin is a superset of moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Stored as `user` by the backend.
    #[serde(rename = "user", alias = "member")]
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// True for moderators and admins.
    pub fn is_moderator(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// The signed-in account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    /// Login and signup responses omit it; `/auth/me` includes it.
    pub email: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }
}

/// Reference to the author/reporter/reviewer of something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteKind::Up => "up",
            VoteKind::Down => "down",
        }
    }
}

/// Server-computed vote state for one posting after a vote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    pub post_id: PostId,
    pub score: i64,
    pub own_vote: Option<VoteKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Deleted,
    Expired,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Deleted => "deleted",
            PostStatus::Expired => "expired",
        }
    }
}

/// An internship posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub link: String,
    pub tags: BTreeSet<String>,
    pub author: AuthorRef,
    /// Signed aggregate computed by the backend. Never recomputed locally.
    pub vote_score: i64,
    pub own_vote: Option<VoteKind>,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: PostStatus,
    pub can_edit: bool,
}

impl Posting {
    /// Replaces score and own vote with exactly what the backend returned.
    pub fn apply_tally(&mut self, tally: &VoteTally) {
        if tally.post_id == self.id {
            self.vote_score = tally.score;
            self.own_vote = tally.own_vote;
        }
    }

    /// Patches the editable fields from a create/update response.
    pub fn apply_echo(&mut self, echo: &PostingEcho) {
        if echo.id != self.id {
            return;
        }
        self.title = echo.title.clone();
        self.description = echo.description.clone();
        self.company = echo.company.clone();
        self.link = echo.link.clone();
        self.tags = echo.tags.clone();
        if let Some(updated_at) = echo.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// The editable fields the backend echoes back from create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingEcho {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub link: String,
    pub tags: BTreeSet<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: AuthorRef,
    pub created_at: DateTime<Utc>,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
        }
    }
}

/// The slice of a posting a report carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedPosting {
    pub id: PostId,
    pub title: String,
    pub author: AuthorRef,
    pub status: PostStatus,
}

/// A moderation flag against a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub posting: ReportedPosting,
    pub reporter: AuthorRef,
    pub reason: String,
    pub status: ReportStatus,
    pub resolved_by: Option<AuthorRef>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// What `POST /reports` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiledReport {
    pub id: ReportId,
    pub reason: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// How a moderator closes a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    Dismiss,
    DeletePost,
    ExpirePost,
}

impl ResolveAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolveAction::Dismiss => "dismiss",
            ResolveAction::DeletePost => "delete_post",
            ResolveAction::ExpirePost => "expire_post",
        }
    }

    /// Status the reported posting ends up in once the backend confirms.
    pub fn resulting_status(self) -> Option<PostStatus> {
        match self {
            ResolveAction::Dismiss => None,
            ResolveAction::DeletePost => Some(PostStatus::Deleted),
            ResolveAction::ExpirePost => Some(PostStatus::Expired),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<Posting>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetail {
    pub posting: Posting,
    pub comments: Vec<Comment>,
}

/// A row of the moderation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPosting {
    pub posting: Posting,
    /// Pending reports against the posting.
    pub report_count: u32,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub post_count: u32,
    pub created_at: DateTime<Utc>,
}

// ── Queries ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Recent,
    Popular,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Recent => "recent",
            SortOrder::Popular => "popular",
        }
    }
}

/// Filters for `GET /posts`. Serializes straight into the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Comma separated; the backend requires every listed tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    pub sort: SortOrder,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            search: None,
            tags: None,
            sort: SortOrder::Recent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFilter {
    #[default]
    Pending,
    Resolved,
    All,
}

impl ReportFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFilter::Pending => "pending",
            ReportFilter::Resolved => "resolved",
            ReportFilter::All => "all",
        }
    }

    pub fn admits(self, status: ReportStatus) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::Pending => status == ReportStatus::Pending,
            ReportFilter::Resolved => status == ReportStatus::Resolved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFilter {
    #[default]
    All,
    Active,
    Deleted,
    Expired,
}

impl PostFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            PostFilter::All => "all",
            PostFilter::Active => "active",
            PostFilter::Deleted => "deleted",
            PostFilter::Expired => "expired",
        }
    }

    pub fn admits(self, status: PostStatus) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Active => status == PostStatus::Active,
            PostFilter::Deleted => status == PostStatus::Deleted,
            PostFilter::Expired => status == PostStatus::Expired,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub status: ReportFilter,
    pub per_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminPostQuery {
    pub status: PostFilter,
    pub per_page: u32,
}

// ── Inputs ───────────────────────────────────────────────────────────────────

/// Login form payload. The password stays wrapped until the request is built.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// A validated posting ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingDraft {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub link: String,
    pub tags: BTreeSet<String>,
}
