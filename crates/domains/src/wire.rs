//! # Wire Schema
//!
//! JSON shapes exchanged with the board backend, and their one-time
//! normalisation into the canonical models. Nothing outside this module sees
//! a raw payload: tags arrive as either a list or a comma separated string,
//! timestamps with or without an offset, and several fields are only present
//! on some endpoints.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::models::{
    AdminPosting, AuthorRef, Comment, CommentId, FiledReport, Identity, Pagination, PostDetail,
    PostId, PostPage, PostStatus, Posting, PostingDraft, PostingEcho, Report, ReportId,
    ReportStatus, ReportedPosting, ResolveAction, Role, UserId, UserSummary, VoteKind, VoteTally,
};

/// Parses the backend's ISO-8601 timestamps. Offset-less values are UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| DomainError::Timestamp(raw.to_string()))
}

fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    raw.map(parse_timestamp).transpose()
}

/// Splits a comma separated tag string into the canonical tag set.
pub fn parse_tags(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins a tag set the way the backend stores it.
pub fn join_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn checked_id(raw: i64, what: &'static str) -> Result<i64, DomainError> {
    if raw > 0 {
        Ok(raw)
    } else {
        Err(DomainError::Identifier(raw, what))
    }
}

/// `tags` as the backend happens to send it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    List(Vec<String>),
    Joined(String),
}

impl TagsField {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            TagsField::Joined(joined) => parse_tags(&joined),
            TagsField::List(list) => list
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

fn normalize_tags(field: Option<TagsField>) -> BTreeSet<String> {
    field.map(TagsField::into_set).unwrap_or_default()
}

fn normalize_company(company: Option<String>) -> Option<String> {
    company
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

// ── Raw payloads ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TryFrom<RawUser> for Identity {
    type Error = DomainError;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: UserId(checked_id(raw.id, "user")?),
            username: raw.username,
            email: raw.email,
            role: raw.role,
            created_at: parse_optional_timestamp(raw.created_at.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub id: i64,
    pub username: String,
}

impl TryFrom<RawAuthor> for AuthorRef {
    type Error = DomainError;

    fn try_from(raw: RawAuthor) -> Result<Self, Self::Error> {
        Ok(AuthorRef {
            id: UserId(checked_id(raw.id, "author")?),
            username: raw.username,
        })
    }
}

/// Every endpoint returning postings uses a subset of these fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub company: Option<String>,
    pub link: String,
    #[serde(default)]
    pub tags: Option<TagsField>,
    pub author: RawAuthor,
    #[serde(default)]
    pub vote_score: i64,
    #[serde(default)]
    pub user_vote: Option<VoteKind>,
    #[serde(default)]
    pub comment_count: Option<u32>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Public listings only ever contain active postings and omit it.
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub report_count: Option<u32>,
}

impl RawPost {
    fn into_posting(self, fallback_comment_count: u32) -> Result<Posting, DomainError> {
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_optional_timestamp(self.updated_at.as_deref())?.unwrap_or(created_at);
        Ok(Posting {
            id: PostId(checked_id(self.id, "posting")?),
            title: self.title,
            description: self.description,
            company: normalize_company(self.company),
            link: self.link,
            tags: normalize_tags(self.tags),
            author: self.author.try_into()?,
            vote_score: self.vote_score,
            own_vote: self.user_vote,
            comment_count: self.comment_count.unwrap_or(fallback_comment_count),
            created_at,
            updated_at,
            status: self.status.unwrap_or(PostStatus::Active),
            can_edit: self.can_edit.unwrap_or(false),
        })
    }
}

impl TryFrom<RawPost> for Posting {
    type Error = DomainError;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        raw.into_posting(0)
    }
}

impl TryFrom<RawPost> for AdminPosting {
    type Error = DomainError;

    fn try_from(mut raw: RawPost) -> Result<Self, Self::Error> {
        let report_count = raw.report_count.take().unwrap_or(0);
        let approved = raw.approved.take().unwrap_or(true);
        Ok(AdminPosting {
            posting: raw.into_posting(0)?,
            report_count,
            approved,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEcho {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub company: Option<String>,
    pub link: String,
    #[serde(default)]
    pub tags: Option<TagsField>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<RawEcho> for PostingEcho {
    type Error = DomainError;

    fn try_from(raw: RawEcho) -> Result<Self, Self::Error> {
        Ok(PostingEcho {
            id: PostId(checked_id(raw.id, "posting")?),
            title: raw.title,
            description: raw.description,
            company: normalize_company(raw.company),
            link: raw.link,
            tags: normalize_tags(raw.tags),
            created_at: parse_optional_timestamp(raw.created_at.as_deref())?,
            updated_at: parse_optional_timestamp(raw.updated_at.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: i64,
    pub content: String,
    pub author: RawAuthor,
    pub created_at: String,
    #[serde(default)]
    pub can_edit: Option<bool>,
}

impl RawComment {
    /// `default_can_edit` applies when the endpoint omits the flag.
    pub fn into_comment(self, default_can_edit: bool) -> Result<Comment, DomainError> {
        Ok(Comment {
            id: CommentId(checked_id(self.id, "comment")?),
            content: self.content,
            author: self.author.try_into()?,
            created_at: parse_timestamp(&self.created_at)?,
            can_edit: self.can_edit.unwrap_or(default_can_edit),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReportedPost {
    pub id: i64,
    pub title: String,
    pub author: RawAuthor,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    pub id: i64,
    pub post: RawReportedPost,
    pub reporter: RawAuthor,
    pub reason: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub reviewed_by: Option<RawAuthor>,
    pub created_at: String,
    #[serde(default)]
    pub reviewed_at: Option<String>,
}

impl TryFrom<RawReport> for Report {
    type Error = DomainError;

    fn try_from(raw: RawReport) -> Result<Self, Self::Error> {
        Ok(Report {
            id: ReportId(checked_id(raw.id, "report")?),
            posting: ReportedPosting {
                id: PostId(checked_id(raw.post.id, "posting")?),
                title: raw.post.title,
                author: raw.post.author.try_into()?,
                status: raw.post.status.unwrap_or(PostStatus::Active),
            },
            reporter: raw.reporter.try_into()?,
            reason: raw.reason,
            status: raw.status,
            resolved_by: raw.reviewed_by.map(AuthorRef::try_from).transpose()?,
            created_at: parse_timestamp(&raw.created_at)?,
            resolved_at: parse_optional_timestamp(raw.reviewed_at.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFiledReport {
    pub id: i64,
    pub reason: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub post_count: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTally {
    pub vote_score: i64,
    #[serde(default)]
    pub user_vote: Option<VoteKind>,
}

// ── Response envelopes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: RawUser,
}

impl UserEnvelope {
    pub fn into_identity(self) -> Result<Identity, DomainError> {
        self.user.try_into()
    }
}

#[derive(Debug, Deserialize)]
pub struct PostPageEnvelope {
    pub posts: Vec<RawPost>,
    pub pagination: Pagination,
}

impl PostPageEnvelope {
    pub fn into_page(self) -> Result<PostPage, DomainError> {
        let posts = self
            .posts
            .into_iter()
            .map(Posting::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PostPage {
            posts,
            pagination: self.pagination,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PostDetailEnvelope {
    pub post: RawPost,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

impl PostDetailEnvelope {
    /// The detail endpoint omits `comment_count`; it is the length of the
    /// comment list it ships alongside.
    pub fn into_detail(self) -> Result<PostDetail, DomainError> {
        let comments = self
            .comments
            .into_iter()
            .map(|c| c.into_comment(false))
            .collect::<Result<Vec<_>, _>>()?;
        let count = u32::try_from(comments.len()).unwrap_or(u32::MAX);
        Ok(PostDetail {
            posting: self.post.into_posting(count)?,
            comments,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EchoEnvelope {
    pub post: RawEcho,
}

impl EchoEnvelope {
    pub fn into_echo(self) -> Result<PostingEcho, DomainError> {
        self.post.try_into()
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteEnvelope {
    pub post: RawTally,
}

impl VoteEnvelope {
    pub fn into_tally(self, post_id: PostId) -> VoteTally {
        VoteTally {
            post_id,
            score: self.post.vote_score,
            own_vote: self.post.user_vote,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentEnvelope {
    pub comment: RawComment,
}

impl CommentEnvelope {
    /// Comments returned from create/update belong to someone allowed to edit them.
    pub fn into_comment(self) -> Result<Comment, DomainError> {
        self.comment.into_comment(true)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportEnvelope {
    pub report: RawFiledReport,
}

impl ReportEnvelope {
    pub fn into_filed(self) -> Result<FiledReport, DomainError> {
        Ok(FiledReport {
            id: ReportId(checked_id(self.report.id, "report")?),
            reason: self.report.reason,
            created_at: parse_optional_timestamp(self.report.created_at.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportListEnvelope {
    pub reports: Vec<RawReport>,
}

impl ReportListEnvelope {
    pub fn into_reports(self) -> Result<Vec<Report>, DomainError> {
        self.reports.into_iter().map(Report::try_from).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminPostListEnvelope {
    pub posts: Vec<RawPost>,
}

impl AdminPostListEnvelope {
    pub fn into_rows(self) -> Result<Vec<AdminPosting>, DomainError> {
        self.posts.into_iter().map(AdminPosting::try_from).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UserListEnvelope {
    pub users: Vec<RawUserSummary>,
}

impl UserListEnvelope {
    pub fn into_users(self) -> Result<Vec<UserSummary>, DomainError> {
        self.users
            .into_iter()
            .map(|raw| {
                Ok(UserSummary {
                    id: UserId(checked_id(raw.id, "user")?),
                    username: raw.username,
                    email: raw.email,
                    role: raw.role,
                    post_count: raw.post_count,
                    created_at: parse_timestamp(&raw.created_at)?,
                })
            })
            .collect()
    }
}

/// Body of every non-success response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SignupBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PostingBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub company: &'a str,
    pub link: &'a str,
    pub tags: String,
}

impl<'a> From<&'a PostingDraft> for PostingBody<'a> {
    fn from(draft: &'a PostingDraft) -> Self {
        Self {
            title: &draft.title,
            description: &draft.description,
            company: draft.company.as_deref().unwrap_or(""),
            link: &draft.link,
            tags: join_tags(&draft.tags),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoteBody {
    pub post_id: PostId,
    pub vote_type: VoteKind,
}

#[derive(Debug, Serialize)]
pub struct CommentBody<'a> {
    pub post_id: PostId,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CommentEditBody<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ReportBody<'a> {
    pub post_id: PostId,
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResolveBody {
    pub action: ResolveAction,
}
