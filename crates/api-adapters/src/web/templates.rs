//! Askama templates for the board pages.
//!
//! Templates only see flat display rows; everything is formatted here so the
//! HTML stays free of logic beyond `if` and `for`.

use askama::Template;
use chrono::{DateTime, Utc};
use domains::{AdminPosting, Comment, Field, Posting, Report, ReportStatus, VoteKind};
use services::{FormError, Notice, PaginationControls, PostingForm, SessionStore};

fn display_time(at: &DateTime<Utc>) -> String {
    at.format("%b %d, %Y %H:%M").to_string()
}

/// Header links for whoever is looking.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub is_admin: bool,
}

impl Nav {
    pub fn from_session(session: &SessionStore) -> Self {
        match session.identity() {
            Some(identity) => Self {
                signed_in: true,
                username: identity.username.clone(),
                is_admin: identity.is_admin(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeView {
    pub is_error: bool,
    pub message: String,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            is_error: notice.is_error(),
            message: notice.message,
        }
    }
}

pub fn notice_views(notices: Vec<Notice>) -> Vec<NoticeView> {
    notices.into_iter().map(NoticeView::from).collect()
}

#[derive(Debug, Clone)]
pub struct CardView {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub description: String,
    pub link: String,
    pub tags: Vec<String>,
    pub author: String,
    pub score: i64,
    pub voted_up: bool,
    pub voted_down: bool,
    pub comment_count: u32,
    pub posted: String,
    pub edited: bool,
    pub status: &'static str,
    pub can_edit: bool,
}

impl From<&Posting> for CardView {
    fn from(posting: &Posting) -> Self {
        Self {
            id: posting.id.0,
            title: posting.title.clone(),
            company: posting.company.clone().unwrap_or_default(),
            description: posting.description.clone(),
            link: posting.link.clone(),
            tags: posting.tags.iter().cloned().collect(),
            author: posting.author.username.clone(),
            score: posting.vote_score,
            voted_up: posting.own_vote == Some(VoteKind::Up),
            voted_down: posting.own_vote == Some(VoteKind::Down),
            comment_count: posting.comment_count,
            posted: display_time(&posting.created_at),
            edited: posting.updated_at > posting.created_at,
            status: posting.status.as_str(),
            can_edit: posting.can_edit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub posted: String,
    pub can_edit: bool,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.0,
            content: comment.content.clone(),
            author: comment.author.username.clone(),
            posted: display_time(&comment.created_at),
            can_edit: comment.can_edit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub post_author: String,
    pub post_status: &'static str,
    pub reporter: String,
    pub reason: String,
    pub status: &'static str,
    pub pending: bool,
    pub resolved_by: String,
    pub filed: String,
}

impl From<&Report> for ReportRow {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.0,
            post_id: report.posting.id.0,
            post_title: report.posting.title.clone(),
            post_author: report.posting.author.username.clone(),
            post_status: report.posting.status.as_str(),
            reporter: report.reporter.username.clone(),
            reason: report.reason.clone(),
            status: report.status.as_str(),
            pending: report.status == ReportStatus::Pending,
            resolved_by: report
                .resolved_by
                .as_ref()
                .map(|who| who.username.clone())
                .unwrap_or_default(),
            filed: display_time(&report.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminPostRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: &'static str,
    pub deleted: bool,
    pub report_count: u32,
    pub score: i64,
    pub posted: String,
}

impl From<&AdminPosting> for AdminPostRow {
    fn from(row: &AdminPosting) -> Self {
        Self {
            id: row.posting.id.0,
            title: row.posting.title.clone(),
            author: row.posting.author.username.clone(),
            status: row.posting.status.as_str(),
            deleted: row.posting.status == domains::PostStatus::Deleted,
            report_count: row.report_count,
            score: row.posting.vote_score,
            posted: display_time(&row.posting.created_at),
        }
    }
}

/// Filter tab under the admin header.
#[derive(Debug, Clone)]
pub struct FilterLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Inline messages of a submitted form. Empty strings render nothing.
#[derive(Debug, Clone, Default)]
pub struct FormMessages {
    pub form: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub title: String,
    pub description: String,
    pub link: String,
}

impl FormMessages {
    pub fn from_error(err: &FormError) -> Self {
        match err {
            FormError::Rejected(message) => Self {
                form: message.clone(),
                ..Self::default()
            },
            FormError::Invalid(errors) => {
                let get = |field| errors.get(field).unwrap_or_default().to_string();
                Self {
                    form: String::new(),
                    username: get(Field::Username),
                    email: get(Field::Email),
                    password: get(Field::Password),
                    title: get(Field::Title),
                    description: get(Field::Description),
                    link: get(Field::Link),
                }
            }
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub cards: Vec<CardView>,
    pub error: String,
    pub search: String,
    pub tags: String,
    pub sort_popular: bool,
    pub pagination: PaginationControls,
    pub loading: bool,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub post: CardView,
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub heading: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "waiting.html")]
pub struct WaitingTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
}

#[derive(Template)]
#[template(path = "posting_form.html")]
pub struct PostingFormTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: PostingForm,
    pub messages: FormMessages,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub username: String,
    pub messages: FormMessages,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub username: String,
    pub email: String,
    pub messages: FormMessages,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub nav: Nav,
    pub notices: Vec<NoticeView>,
    pub reports_tab: bool,
    pub filters: Vec<FilterLink>,
    pub reports: Vec<ReportRow>,
    pub postings: Vec<AdminPostRow>,
    pub error: String,
    pub loading: bool,
}
