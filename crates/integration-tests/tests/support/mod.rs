//! In-process stand-in for the board's REST backend.
//!
//! Just enough of the real API to drive the client end to end: cookie
//! sessions, postings, votes, comments, reports and moderation. State lives
//! behind a std mutex; no handler awaits while holding it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use api_adapters::{HttpApiConfig, HttpBoardApi};
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const CREATED_AT: &str = "2024-03-01T09:30:00";

#[derive(Debug, Clone)]
pub struct StubUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: &'static str,
}

#[derive(Debug, Clone)]
pub struct StubComment {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct StubPost {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub link: String,
    /// Stored the way the backend stores it: one comma separated string.
    pub tags: String,
    pub author_id: i64,
    pub status: &'static str,
    pub votes: HashMap<i64, &'static str>,
    pub comments: Vec<StubComment>,
}

impl StubPost {
    fn score(&self) -> i64 {
        self.votes
            .values()
            .map(|kind| if *kind == "up" { 1 } else { -1 })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct StubReport {
    pub id: i64,
    pub post_id: i64,
    pub reporter_id: i64,
    pub reason: String,
    pub status: &'static str,
    pub reviewer_id: Option<i64>,
}

/// A failure the next call to an endpoint answers with.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: u16,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct Board {
    pub users: Vec<StubUser>,
    pub sessions: HashMap<String, i64>,
    pub posts: Vec<StubPost>,
    pub reports: Vec<StubReport>,
    /// `path?query` of every list request, in order.
    pub queries: Vec<String>,
    /// Calls per endpoint name.
    pub calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, Failure>,
    stalls: HashMap<&'static str, Duration>,
    next_id: i64,
}

impl Board {
    fn seeded() -> Self {
        let mut board = Board {
            next_id: 100,
            ..Board::default()
        };
        for (id, username, role) in [(1, "ada", "user"), (2, "grace", "moderator"), (3, "root", "admin")] {
            board.users.push(StubUser {
                id,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: format!("password{id}"),
                role,
            });
        }
        board.posts.push(StubPost {
            id: 1,
            title: "Firmware Intern".to_string(),
            description: "Bring up boards and write drivers in Rust.".to_string(),
            company: Some("Acme Devices".to_string()),
            link: "https://acme.example/jobs/1".to_string(),
            tags: " Remote, rust,,Remote".to_string(),
            author_id: 2,
            status: "active",
            votes: HashMap::new(),
            comments: Vec::new(),
        });
        board.posts.push(StubPost {
            id: 2,
            title: "Data Intern".to_string(),
            description: "Clean up the ingestion pipeline for the summer.".to_string(),
            company: None,
            link: "https://data.example/apply".to_string(),
            tags: "Data".to_string(),
            author_id: 1,
            status: "active",
            votes: HashMap::new(),
            comments: vec![StubComment {
                id: 1,
                author_id: 2,
                content: "Is this remote?".to_string(),
            }],
        });
        board.reports.push(StubReport {
            id: 1,
            post_id: 2,
            reporter_id: 2,
            reason: "Looks like spam".to_string(),
            status: "pending",
            reviewer_id: None,
        });
        board
    }

    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.get(endpoint).copied().unwrap_or(0)
    }

    fn hit(&mut self, endpoint: &'static str) -> Option<Response> {
        *self.calls.entry(endpoint).or_default() += 1;
        self.failures.remove(endpoint).map(|failure| {
            let status = StatusCode::from_u16(failure.status).unwrap();
            match failure.message {
                Some(message) => (status, Json(json!({ "error": message }))).into_response(),
                None => (status, Json(json!({}))).into_response(),
            }
        })
    }

    fn user(&self, id: i64) -> Option<&StubUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn viewer(&self, headers: &HeaderMap) -> Option<&StubUser> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let user_id = cookies
            .split(';')
            .filter_map(|c| c.trim().strip_prefix("session="))
            .find_map(|token| self.sessions.get(token).copied())?;
        self.user(user_id)
    }

    fn author(&self, id: i64) -> Value {
        let username = self.user(id).map(|u| u.username.clone()).unwrap_or_default();
        json!({ "id": id, "username": username })
    }

    fn user_json(user: &StubUser) -> Value {
        json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role,
            "created_at": CREATED_AT,
        })
    }

    fn is_moderator(user: &StubUser) -> bool {
        user.role == "moderator" || user.role == "admin"
    }

    fn post_json(&self, post: &StubPost, viewer: Option<&StubUser>) -> Value {
        let report_count = self
            .reports
            .iter()
            .filter(|r| r.post_id == post.id && r.status == "pending")
            .count();
        json!({
            "id": post.id,
            "title": post.title,
            "description": post.description,
            "company": post.company,
            "link": post.link,
            "tags": post.tags,
            "author": self.author(post.author_id),
            "vote_score": post.score(),
            "user_vote": viewer.and_then(|v| post.votes.get(&v.id).copied()),
            "comment_count": post.comments.len(),
            "created_at": CREATED_AT,
            "updated_at": CREATED_AT,
            "status": post.status,
            "can_edit": viewer.is_some_and(|v| v.id == post.author_id || Self::is_moderator(v)),
            "approved": true,
            "report_count": report_count,
        })
    }

    fn comment_json(&self, comment: &StubComment, viewer: Option<&StubUser>) -> Value {
        json!({
            "id": comment.id,
            "content": comment.content,
            "author": self.author(comment.author_id),
            "created_at": CREATED_AT,
            "can_edit": viewer.is_some_and(|v| v.id == comment.author_id || Self::is_moderator(v)),
        })
    }

    fn report_json(&self, report: &StubReport) -> Value {
        let post = self.posts.iter().find(|p| p.id == report.post_id);
        json!({
            "id": report.id,
            "post": {
                "id": report.post_id,
                "title": post.map(|p| p.title.clone()).unwrap_or_default(),
                "author": self.author(post.map(|p| p.author_id).unwrap_or(1)),
                "status": post.map(|p| p.status).unwrap_or("deleted"),
            },
            "reporter": self.author(report.reporter_id),
            "reason": report.reason,
            "status": report.status,
            "reviewed_by": report.reviewer_id.map(|id| self.author(id)),
            "created_at": CREATED_AT,
            "reviewed_at": report.reviewer_id.map(|_| CREATED_AT),
        })
    }
}

type Shared = Arc<Mutex<Board>>;

fn lock(board: &Shared) -> MutexGuard<'_, Board> {
    board.lock().unwrap()
}

/// Waits out a delay queued with [`Backend::stall_next`]. The lock is
/// released before sleeping.
async fn stall(board: &Shared, endpoint: &'static str) {
    let delay = lock(board).stalls.remove(endpoint);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn ok(body: Value) -> Response {
    Json(body).into_response()
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginReq {
    username: String,
    password: String,
}

async fn login(State(board): State<Shared>, Json(body): Json<LoginReq>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("login") {
        return failure;
    }
    let Some(user) = board
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    };
    let token = format!("tok-{}-{}", user.id, board.id());
    board.sessions.insert(token.clone(), user.id);
    (
        [(header::SET_COOKIE, format!("session={token}; Path=/; HttpOnly"))],
        Json(json!({ "user": Board::user_json(&user) })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct SignupReq {
    username: String,
    email: String,
    password: String,
}

async fn signup(State(board): State<Shared>, Json(body): Json<SignupReq>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("signup") {
        return failure;
    }
    if board.users.iter().any(|u| u.username == body.username) {
        return error(StatusCode::BAD_REQUEST, "Username already exists");
    }
    let user = StubUser {
        id: board.id(),
        username: body.username,
        email: body.email,
        password: body.password,
        role: "user",
    };
    let token = format!("tok-{}", user.id);
    board.sessions.insert(token.clone(), user.id);
    board.users.push(user.clone());
    (
        StatusCode::CREATED,
        [(header::SET_COOKIE, format!("session={token}; Path=/; HttpOnly"))],
        Json(json!({ "user": Board::user_json(&user) })),
    )
        .into_response()
}

async fn logout(State(board): State<Shared>, headers: HeaderMap) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("logout") {
        return failure;
    }
    if let Some(user_id) = board.viewer(&headers).map(|u| u.id) {
        board.sessions.retain(|_, id| *id != user_id);
    }
    ok(json!({ "message": "Logged out" }))
}

async fn me(State(board): State<Shared>, headers: HeaderMap) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("me") {
        return failure;
    }
    match board.viewer(&headers) {
        Some(user) => ok(json!({ "user": Board::user_json(user) })),
        None => error(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

// ── Postings ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    tags: Option<String>,
    sort: Option<String>,
}

async fn list_posts(
    State(board): State<Shared>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    axum::extract::Query(query): axum::extract::Query<ListQuery>,
) -> Response {
    let mut board = lock(&board);
    board.queries.push(format!("/posts?{}", raw.unwrap_or_default()));
    if let Some(failure) = board.hit("list_posts") {
        return failure;
    }
    let viewer = board.viewer(&headers);
    let search = query.search.unwrap_or_default().to_lowercase();
    let wanted: Vec<String> = query
        .tags
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let mut matching: Vec<&StubPost> = board
        .posts
        .iter()
        .filter(|p| p.status == "active")
        .filter(|p| search.is_empty() || p.title.to_lowercase().contains(&search))
        .filter(|p| {
            let tags = p.tags.to_lowercase();
            wanted.iter().all(|w| tags.split(',').any(|t| t.trim() == w))
        })
        .collect();
    if query.sort.as_deref() == Some("popular") {
        matching.sort_by_key(|p| std::cmp::Reverse(p.score()));
    } else {
        matching.sort_by_key(|p| std::cmp::Reverse(p.id));
    }

    let per_page = query.per_page.unwrap_or(20).max(1);
    let total = matching.len() as u32;
    let pages = total.div_ceil(per_page).max(1);
    let page = query.page.unwrap_or(1).clamp(1, pages);
    let posts: Vec<Value> = matching
        .iter()
        .skip(((page - 1) * per_page) as usize)
        .take(per_page as usize)
        .map(|p| board.post_json(p, viewer))
        .collect();
    ok(json!({
        "posts": posts,
        "pagination": {
            "page": page,
            "pages": pages,
            "per_page": per_page,
            "total": total,
            "has_next": page < pages,
            "has_prev": page > 1,
        }
    }))
}

async fn get_post(State(board): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("get_post") {
        return failure;
    }
    let viewer = board.viewer(&headers);
    let Some(post) = board.posts.iter().find(|p| p.id == id && p.status != "deleted") else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    let mut body = board.post_json(post, viewer);
    if let Some(fields) = body.as_object_mut() {
        fields.remove("comment_count");
    }
    let comments: Vec<Value> = post
        .comments
        .iter()
        .map(|c| board.comment_json(c, viewer))
        .collect();
    ok(json!({ "post": body, "comments": comments }))
}

#[derive(Deserialize)]
struct PostReq {
    title: String,
    description: String,
    #[serde(default)]
    company: Option<String>,
    link: String,
    #[serde(default)]
    tags: Option<String>,
}

async fn create_post(State(board): State<Shared>, headers: HeaderMap, Json(body): Json<PostReq>) -> Response {
    stall(&board, "create_post").await;
    let mut board = lock(&board);
    if let Some(failure) = board.hit("create_post") {
        return failure;
    }
    let Some(author_id) = board.viewer(&headers).map(|u| u.id) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let post = StubPost {
        id: board.id(),
        title: body.title,
        description: body.description,
        company: body.company,
        link: body.link,
        tags: body.tags.unwrap_or_default(),
        author_id,
        status: "active",
        votes: HashMap::new(),
        comments: Vec::new(),
    };
    let echo = json!({
        "id": post.id,
        "title": post.title,
        "description": post.description,
        "company": post.company,
        "link": post.link,
        "tags": post.tags,
        "created_at": CREATED_AT,
    });
    board.posts.push(post);
    (StatusCode::CREATED, Json(json!({ "post": echo }))).into_response()
}

async fn update_post(
    State(board): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<PostReq>,
) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("update_post") {
        return failure;
    }
    let Some(viewer) = board.viewer(&headers).cloned() else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let Some(post) = board.posts.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    if post.author_id != viewer.id && !Board::is_moderator(&viewer) {
        return error(StatusCode::FORBIDDEN, "Permission denied");
    }
    post.title = body.title;
    post.description = body.description;
    post.company = body.company;
    post.link = body.link;
    post.tags = body.tags.unwrap_or_default();
    ok(json!({ "post": {
        "id": post.id,
        "title": post.title,
        "description": post.description,
        "company": post.company,
        "link": post.link,
        "tags": post.tags,
        "created_at": CREATED_AT,
        "updated_at": "2024-03-05T12:00:00",
    }}))
}

async fn delete_post(State(board): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("delete_post") {
        return failure;
    }
    let Some(viewer) = board.viewer(&headers).cloned() else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let Some(post) = board.posts.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    if post.author_id != viewer.id && !Board::is_moderator(&viewer) {
        return error(StatusCode::FORBIDDEN, "Permission denied");
    }
    post.status = "deleted";
    ok(json!({ "message": "Post deleted" }))
}

// ── Votes / comments / reports ───────────────────────────────────────────────

#[derive(Deserialize)]
struct VoteReq {
    post_id: i64,
    vote_type: String,
}

async fn vote(State(board): State<Shared>, headers: HeaderMap, Json(body): Json<VoteReq>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("vote") {
        return failure;
    }
    let Some(voter) = board.viewer(&headers).map(|u| u.id) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let kind = if body.vote_type == "down" { "down" } else { "up" };
    let Some(post) = board.posts.iter_mut().find(|p| p.id == body.post_id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    match post.votes.get(&voter) {
        Some(existing) if *existing == kind => {
            post.votes.remove(&voter);
        }
        _ => {
            post.votes.insert(voter, kind);
        }
    }
    ok(json!({ "post": {
        "vote_score": post.score(),
        "user_vote": post.votes.get(&voter).copied(),
    }}))
}

#[derive(Deserialize)]
struct CommentReq {
    post_id: i64,
    content: String,
}

async fn create_comment(State(board): State<Shared>, headers: HeaderMap, Json(body): Json<CommentReq>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("create_comment") {
        return failure;
    }
    let Some(author_id) = board.viewer(&headers).map(|u| u.id) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let comment = StubComment {
        id: board.id(),
        author_id,
        content: body.content,
    };
    let Some(post) = board.posts.iter_mut().find(|p| p.id == body.post_id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    post.comments.push(comment.clone());
    let mut created = board.comment_json(&comment, None);
    if let Some(fields) = created.as_object_mut() {
        fields.remove("can_edit");
    }
    (StatusCode::CREATED, Json(json!({ "comment": created }))).into_response()
}

#[derive(Deserialize)]
struct ContentReq {
    content: String,
}

async fn update_comment(
    State(board): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ContentReq>,
) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("update_comment") {
        return failure;
    }
    if board.viewer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    let Some(comment) = board
        .posts
        .iter_mut()
        .flat_map(|p| p.comments.iter_mut())
        .find(|c| c.id == id)
    else {
        return error(StatusCode::NOT_FOUND, "Comment not found");
    };
    comment.content = body.content;
    let comment = comment.clone();
    ok(json!({ "comment": board.comment_json(&comment, None) }))
}

async fn delete_comment(State(board): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("delete_comment") {
        return failure;
    }
    if board.viewer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    for post in board.posts.iter_mut() {
        post.comments.retain(|c| c.id != id);
    }
    ok(json!({ "message": "Comment deleted" }))
}

#[derive(Deserialize)]
struct ReportReq {
    post_id: i64,
    reason: String,
}

async fn file_report(State(board): State<Shared>, headers: HeaderMap, Json(body): Json<ReportReq>) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("file_report") {
        return failure;
    }
    let Some(reporter_id) = board.viewer(&headers).map(|u| u.id) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    if board
        .reports
        .iter()
        .any(|r| r.post_id == body.post_id && r.reporter_id == reporter_id && r.status == "pending")
    {
        return error(StatusCode::BAD_REQUEST, "You have already reported this post");
    }
    let report = StubReport {
        id: board.id(),
        post_id: body.post_id,
        reporter_id,
        reason: body.reason,
        status: "pending",
        reviewer_id: None,
    };
    let filed = json!({ "id": report.id, "reason": report.reason, "created_at": CREATED_AT });
    board.reports.push(report);
    (StatusCode::CREATED, Json(json!({ "report": filed }))).into_response()
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

/// Reports and `/admin/*` turn away everyone but admins.
fn require_admin(board: &Board, headers: &HeaderMap) -> Result<i64, Response> {
    match board.viewer(headers) {
        Some(user) if user.role == "admin" => Ok(user.id),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "Admin access required")),
        None => Err(error(StatusCode::UNAUTHORIZED, "Authentication required")),
    }
}

async fn list_reports(
    State(board): State<Shared>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    axum::extract::Query(query): axum::extract::Query<StatusQuery>,
) -> Response {
    let mut board = lock(&board);
    board.queries.push(format!("/reports?{}", raw.unwrap_or_default()));
    if let Some(failure) = board.hit("list_reports") {
        return failure;
    }
    if let Err(denied) = require_admin(&board, &headers) {
        return denied;
    }
    // Like the real backend: a missing status means pending.
    let status = query.status.unwrap_or_else(|| "pending".to_string());
    let reports: Vec<Value> = board
        .reports
        .iter()
        .filter(|r| status == "all" || r.status == status)
        .map(|r| board.report_json(r))
        .collect();
    ok(json!({ "reports": reports }))
}

#[derive(Deserialize)]
struct ResolveReq {
    action: String,
}

async fn resolve_report(
    State(board): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ResolveReq>,
) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("resolve") {
        return failure;
    }
    let reviewer = match require_admin(&board, &headers) {
        Ok(id) => id,
        Err(denied) => return denied,
    };
    let Some(report) = board.reports.iter_mut().find(|r| r.id == id) else {
        return error(StatusCode::NOT_FOUND, "Report not found");
    };
    report.status = "resolved";
    report.reviewer_id = Some(reviewer);
    let post_id = report.post_id;
    let new_status = match body.action.as_str() {
        "delete_post" => Some("deleted"),
        "expire_post" => Some("expired"),
        _ => None,
    };
    if let Some(status) = new_status {
        if let Some(post) = board.posts.iter_mut().find(|p| p.id == post_id) {
            post.status = status;
        }
    }
    ok(json!({ "message": "Report resolved" }))
}

async fn admin_posts(
    State(board): State<Shared>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    axum::extract::Query(query): axum::extract::Query<StatusQuery>,
) -> Response {
    let mut board = lock(&board);
    board.queries.push(format!("/admin/posts?{}", raw.unwrap_or_default()));
    if let Some(failure) = board.hit("admin_posts") {
        return failure;
    }
    let viewer = match require_admin(&board, &headers) {
        Ok(id) => board.user(id),
        Err(denied) => return denied,
    };
    let status = query.status.unwrap_or_else(|| "all".to_string());
    let posts: Vec<Value> = board
        .posts
        .iter()
        .filter(|p| status == "all" || p.status == status)
        .map(|p| board.post_json(p, viewer))
        .collect();
    ok(json!({ "posts": posts }))
}

async fn moderate(board: Shared, headers: HeaderMap, id: i64, status: &'static str, endpoint: &'static str) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit(endpoint) {
        return failure;
    }
    if let Err(denied) = require_admin(&board, &headers) {
        return denied;
    }
    match board.posts.iter_mut().find(|p| p.id == id) {
        Some(post) => {
            post.status = status;
            ok(json!({ "message": "ok" }))
        }
        None => error(StatusCode::NOT_FOUND, "Post not found"),
    }
}

async fn admin_delete(State(board): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    moderate(board, headers, id, "deleted", "admin_delete").await
}

async fn admin_restore(State(board): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    moderate(board, headers, id, "active", "admin_restore").await
}

async fn admin_users(State(board): State<Shared>, headers: HeaderMap) -> Response {
    let mut board = lock(&board);
    if let Some(failure) = board.hit("admin_users") {
        return failure;
    }
    match board.viewer(&headers) {
        Some(user) if user.role == "admin" => {}
        _ => return error(StatusCode::FORBIDDEN, "Admin access required"),
    }
    let users: Vec<Value> = board
        .users
        .iter()
        .map(|u| {
            let post_count = board.posts.iter().filter(|p| p.author_id == u.id).count();
            json!({
                "id": u.id,
                "username": u.username,
                "email": u.email,
                "role": u.role,
                "post_count": post_count,
                "created_at": CREATED_AT,
            })
        })
        .collect();
    ok(json!({ "users": users }))
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// A running stub backend.
#[derive(Clone)]
pub struct Backend {
    pub base_url: String,
    board: Shared,
}

impl Backend {
    pub async fn spawn() -> Self {
        let board: Shared = Arc::new(Mutex::new(Board::seeded()));
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/posts", get(list_posts).post(create_post))
            .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
            .route("/votes", post(vote))
            .route("/comments", post(create_comment))
            .route("/comments/{id}", axum::routing::put(update_comment).delete(delete_comment))
            .route("/reports", get(list_reports).post(file_report))
            .route("/reports/{id}/resolve", post(resolve_report))
            .route("/admin/posts", get(admin_posts))
            .route("/admin/posts/{id}/delete", post(admin_delete))
            .route("/admin/posts/{id}/restore", post(admin_restore))
            .route("/admin/users", get(admin_users))
            .with_state(Arc::clone(&board));
        let app = Router::new().nest("/api", api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}/api"),
            board,
        }
    }

    pub fn board(&self) -> MutexGuard<'_, Board> {
        lock(&self.board)
    }

    /// The next call to `endpoint` answers `status` with `message`.
    pub fn fail_next(&self, endpoint: &'static str, status: u16, message: Option<&str>) {
        self.board().failures.insert(
            endpoint,
            Failure {
                status,
                message: message.map(str::to_string),
            },
        );
    }

    /// The next call to `endpoint` answers only after `delay`.
    pub fn stall_next(&self, endpoint: &'static str, delay: Duration) {
        self.board().stalls.insert(endpoint, delay);
    }

    pub fn add_posts(&self, count: usize) {
        let mut board = self.board();
        for n in 0..count {
            let id = board.id();
            board.posts.push(StubPost {
                id,
                title: format!("Generated Intern {n}"),
                description: "Generated posting for pagination checks.".to_string(),
                company: None,
                link: format!("https://jobs.example/{id}"),
                tags: String::new(),
                author_id: 1,
                status: "active",
                votes: HashMap::new(),
                comments: Vec::new(),
            });
        }
    }

    pub fn config(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
        }
    }

    /// A fresh client with its own cookie jar.
    pub fn client(&self) -> HttpBoardApi {
        HttpBoardApi::new(&self.config()).unwrap()
    }
}

pub fn credentials(username: &str, password: &str) -> domains::Credentials {
    domains::Credentials {
        username: username.to_string(),
        password: secrecy::SecretString::from(password.to_string()),
    }
}

pub const ADA: (&str, &str) = ("ada", "password1");
pub const GRACE: (&str, &str) = ("grace", "password2");
pub const ROOT: (&str, &str) = ("root", "password3");
