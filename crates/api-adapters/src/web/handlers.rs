//! # Web Handlers
//!
//! Every handler follows the same shape: open the visitor's client session,
//! run the route guard, then either render a page from the screen state or
//! start an action. Actions take their ticket under the session lock, are
//! sent with the lock released, and are applied under the lock again from a
//! detached task (see [`act`]).

use std::sync::Arc;

use askama::Template;
use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::{
    ApiResult, CommentId, Credentials, PostFilter, PostId, Registration, ReportFilter, ReportId,
    ResolveAction, SortOrder, VoteKind,
};
use secrecy::SecretString;
use serde::Deserialize;
use services::{
    decide, ActionRejected, AdminTab, ClientSession, GuardDecision, Moderation, Notice, Outbound,
    PostingForm, RouteAccess, SessionStore,
};
use tower_sessions::Session;
use tracing::{debug, info};

use crate::web::error::WebError;
use crate::web::state::{AppState, ClientHandle};
use crate::web::templates::{
    notice_views, AdminPostRow, AdminTemplate, CardView, CommentView, DetailTemplate, FilterLink,
    FormMessages, HomeTemplate, LoginTemplate, MessageTemplate, Nav, NoticeView,
    PostingFormTemplate, ReportRow, SignupTemplate, WaitingTemplate,
};

type Page = Result<Response, WebError>;

const REPORT_FILTERS: [(ReportFilter, &str); 3] = [
    (ReportFilter::Pending, "Pending"),
    (ReportFilter::Resolved, "Resolved"),
    (ReportFilter::All, "All"),
];

const POST_FILTERS: [(PostFilter, &str); 4] = [
    (PostFilter::All, "All"),
    (PostFilter::Active, "Active"),
    (PostFilter::Deleted, "Deleted"),
    (PostFilter::Expired, "Expired"),
];

// ── Plumbing ─────────────────────────────────────────────────────────────────

fn render(template: impl Template) -> Page {
    Ok(Html(template.render()?).into_response())
}

/// Header and pending notices; drains the notices.
fn chrome(client: &mut ClientSession) -> (Nav, Vec<NoticeView>) {
    (Nav::from_session(&client.session), notice_views(client.take_notices()))
}

fn waiting_page(client: &mut ClientSession) -> Page {
    let (nav, notices) = chrome(client);
    render(WaitingTemplate { nav, notices })
}

/// Route guard for pages. `Some` is what to send instead of the page.
fn page_guard(access: RouteAccess, client: &mut ClientSession) -> Result<Option<Response>, WebError> {
    match decide(access, &client.session) {
        GuardDecision::Render => Ok(None),
        GuardDecision::Wait => waiting_page(client).map(Some),
        GuardDecision::Redirect(screen) => Ok(Some(Redirect::to(screen.path()).into_response())),
    }
}

/// Route guard for form posts. A session still resolving sends the visitor
/// back to `back` rather than to a page that would refresh into a GET.
fn action_guard(access: RouteAccess, client: &ClientSession, back: &str) -> Option<Response> {
    match decide(access, &client.session) {
        GuardDecision::Render => None,
        GuardDecision::Wait => Some(Redirect::to(back).into_response()),
        GuardDecision::Redirect(screen) => Some(Redirect::to(screen.path()).into_response()),
    }
}

/// Begins an action under the lock, sends it on a detached task and applies
/// the reply there. The task owns the ticket: a visitor who hangs up while
/// the backend is busy cannot leave the control disabled.
async fn act<R, O>(
    handle: &ClientHandle,
    begin: impl FnOnce(&mut ClientSession) -> Result<R, ActionRejected>,
    finish: impl FnOnce(&mut ClientSession, R, ApiResult<R::Reply>) -> O + Send + 'static,
) -> Result<Result<O, ActionRejected>, WebError>
where
    R: Outbound + 'static,
    O: Send + 'static,
{
    let (request, api) = {
        let mut client = handle.lock().await;
        match begin(&mut *client) {
            Ok(request) => (request, client.api()),
            Err(rejected) => return Ok(Err(rejected)),
        }
    };
    let handle = Arc::clone(handle);
    let applied = tokio::spawn(async move {
        let result = request.send(api.as_ref()).await;
        let mut client = handle.lock().await;
        finish(&mut *client, request, result)
    })
    .await?;
    Ok(Ok(applied))
}

/// Turns a local refusal into a notice (or the login screen) and sends the
/// visitor back to `back`.
async fn refuse(handle: &ClientHandle, rejected: ActionRejected, back: &str) -> Response {
    debug!(reason = %rejected, "action refused");
    let mut client = handle.lock().await;
    match rejected {
        ActionRejected::NotSignedIn => {
            client.push_notice(Notice::info("Please log in to continue."));
            return Redirect::to("/login").into_response();
        }
        ActionRejected::Busy => {
            client.push_notice(Notice::info("Still working on your last request."));
        }
        ActionRejected::Forbidden => {
            client.push_notice(Notice::error("You do not have permission to do that."));
        }
        ActionRejected::NotLoaded => {
            client.push_notice(Notice::error("That item is no longer on this page."));
        }
        ActionRejected::Invalid(errors) => {
            for (_, message) in errors.iter() {
                client.push_notice(Notice::error(message));
            }
        }
    }
    Redirect::to(back).into_response()
}

/// Where a card action sends the visitor afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnTo {
    #[default]
    Home,
    Detail,
}

fn posting_path(id: PostId) -> String {
    format!("/posts/{id}")
}

impl ReturnTo {
    fn path(self, id: PostId) -> String {
        match self {
            ReturnTo::Home => "/".to_string(),
            ReturnTo::Detail => posting_path(id),
        }
    }
}

// ── Home ─────────────────────────────────────────────────────────────────────

/// Missing parameters keep the current filters.
#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub sort: Option<SortOrder>,
}

pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<HomeParams>,
) -> Page {
    let handle = state.open(&session).await?;
    let fetch = {
        let mut client = handle.lock().await;
        let view = &mut client.home;
        if params.search.is_some() || params.tags.is_some() {
            view.apply_search(
                params.search.unwrap_or_default(),
                params.tags.unwrap_or_default(),
            );
        }
        if let Some(sort) = params.sort {
            view.set_sort(sort);
        }
        if let Some(page) = params.page {
            view.go_to_page(page);
        }
        // Busy means another tab is already fetching: show what is there.
        view.needs_fetch() && !view.is_fetching()
    };
    if fetch {
        let _ = act(
            &handle,
            |client| client.home.begin_fetch(),
            |client, fetch, result| client.home.finish_fetch(fetch, result),
        )
        .await?;
    }

    let mut client = handle.lock().await;
    home_page(&mut client)
}

fn home_page(client: &mut ClientSession) -> Page {
    let (nav, notices) = chrome(client);
    let view = &client.home;
    let filters = view.filters();
    render(HomeTemplate {
        nav,
        notices,
        cards: view.cards().iter().map(CardView::from).collect(),
        error: view.error().unwrap_or_default().to_string(),
        search: filters.search.clone(),
        tags: filters.tags.clone(),
        sort_popular: filters.sort == SortOrder::Popular,
        pagination: view.pagination(),
        loading: view.is_fetching() && !view.is_loaded(),
    })
}

// ── Posting detail ───────────────────────────────────────────────────────────

pub async fn show_posting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    load_detail(&handle, post_id).await?;

    let mut client = handle.lock().await;
    detail_page(&mut client, post_id)
}

/// Opens the detail screen for `post_id` and fetches it unless a confirmed
/// mutation already brought it up to date.
async fn load_detail(handle: &ClientHandle, post_id: PostId) -> Result<(), WebError> {
    let fetch = {
        let mut client = handle.lock().await;
        let view = client.open_detail(post_id);
        view.needs_fetch() && !view.is_loading()
    };
    if fetch {
        let _ = act(
            handle,
            |client| client.open_detail(post_id).begin_load(),
            move |client, fetch, result| {
                if let Some(view) = client.detail_for(post_id) {
                    view.finish_load(fetch, result);
                }
            },
        )
        .await?;
    }
    Ok(())
}

fn detail_page(client: &mut ClientSession, post_id: PostId) -> Page {
    let (nav, notices) = chrome(client);
    let Some(view) = client.detail().filter(|view| view.post_id() == post_id) else {
        return render(WaitingTemplate { nav, notices });
    };
    if let Some(posting) = view.posting() {
        return render(DetailTemplate {
            nav,
            notices,
            post: CardView::from(posting),
            comments: view.comments().iter().map(CommentView::from).collect(),
        });
    }
    match view.error() {
        Some(message) => render(MessageTemplate {
            nav,
            notices,
            heading: "Unable to show this posting".to_string(),
            message: message.to_string(),
        }),
        None => render(WaitingTemplate { nav, notices }),
    }
}

// ── Card actions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub kind: VoteKind,
    #[serde(default)]
    pub return_to: ReturnTo,
}

pub async fn vote(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<VoteForm>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    let back = form.return_to.path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let outcome = match form.return_to {
        ReturnTo::Home => {
            act(
                &handle,
                |client| client.home.begin_vote(&client.session, post_id, form.kind),
                |client, request, result| client.home.finish_vote(request, result),
            )
            .await?
        }
        ReturnTo::Detail => {
            act(
                &handle,
                |client| {
                    let (view, session) = client.detail_and_session(post_id)?;
                    view.begin_vote(session, form.kind)
                },
                move |client, request, result| {
                    if let Some(view) = client.detail_for(post_id) {
                        view.finish_vote(request, result);
                    }
                },
            )
            .await?
        }
    };
    match outcome {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub return_to: ReturnTo,
}

pub async fn report(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ReportForm>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    let back = form.return_to.path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let reason = form.reason;
    let outcome = match form.return_to {
        ReturnTo::Home => {
            act(
                &handle,
                |client| client.home.begin_report(&client.session, post_id, &reason),
                |client, request, result| client.home.finish_report(request, result),
            )
            .await?
        }
        ReturnTo::Detail => {
            act(
                &handle,
                |client| {
                    let (view, session) = client.detail_and_session(post_id)?;
                    view.begin_report(session, &reason)
                },
                move |client, request, result| {
                    if let Some(view) = client.detail_for(post_id) {
                        view.finish_report(request, result);
                    }
                },
            )
            .await?
        }
    };
    match outcome {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

// ── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    let back = posting_path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let outcome = act(
        &handle,
        |client| {
            let (view, session) = client.detail_and_session(post_id)?;
            view.begin_comment(session, &form.content)
        },
        move |client, request, result| {
            if let Some(view) = client.detail_for(post_id) {
                view.finish_comment(request, result);
            }
        },
    )
    .await?;
    match outcome {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentEditForm {
    pub post_id: i64,
    #[serde(default)]
    pub content: String,
}

pub async fn edit_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CommentEditForm>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(form.post_id);
    let comment_id = CommentId(id);
    let back = posting_path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let outcome = act(
        &handle,
        |client| {
            let (view, session) = client.detail_and_session(post_id)?;
            view.begin_edit_comment(session, comment_id, &form.content)
        },
        move |client, request, result| {
            if let Some(view) = client.detail_for(post_id) {
                view.finish_edit_comment(request, result);
            }
        },
    )
    .await?;
    match outcome {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRef {
    pub post_id: i64,
}

pub async fn delete_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CommentRef>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(form.post_id);
    let comment_id = CommentId(id);
    let back = posting_path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let outcome = act(
        &handle,
        |client| {
            let (view, session) = client.detail_and_session(post_id)?;
            view.begin_delete_comment(session, comment_id)
        },
        move |client, request, result| {
            if let Some(view) = client.detail_for(post_id) {
                view.finish_delete_comment(request, result);
            }
        },
    )
    .await?;
    match outcome {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

// ── Create / edit / delete postings ──────────────────────────────────────────

fn posting_form_page(
    client: &mut ClientSession,
    editing: Option<PostId>,
    form: PostingForm,
    messages: FormMessages,
) -> Page {
    let (nav, notices) = chrome(client);
    let (heading, action, submit_label) = match editing {
        Some(id) => ("Edit Internship", format!("/posts/{id}/edit"), "Save Changes"),
        None => ("Post an Internship", "/create".to_string(), "Create Post"),
    };
    render(PostingFormTemplate {
        nav,
        notices,
        heading,
        action,
        submit_label,
        form,
        messages,
    })
}

pub async fn new_posting(State(state): State<AppState>, session: Session) -> Page {
    let handle = state.open(&session).await?;
    let mut client = handle.lock().await;
    if let Some(stop) = page_guard(RouteAccess::Authenticated, &mut client)? {
        return Ok(stop);
    }
    posting_form_page(&mut client, None, PostingForm::default(), FormMessages::default())
}

pub async fn create_posting(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PostingForm>,
) -> Page {
    let handle = state.open(&session).await?;
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, "/create") {
        return Ok(stop);
    }

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(err) => {
            let mut client = handle.lock().await;
            return posting_form_page(&mut client, None, form, FormMessages::from_error(&err));
        }
    };
    let outcome = act(
        &handle,
        |client| client.begin_create(draft),
        |client, request, result| client.finish_create(request, result),
    )
    .await?;
    match outcome {
        Ok(Ok(echo)) => Ok(Redirect::to(&posting_path(echo.id)).into_response()),
        Ok(Err(err)) => {
            let mut client = handle.lock().await;
            posting_form_page(&mut client, None, form, FormMessages::from_error(&err))
        }
        Err(rejected) => Ok(refuse(&handle, rejected, "/create").await),
    }
}

pub async fn edit_posting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    {
        let mut client = handle.lock().await;
        if let Some(stop) = page_guard(RouteAccess::Authenticated, &mut client)? {
            return Ok(stop);
        }
    }
    load_detail(&handle, post_id).await?;

    let mut client = handle.lock().await;
    let posting = client
        .detail()
        .filter(|view| view.post_id() == post_id)
        .and_then(|view| view.posting())
        .cloned();
    match posting {
        Some(posting) if posting.can_edit => posting_form_page(
            &mut client,
            Some(post_id),
            PostingForm::from_posting(&posting),
            FormMessages::default(),
        ),
        Some(_) => {
            client.push_notice(Notice::error("You do not have permission to do that."));
            Ok(Redirect::to(&posting_path(post_id)).into_response())
        }
        None => detail_page(&mut client, post_id),
    }
}

pub async fn update_posting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<PostingForm>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    let back = posting_path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(err) => {
            let mut client = handle.lock().await;
            let messages = FormMessages::from_error(&err);
            return posting_form_page(&mut client, Some(post_id), form, messages);
        }
    };
    let outcome = act(
        &handle,
        |client| {
            let (view, session) = client.detail_and_session(post_id)?;
            view.begin_edit_posting(session, draft)
        },
        move |client, request, result| match client.detail_for(post_id) {
            Some(view) => view.finish_edit_posting(request, result),
            None => Ok(()),
        },
    )
    .await?;
    match outcome {
        Ok(Ok(())) => Ok(Redirect::to(&back).into_response()),
        Ok(Err(err)) => {
            let mut client = handle.lock().await;
            posting_form_page(&mut client, Some(post_id), form, FormMessages::from_error(&err))
        }
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

pub async fn delete_posting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Page {
    let handle = state.open(&session).await?;
    let post_id = PostId(id);
    let back = posting_path(post_id);
    if let Some(stop) = action_guard(RouteAccess::Authenticated, &*handle.lock().await, &back) {
        return Ok(stop);
    }

    let outcome = act(
        &handle,
        |client| {
            let (view, session) = client.detail_and_session(post_id)?;
            view.begin_delete_posting(session)
        },
        move |client, request, result| {
            let view = client.detail_for(post_id)?;
            view.finish_delete_posting(request, result);
            let removed = view.was_removed();
            if removed {
                client.close_detail();
                client.push_notice(Notice::info("Post deleted."));
            }
            Some(removed)
        },
    )
    .await?;
    match outcome {
        Ok(Some(true)) => Ok(Redirect::to("/").into_response()),
        Ok(_) => Ok(Redirect::to(&back).into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, &back).await),
    }
}

// ── Login / signup / logout ──────────────────────────────────────────────────

pub async fn login_page(State(state): State<AppState>, session: Session) -> Page {
    let handle = state.open(&session).await?;
    let mut client = handle.lock().await;
    if let Some(stop) = page_guard(RouteAccess::GuestOnly, &mut client)? {
        return Ok(stop);
    }
    let (nav, notices) = chrome(&mut client);
    render(LoginTemplate {
        nav,
        notices,
        username: String::new(),
        messages: FormMessages::default(),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Page {
    let handle = state.open(&session).await?;
    if let Some(stop) = action_guard(RouteAccess::GuestOnly, &*handle.lock().await, "/login") {
        return Ok(stop);
    }

    let username = form.username.clone();
    let credentials = Credentials {
        username: form.username,
        password: SecretString::from(form.password),
    };
    let outcome = match SessionStore::validate_login(&credentials) {
        Err(err) => Ok(Err(err)),
        Ok(()) => {
            act(
                &handle,
                |client| client.begin_login(credentials),
                |client, request, result| client.finish_login(request, result),
            )
            .await?
        }
    };

    match outcome {
        Ok(Ok(())) => Ok(Redirect::to("/").into_response()),
        Ok(Err(err)) => {
            let mut client = handle.lock().await;
            let (nav, notices) = chrome(&mut client);
            render(LoginTemplate {
                nav,
                notices,
                username,
                messages: FormMessages::from_error(&err),
            })
        }
        Err(rejected) => Ok(refuse(&handle, rejected, "/login").await),
    }
}

pub async fn signup_page(State(state): State<AppState>, session: Session) -> Page {
    let handle = state.open(&session).await?;
    let mut client = handle.lock().await;
    if let Some(stop) = page_guard(RouteAccess::GuestOnly, &mut client)? {
        return Ok(stop);
    }
    let (nav, notices) = chrome(&mut client);
    render(SignupTemplate {
        nav,
        notices,
        username: String::new(),
        email: String::new(),
        messages: FormMessages::default(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Page {
    let handle = state.open(&session).await?;
    if let Some(stop) = action_guard(RouteAccess::GuestOnly, &*handle.lock().await, "/signup") {
        return Ok(stop);
    }

    let (username, email) = (form.username.clone(), form.email.clone());
    let registration = Registration {
        username: form.username,
        email: form.email,
        password: SecretString::from(form.password),
    };
    let outcome = match SessionStore::validate_signup(&registration) {
        Err(err) => Ok(Err(err)),
        Ok(()) => {
            act(
                &handle,
                |client| client.begin_signup(registration),
                |client, request, result| client.finish_signup(request, result),
            )
            .await?
        }
    };

    match outcome {
        Ok(Ok(())) => Ok(Redirect::to("/").into_response()),
        Ok(Err(err)) => {
            let mut client = handle.lock().await;
            let (nav, notices) = chrome(&mut client);
            render(SignupTemplate {
                nav,
                notices,
                username,
                email,
                messages: FormMessages::from_error(&err),
            })
        }
        Err(rejected) => Ok(refuse(&handle, rejected, "/signup").await),
    }
}

pub async fn logout(State(state): State<AppState>, session: Session) -> Page {
    let handle = state.open(&session).await?;
    let api = handle.lock().await.api();
    let task_handle = Arc::clone(&handle);
    tokio::spawn(async move {
        let result = api.logout().await;
        let mut client = task_handle.lock().await;
        client.session.apply_logout(result);
        client.reset_screens();
    })
    .await?;
    info!("signed out");
    Ok(Redirect::to("/").into_response())
}

// ── Moderation ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AdminParams {
    pub tab: Option<AdminTab>,
    pub status: Option<String>,
}

fn report_filter(status: &str) -> Option<ReportFilter> {
    REPORT_FILTERS
        .iter()
        .map(|(filter, _)| *filter)
        .find(|filter| filter.as_str() == status)
}

fn post_filter(status: &str) -> Option<PostFilter> {
    POST_FILTERS
        .iter()
        .map(|(filter, _)| *filter)
        .find(|filter| filter.as_str() == status)
}

pub async fn admin(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<AdminParams>,
) -> Page {
    let handle = state.open(&session).await?;
    let fetch = {
        let mut client = handle.lock().await;
        if let Some(stop) = page_guard(RouteAccess::Admin, &mut client)? {
            return Ok(stop);
        }
        let panel = &mut client.admin;
        if let Some(tab) = params.tab {
            panel.set_tab(tab);
        }
        if let Some(status) = params.status.as_deref() {
            match panel.tab() {
                AdminTab::Reports => {
                    if let Some(filter) = report_filter(status) {
                        panel.set_report_filter(filter);
                    }
                }
                AdminTab::Postings => {
                    if let Some(filter) = post_filter(status) {
                        panel.set_post_filter(filter);
                    }
                }
            }
        }
        panel.needs_fetch() && !panel.is_fetching()
    };
    if fetch {
        let _ = act(
            &handle,
            |client| client.admin.begin_fetch(&client.session),
            |client, fetch, result| client.admin.finish_fetch(fetch, result),
        )
        .await?;
    }

    let mut client = handle.lock().await;
    admin_page(&mut client)
}

fn admin_page(client: &mut ClientSession) -> Page {
    let (nav, notices) = chrome(client);
    let panel = &client.admin;
    let reports_tab = panel.tab() == AdminTab::Reports;
    let filters = if reports_tab {
        REPORT_FILTERS
            .iter()
            .map(|(filter, label)| FilterLink {
                label: *label,
                href: format!("/admin?tab=reports&status={}", filter.as_str()),
                active: panel.report_filter() == *filter,
            })
            .collect()
    } else {
        POST_FILTERS
            .iter()
            .map(|(filter, label)| FilterLink {
                label: *label,
                href: format!("/admin?tab=postings&status={}", filter.as_str()),
                active: panel.post_filter() == *filter,
            })
            .collect()
    };
    render(AdminTemplate {
        nav,
        notices,
        reports_tab,
        filters,
        reports: panel.reports().iter().map(ReportRow::from).collect(),
        postings: panel.postings().iter().map(AdminPostRow::from).collect(),
        error: panel.error().unwrap_or_default().to_string(),
        loading: panel.is_fetching(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ResolveForm {
    pub action: ResolveAction,
}

pub async fn resolve_report(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ResolveForm>,
) -> Page {
    let handle = state.open(&session).await?;
    if let Some(stop) = action_guard(RouteAccess::Admin, &*handle.lock().await, "/admin") {
        return Ok(stop);
    }

    let report_id = ReportId(id);
    let outcome = act(
        &handle,
        |client| client.admin.begin_resolve(&client.session, report_id, form.action),
        |client, request, result| client.admin.finish_resolve(request, result),
    )
    .await?;
    match outcome {
        Ok(()) => Ok(Redirect::to("/admin").into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, "/admin").await),
    }
}

pub async fn moderate_delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Page {
    moderate(state, session, PostId(id), Moderation::Delete).await
}

pub async fn moderate_restore(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Page {
    moderate(state, session, PostId(id), Moderation::Restore).await
}

async fn moderate(state: AppState, session: Session, post_id: PostId, op: Moderation) -> Page {
    let handle = state.open(&session).await?;
    if let Some(stop) = action_guard(RouteAccess::Admin, &*handle.lock().await, "/admin") {
        return Ok(stop);
    }

    let outcome = act(
        &handle,
        |client| client.admin.begin_moderate(&client.session, post_id, op),
        |client, request, result| client.admin.finish_moderate(request, result),
    )
    .await?;
    match outcome {
        Ok(()) => Ok(Redirect::to("/admin").into_response()),
        Err(rejected) => Ok(refuse(&handle, rejected, "/admin").await),
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}
