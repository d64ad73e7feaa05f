//! # Services
//!
//! Client-side state for the internship board: who is signed in, what each
//! screen shows, and which requests are in flight. Nothing here talks HTTP
//! directly; every backend call goes through [`domains::BoardApi`].
//!
//! Mutations never guess. A view hands out a request (holding the control's
//! in-flight ticket), the caller sends it, and the view patches itself from
//! the backend's response once it comes back.

pub mod admin;
pub mod client;
pub mod compose;
pub mod detail;
pub mod error;
pub mod guard;
pub mod inflight;
pub mod listing;
pub mod notice;
pub mod requests;
pub mod session;

pub use admin::{AdminFetch, AdminPanel, AdminQuery, AdminRows, AdminTab};
pub use client::{ClientSession, ViewSizes};
pub use compose::PostingForm;
pub use detail::{DetailFetch, PostDetailView};
pub use error::{ActionRejected, FormError};
pub use guard::{decide, GuardDecision, RouteAccess, Screen};
pub use inflight::{Action, InFlight, Ticket};
pub use listing::{ListFilters, PaginationControls, PostFetch, PostListView, REPORT_THANKS};
pub use notice::{Notice, NoticeLevel};
pub use requests::{
    CommentDeleteRequest, CommentEditRequest, CommentRequest, LoginRequest, ModerateRequest,
    Moderation, Outbound, PostingCreateRequest, PostingDeleteRequest, PostingEditRequest,
    ReportRequest, ResolveRequest, SignupRequest, VoteRequest,
};
pub use session::{SessionState, SessionStore};
