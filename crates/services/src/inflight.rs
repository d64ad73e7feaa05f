//! # In-flight gate
//!
//! Every interactive control is disabled while its own request is pending.
//! A view hands out a [`Ticket`] when a request starts and takes it back when
//! the response is applied; asking again for the same action in between is
//! refused with [`ActionRejected::Busy`].

use std::collections::HashSet;

use domains::{CommentId, PostId, ReportId};

use crate::error::ActionRejected;

/// One gated control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Fetch,
    /// Login or signup; one at a time per client session.
    Authenticate,
    CreatePosting,
    Vote(PostId),
    Report(PostId),
    Comment(PostId),
    EditComment(CommentId),
    DeleteComment(CommentId),
    EditPosting(PostId),
    DeletePosting(PostId),
    Resolve(ReportId),
    Moderate(PostId),
}

/// Proof that a request for `action` is in flight. Not `Clone`: it can be
/// returned exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket keeps its control disabled until it is finished"]
pub struct Ticket {
    action: Action,
}

impl Ticket {
    pub fn action(&self) -> Action {
        self.action
    }
}

#[derive(Debug, Default)]
pub struct InFlight {
    pending: HashSet<Action>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, action: Action) -> Result<Ticket, ActionRejected> {
        if self.pending.insert(action) {
            Ok(Ticket { action })
        } else {
            Err(ActionRejected::Busy)
        }
    }

    pub fn finish(&mut self, ticket: Ticket) -> Action {
        self.pending.remove(&ticket.action);
        ticket.action
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.pending.contains(&action)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
