//! # Route Guard
//!
//! Pure function of the session store: no network access, no side effects.

use crate::session::SessionStore;

/// Who may see a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Login and signup: signed-in visitors are sent home.
    GuestOnly,
    Authenticated,
    /// The moderation panel. Only admins get in; moderators go home with
    /// everyone else.
    Admin,
}

/// Screens a guard can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Login,
}

impl Screen {
    pub fn path(self) -> &'static str {
        match self {
            Screen::Home => "/",
            Screen::Login => "/login",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Session still resolving: show a neutral waiting state, decide later.
    Wait,
    Redirect(Screen),
}

pub fn decide(access: RouteAccess, session: &SessionStore) -> GuardDecision {
    if access == RouteAccess::Public {
        return GuardDecision::Render;
    }
    if !session.is_resolved() {
        return GuardDecision::Wait;
    }
    match access {
        RouteAccess::Public => GuardDecision::Render,
        RouteAccess::GuestOnly if session.is_authenticated() => {
            GuardDecision::Redirect(Screen::Home)
        }
        RouteAccess::GuestOnly => GuardDecision::Render,
        RouteAccess::Authenticated if session.is_authenticated() => GuardDecision::Render,
        RouteAccess::Authenticated => GuardDecision::Redirect(Screen::Login),
        RouteAccess::Admin if session.is_admin() => GuardDecision::Render,
        RouteAccess::Admin => GuardDecision::Redirect(Screen::Home),
    }
}
