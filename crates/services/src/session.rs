//! # Session Store
//!
//! Holds the identity of whoever is signed in for one client session.
//!
//! ```text
//! Uninitialized --begin_bootstrap--> Loading --finish_bootstrap--> Anonymous | Authenticated
//! Anonymous --login/signup ok--> Authenticated
//! Authenticated --logout--> Anonymous   (even when the logout call fails)
//! ```
//!
//! Each transition is split into a pure "apply" step so callers can await
//! the backend without holding whatever lock guards the store.

use domains::{
    validation, ApiResult, BoardApi, Credentials, Field, Identity, Registration,
};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::error::FormError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Anonymous,
    Authenticated(Identity),
}

/// Returned by [`SessionStore::begin_bootstrap`]; only one probe runs at a time.
#[derive(Debug)]
#[must_use]
pub struct BootstrapTicket(());

#[derive(Debug, Default)]
pub struct SessionStore {
    state: SessionState,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    /// False until the startup probe has resolved one way or the other.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self.state,
            SessionState::Anonymous | SessionState::Authenticated(_)
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(Identity::is_admin)
    }

    /// True for moderators and admins.
    pub fn is_moderator(&self) -> bool {
        self.identity().is_some_and(Identity::is_moderator)
    }

    // ── Bootstrap ────────────────────────────────────────────────────────────

    /// Enters `Loading`. Returns `None` when a probe already ran or is running.
    pub fn begin_bootstrap(&mut self) -> Option<BootstrapTicket> {
        match self.state {
            SessionState::Uninitialized => {
                self.state = SessionState::Loading;
                Some(BootstrapTicket(()))
            }
            _ => None,
        }
    }

    /// A failed probe is treated as "anonymous" and never surfaced.
    pub fn finish_bootstrap(&mut self, _ticket: BootstrapTicket, result: ApiResult<Identity>) {
        self.state = match result {
            Ok(identity) => {
                debug!(user_id = %identity.id, "existing session found");
                SessionState::Authenticated(identity)
            }
            Err(err) => {
                debug!(error = %err, "no existing session");
                SessionState::Anonymous
            }
        };
    }

    pub async fn bootstrap(&mut self, api: &dyn BoardApi) {
        if let Some(ticket) = self.begin_bootstrap() {
            let result = api.current_user().await;
            self.finish_bootstrap(ticket, result);
        }
    }

    // ── Login / signup ───────────────────────────────────────────────────────

    pub fn validate_login(credentials: &Credentials) -> Result<(), FormError> {
        let username = if credentials.username.trim().is_empty() {
            Some("Username is required")
        } else {
            None
        };
        let password = if credentials.password.expose_secret().is_empty() {
            Some("Password is required")
        } else {
            None
        };
        validation::collect([(Field::Username, username), (Field::Password, password)])?;
        Ok(())
    }

    pub fn validate_signup(registration: &Registration) -> Result<(), FormError> {
        validation::collect([
            (Field::Username, validation::username(&registration.username)),
            (Field::Email, validation::email(&registration.email)),
            (Field::Password, validation::password(registration.password.expose_secret())),
        ])?;
        Ok(())
    }

    /// On failure the current state is kept and the server message surfaced.
    pub fn apply_login(&mut self, result: ApiResult<Identity>) -> Result<&Identity, FormError> {
        self.apply_authentication(result, "Login failed")
    }

    pub fn apply_signup(&mut self, result: ApiResult<Identity>) -> Result<&Identity, FormError> {
        self.apply_authentication(result, "Signup failed")
    }

    fn apply_authentication(
        &mut self,
        result: ApiResult<Identity>,
        fallback: &str,
    ) -> Result<&Identity, FormError> {
        match result {
            Ok(identity) => {
                info!(user_id = %identity.id, role = identity.role.as_str(), "signed in");
                self.state = SessionState::Authenticated(identity);
                self.identity()
                    .ok_or_else(|| FormError::Rejected(fallback.to_string()))
            }
            Err(err) => {
                debug!(error = %err, "authentication rejected");
                Err(FormError::from_api(&err, fallback))
            }
        }
    }

    pub async fn login(
        &mut self,
        api: &dyn BoardApi,
        credentials: &Credentials,
    ) -> Result<&Identity, FormError> {
        Self::validate_login(credentials)?;
        let result = api.login(credentials).await;
        self.apply_login(result)
    }

    pub async fn signup(
        &mut self,
        api: &dyn BoardApi,
        registration: &Registration,
    ) -> Result<&Identity, FormError> {
        Self::validate_signup(registration)?;
        let result = api.signup(registration).await;
        self.apply_signup(result)
    }

    // ── Logout ───────────────────────────────────────────────────────────────

    /// Clears the identity whatever the backend said.
    pub fn apply_logout(&mut self, result: ApiResult<()>) {
        if let Err(err) = result {
            warn!(error = %err, "logout call failed; clearing local session anyway");
        }
        self.state = SessionState::Anonymous;
    }

    pub async fn logout(&mut self, api: &dyn BoardApi) {
        let result = api.logout().await;
        self.apply_logout(result);
    }
}
