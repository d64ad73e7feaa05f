//! Per-visitor client sessions.
//!
//! The browser only carries an opaque id in its `tower-sessions` cookie.
//! The id maps to a [`ClientSession`] that owns its own backend handle, so
//! two visitors never share a backend cookie jar.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use domains::{ApiResult, BoardApi};
use services::{ClientSession, ViewSizes};
use tokio::sync::Mutex;
use tower_sessions::Session;
use tracing::debug;
use uuid::Uuid;

use crate::http::{HttpApiConfig, HttpBoardApi};
use crate::web::error::WebError;

const CLIENT_KEY: &str = "client_id";

pub type ClientHandle = Arc<Mutex<ClientSession>>;

/// Opens a fresh backend handle for a new visitor.
pub trait ApiConnector: Send + Sync {
    fn connect(&self) -> ApiResult<Arc<dyn BoardApi>>;
}

#[derive(Debug, Clone)]
pub struct HttpApiConnector {
    config: HttpApiConfig,
}

impl HttpApiConnector {
    pub fn new(config: HttpApiConfig) -> Self {
        Self { config }
    }
}

impl ApiConnector for HttpApiConnector {
    fn connect(&self) -> ApiResult<Arc<dyn BoardApi>> {
        Ok(Arc::new(HttpBoardApi::new(&self.config)?))
    }
}

struct Slot {
    client: ClientHandle,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    clients: Arc<DashMap<Uuid, Slot>>,
    connector: Arc<dyn ApiConnector>,
    sizes: ViewSizes,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("clients", &self.clients.len())
            .field("sizes", &self.sizes)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(connector: Arc<dyn ApiConnector>, sizes: ViewSizes) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            connector,
            sizes,
        }
    }

    pub fn active_clients(&self) -> usize {
        self.clients.len()
    }

    /// The visitor's client session, created on first contact. A new session
    /// probes the backend for an existing login before it is handed out.
    pub async fn open(&self, session: &Session) -> Result<ClientHandle, WebError> {
        let handle = self.client(session).await?;
        bootstrap(&handle).await?;
        Ok(handle)
    }

    async fn client(&self, session: &Session) -> Result<ClientHandle, WebError> {
        if let Some(id) = session.get::<Uuid>(CLIENT_KEY).await? {
            if let Some(mut slot) = self.clients.get_mut(&id) {
                slot.last_seen = Instant::now();
                return Ok(Arc::clone(&slot.client));
            }
        }

        let id = Uuid::new_v4();
        let api = self.connector.connect().map_err(WebError::Connect)?;
        let client = Arc::new(Mutex::new(ClientSession::new(api, self.sizes)));
        self.clients.insert(
            id,
            Slot {
                client: Arc::clone(&client),
                last_seen: Instant::now(),
            },
        );
        session.insert(CLIENT_KEY, id).await?;
        debug!(client = %id, "client session opened");
        Ok(client)
    }

    /// Drops client sessions nobody has used for `max_idle`.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, slot| slot.last_seen.elapsed() < max_idle);
        before.saturating_sub(self.clients.len())
    }
}

/// Runs the startup `/auth/me` probe once per client session. Detached so
/// that a dropped request cannot leave the store stuck in `Loading`.
async fn bootstrap(handle: &ClientHandle) -> Result<(), WebError> {
    let (ticket, api) = {
        let mut client = handle.lock().await;
        match client.session.begin_bootstrap() {
            Some(ticket) => (ticket, client.api()),
            None => return Ok(()),
        }
    };
    let handle = Arc::clone(handle);
    tokio::spawn(async move {
        let result = api.current_user().await;
        handle.lock().await.session.finish_bootstrap(ticket, result);
    })
    .await?;
    Ok(())
}
