//! # Internship Board
//!
//! Loads settings, starts tracing and serves the board pages in front of the
//! REST backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::web::{router, AppState, HttpApiConnector, SessionOptions};
use api_adapters::HttpApiConfig;
use configs::{LogFormat, Settings};
use services::ViewSizes;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", settings.log.level)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Drops client sessions whose cookie has expired anyway.
async fn sweep_task(state: AppState, idle: Duration) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let dropped = state.sweep_idle(idle);
        if dropped > 0 {
            debug!(dropped, remaining = state.active_clients(), "swept idle client sessions");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    if !settings.session.secure_cookies {
        warn!("secure cookies disabled - set BOARD__SESSION__SECURE_COOKIES=true behind HTTPS");
    }

    let connector = HttpApiConnector::new(HttpApiConfig {
        base_url: settings.backend.base_url.clone(),
        timeout: settings.backend.timeout(),
    });
    let sizes = ViewSizes {
        per_page: settings.ui.per_page,
        admin_per_page: settings.ui.admin_per_page,
    };
    let state = AppState::new(Arc::new(connector), sizes);
    let app = router(
        state.clone(),
        SessionOptions {
            cookie_name: settings.session.cookie_name.clone(),
            secure: settings.session.secure_cookies,
            idle: settings.session.idle(),
        },
    );

    tokio::spawn(sweep_task(state, settings.session.idle()));

    let addr = settings.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, backend = %settings.backend.base_url, "internship board listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
