//! The loopback HTTP interface of the password daemon.
//!
//! ```text
//! GET  /             cached password, empty body when none
//! POST /             cache the body as the password (400 if empty)
//! GET  /reset-timer  restart the window, return the password
//! POST /reset-timer  restart the window
//! GET  /ping         liveness
//! ```

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use zeroize::Zeroizing;

use super::cache::PasswordCache;
use crate::errors::{Result, ResultExt};

/// Build the daemon's router around `cache`.
pub fn router(cache: PasswordCache) -> Router {
    Router::new()
        .route("/", get(current_password).post(store_password))
        .route("/reset-timer", get(reset_and_fetch).post(reset_only))
        .route("/ping", get(ping))
        .with_state(cache)
}

/// Bind `127.0.0.1:port` and serve until Ctrl-C.
pub async fn serve(port: u16, ttl: Duration) -> Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .await
        .context(format!("bind 127.0.0.1:{port}"))?;
    let cache = PasswordCache::new(ttl);
    tracing::info!(addr = %listener.local_addr()?, ttl_secs = cache.ttl().as_secs(), "password daemon listening");

    serve_listener(listener, cache, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn serve_listener<F>(listener: TcpListener, cache: PasswordCache, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let expiry = tokio::spawn(cache.clone().run_expiry());
    let served = axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await;
    expiry.abort();
    Ok(served?)
}

async fn current_password(State(cache): State<PasswordCache>) -> String {
    cache
        .get()
        .await
        .map(|pw| pw.to_string())
        .unwrap_or_default()
}

async fn store_password(State(cache): State<PasswordCache>, body: Bytes) -> StatusCode {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    match String::from_utf8(body.to_vec()) {
        Ok(password) => {
            cache.store(Zeroizing::new(password)).await;
            StatusCode::OK
        }
        Err(_) => StatusCode::BAD_REQUEST,
    }
}

async fn reset_and_fetch(State(cache): State<PasswordCache>) -> String {
    cache
        .reset_timer()
        .await
        .map(|pw| pw.to_string())
        .unwrap_or_default()
}

async fn reset_only(State(cache): State<PasswordCache>) -> StatusCode {
    cache.reset_timer().await;
    StatusCode::OK
}

async fn ping() -> StatusCode {
    StatusCode::OK
}
