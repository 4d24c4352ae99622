//! The daemon's only state: one password and the moment it expires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use zeroize::Zeroizing;

struct CacheState {
    password: Option<Zeroizing<String>>,
    deadline: Instant,
}

impl CacheState {
    /// Drop the password if its window has passed.  Returns `true` if it did.
    fn expire(&mut self, now: Instant) -> bool {
        now >= self.deadline && self.password.take().is_some()
    }
}

/// A password held in memory for a bounded window.
///
/// Cloning is cheap and every clone shares the same state.  Reads check
/// the deadline themselves, so an expired password is never handed out
/// even before [`PasswordCache::run_expiry`] gets to clear it.
#[derive(Clone)]
pub struct PasswordCache {
    state: Arc<Mutex<CacheState>>,
    rearmed: Arc<Notify>,
    ttl: Duration,
}

impl PasswordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                password: None,
                deadline: Instant::now(),
            })),
            rearmed: Arc::new(Notify::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached password, if one is held and still inside its window.
    pub async fn get(&self) -> Option<Zeroizing<String>> {
        let mut state = self.state.lock().await;
        if state.expire(Instant::now()) {
            tracing::info!("cached password expired");
        }
        state.password.clone()
    }

    /// Cache `password` and start a fresh window.
    pub async fn store(&self, password: Zeroizing<String>) {
        let mut state = self.state.lock().await;
        state.password = Some(password);
        state.deadline = Instant::now() + self.ttl;
        drop(state);
        self.rearmed.notify_one();
        tracing::info!(ttl_secs = self.ttl.as_secs(), "password cached");
    }

    /// Restart the window without touching the password.  Returns the
    /// password, if one is still held.
    pub async fn reset_timer(&self) -> Option<Zeroizing<String>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state.expire(now) {
            tracing::info!("cached password expired");
        }
        state.deadline = now + self.ttl;
        let password = state.password.clone();
        drop(state);
        self.rearmed.notify_one();
        tracing::debug!("expiry timer reset");
        password
    }

    /// Clear the password when its window ends.  Runs until aborted.
    pub async fn run_expiry(self) {
        loop {
            let deadline = self.state.lock().await.deadline;
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    if self.state.lock().await.expire(Instant::now()) {
                        tracing::info!("cached password expired");
                    }
                    // Nothing left to time until the next store or reset.
                    if self.state.lock().await.password.is_none() {
                        self.rearmed.notified().await;
                    }
                }
                _ = self.rearmed.notified() => {}
            }
        }
    }
}
