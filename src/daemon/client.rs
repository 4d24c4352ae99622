//! Blocking client for the password daemon, used by the CLI commands.

use std::time::Duration;

use ureq::Agent;
use zeroize::Zeroizing;

use crate::errors::{Result, ShhError};

/// How long to wait on the daemon before treating it as absent.
const TIMEOUT: Duration = Duration::from_secs(2);

pub struct DaemonClient {
    base_url: String,
    agent: Agent,
}

impl DaemonClient {
    /// A client for the daemon on `127.0.0.1:port`.
    pub fn new(port: u16) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            agent,
        }
    }

    /// Succeeds if a daemon is listening.
    pub fn ping(&self) -> Result<()> {
        let resp = self
            .agent
            .get(self.url("/ping"))
            .call()
            .map_err(|e| self.unreachable(e))?;
        if !resp.status().is_success() {
            return Err(ShhError::DaemonError(format!(
                "ping returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// The cached password, optionally restarting the daemon's window.
    pub fn password(&self, reset_timer: bool) -> Result<Option<Zeroizing<String>>> {
        let path = if reset_timer { "/reset-timer" } else { "/" };
        let mut resp = self
            .agent
            .get(self.url(path))
            .call()
            .map_err(|e| self.unreachable(e))?;
        if !resp.status().is_success() {
            return Err(ShhError::DaemonError(format!(
                "GET {path} returned {}",
                resp.status()
            )));
        }
        let body = Zeroizing::new(
            resp.body_mut()
                .read_to_string()
                .map_err(|e| ShhError::DaemonError(format!("read response: {e}")))?,
        );
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    /// Hand a verified password to the daemon.
    pub fn store_password(&self, password: &str) -> Result<()> {
        let resp = self
            .agent
            .post(self.url("/"))
            .header("Content-Type", "text/plain")
            .send(password.as_bytes())
            .map_err(|e| self.unreachable(e))?;
        if !resp.status().is_success() {
            return Err(ShhError::DaemonError(format!(
                "storing password returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Probe for a cached password, restarting its window.
    ///
    /// A daemon that is not running simply has no password.
    pub fn cached_password(&self) -> Option<Zeroizing<String>> {
        match self.password(true) {
            Ok(password) => password,
            Err(e) => {
                tracing::debug!(error = %e, "no password from daemon");
                None
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn unreachable(&self, err: ureq::Error) -> ShhError {
        tracing::debug!(error = %err, url = %self.base_url, "daemon request failed");
        ShhError::DaemonUnreachable(self.base_url.clone())
    }
}
