//! Supervisor API client
//!
//! The home-automation supervisor owns the snapshots: it creates them,
//! lists them, and removes them on request. This daemon only ever lists
//! and deletes; the local `.tar` files disappear once the supervisor
//! honors a removal.
//!
//! Inside an add-on container the API lives at `http://hassio` and
//! authenticates via the `HASSIO_TOKEN` environment variable, passed as
//! the `X-HASSIO-KEY` header. Responses wrap their payload in a
//! `{"result": ..., "data": ...}` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::snapshot::Snapshot;

const SUPERVISOR_BASE: &str = "http://hassio";

/// Environment variable holding the supervisor credential
pub const HASSIO_TOKEN_ENV: &str = "HASSIO_TOKEN";

/// Operations the backup engine needs from the supervisor
#[async_trait]
pub trait SupervisorApi: Send + Sync {
    /// List all known snapshots. Treated as unordered; callers re-sort.
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>>;

    /// Request deletion of a snapshot by slug
    ///
    /// Fire-and-forget beyond the error return; success is not verified
    /// further. The next cycle re-derives state from a fresh listing.
    async fn remove_snapshot(&self, slug: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SnapshotList {
    snapshots: Vec<Snapshot>,
}

/// HTTP client for the supervisor API
pub struct HttpSupervisor {
    http_client: Client,
    base_url: String,
    token: String,
}

impl HttpSupervisor {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Create from the `HASSIO_TOKEN` environment variable
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(HASSIO_TOKEN_ENV).map_err(|_| {
            Error::Config(format!("{} environment variable not set", HASSIO_TOKEN_ENV))
        })?;
        Ok(Self::new(SUPERVISOR_BASE, &token))
    }

    async fn check(&self, path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        debug!("{} -> {}", path, status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Supervisor(format!("{} {}: {}", path, status, body)))
    }
}

#[async_trait]
impl SupervisorApi for HttpSupervisor {
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let response = self
            .http_client
            .get(format!("{}/snapshots", self.base_url))
            .header("X-HASSIO-KEY", &self.token)
            .send()
            .await?;
        let response = self.check("snapshots", response).await?;
        let envelope: Envelope<SnapshotList> = response.json().await?;
        Ok(envelope.data.snapshots)
    }

    async fn remove_snapshot(&self, slug: &str) -> Result<()> {
        let path = format!("snapshots/{}/remove", slug);
        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .header("X-HASSIO-KEY", &self.token)
            .send()
            .await?;
        self.check(&path, response).await?;
        Ok(())
    }
}

/// In-memory supervisor for tests
#[derive(Clone, Default)]
pub struct MockSupervisor {
    state: std::sync::Arc<std::sync::Mutex<MockSupervisorState>>,
}

#[derive(Default)]
struct MockSupervisorState {
    snapshots: Vec<Snapshot>,
    removed: Vec<String>,
    lists: u32,
    fail_next_lists: u32,
    fail_next_removes: u32,
}

impl MockSupervisor {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            state: std::sync::Arc::new(std::sync::Mutex::new(MockSupervisorState {
                snapshots,
                ..Default::default()
            })),
        }
    }

    /// Fail the next `n` listing calls
    pub fn fail_next_lists(&self, n: u32) {
        self.state.lock().unwrap().fail_next_lists = n;
    }

    /// Fail the next `n` removal calls
    pub fn fail_next_removes(&self, n: u32) {
        self.state.lock().unwrap().fail_next_removes = n;
    }

    /// Slugs removal has been requested for, in order
    pub fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    /// How many listing calls have been made, successful or not
    pub fn list_count(&self) -> u32 {
        self.state.lock().unwrap().lists
    }
}

#[async_trait]
impl SupervisorApi for MockSupervisor {
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let mut state = self.state.lock().unwrap();
        state.lists += 1;
        if state.fail_next_lists > 0 {
            state.fail_next_lists -= 1;
            return Err(Error::Supervisor("injected listing failure".into()));
        }
        Ok(state.snapshots.clone())
    }

    async fn remove_snapshot(&self, slug: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_removes > 0 {
            state.fail_next_removes -= 1;
            return Err(Error::Supervisor("injected removal failure".into()));
        }
        state.removed.push(slug.to_string());
        state.snapshots.retain(|s| s.slug != slug);
        Ok(())
    }
}
