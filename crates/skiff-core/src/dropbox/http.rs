//! Dropbox HTTP client
//!
//! Speaks the two halves of the Dropbox v2 API directly:
//!
//! - RPC endpoints on `api.dropboxapi.com` take and return JSON bodies
//!   (`users/get_current_account`, `files/get_metadata`, `files/delete_v2`)
//! - Content endpoints on `content.dropboxapi.com` take the request
//!   arguments in a `Dropbox-API-Arg` header and the raw bytes as an
//!   octet-stream body (`files/upload`, `files/upload_session/*`)
//!
//! HTTP 401 maps to `Error::Auth`; a `path/not_found` conflict from
//! `get_metadata` maps to `Ok(None)`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{DropboxStore, FileMetadata};

const API_BASE: &str = "https://api.dropboxapi.com/2";
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

/// Client for the real Dropbox API
pub struct HttpDropboxStore {
    http_client: Client,
    access_token: String,
}

impl HttpDropboxStore {
    pub fn new(access_token: &str) -> Self {
        Self {
            http_client: Client::new(),
            access_token: access_token.to_string(),
        }
    }

    /// POST to an RPC endpoint with a JSON body
    async fn rpc<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Response> {
        let response = self
            .http_client
            .post(format!("{}/{}", API_BASE, endpoint))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        debug!("{} -> {}", endpoint, response.status());
        Ok(response)
    }

    /// POST bytes to a content endpoint, arguments in the API-Arg header
    async fn content<A: Serialize>(
        &self,
        endpoint: &str,
        arg: &A,
        data: Vec<u8>,
    ) -> Result<Response> {
        let arg_json = serde_json::to_string(arg)?;
        let response = self
            .http_client
            .post(format!("{}/{}", CONTENT_BASE, endpoint))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg_json)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await?;
        debug!("{} -> {}", endpoint, response.status());
        Ok(response)
    }

    /// Turn a non-success response into the matching error variant
    async fn check(&self, endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(format!("{}: {}", endpoint, body)));
        }
        Err(Error::Dropbox(format!("{} {}: {}", endpoint, status, body)))
    }
}

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    content_hash: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CommitInfo<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

impl<'a> CommitInfo<'a> {
    fn add(path: &'a str) -> Self {
        Self {
            path,
            mode: "add",
            autorename: false,
            mute: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionStartArg {
    close: bool,
}

#[derive(Debug, Deserialize)]
struct SessionStartResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct SessionCursor<'a> {
    session_id: &'a str,
    offset: u64,
}

#[derive(Debug, Serialize)]
struct SessionAppendArg<'a> {
    cursor: SessionCursor<'a>,
    close: bool,
}

#[derive(Debug, Serialize)]
struct SessionFinishArg<'a> {
    cursor: SessionCursor<'a>,
    commit: CommitInfo<'a>,
}

#[async_trait]
impl DropboxStore for HttpDropboxStore {
    async fn current_account(&self) -> Result<()> {
        let response = self
            .rpc("users/get_current_account", &serde_json::Value::Null)
            .await?;
        self.check("users/get_current_account", response).await?;
        Ok(())
    }

    async fn get_metadata(&self, path: &str) -> Result<Option<FileMetadata>> {
        let response = self.rpc("files/get_metadata", &PathArg { path }).await?;

        // A missing path comes back as a 409 conflict naming path/not_found.
        if response.status() == StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            if body.contains("not_found") {
                return Ok(None);
            }
            return Err(Error::Dropbox(format!("files/get_metadata 409: {}", body)));
        }

        let response = self.check("files/get_metadata", response).await?;
        let metadata: MetadataResponse = response.json().await?;

        match (metadata.content_hash, metadata.size) {
            (Some(content_hash), Some(size)) => Ok(Some(FileMetadata { content_hash, size })),
            _ => Err(Error::Dropbox(format!(
                "{} exists but is not a file",
                path
            ))),
        }
    }

    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()> {
        let response = self
            .content("files/upload", &CommitInfo::add(path), data)
            .await?;
        self.check("files/upload", response).await?;
        Ok(())
    }

    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String> {
        let response = self
            .content(
                "files/upload_session/start",
                &SessionStartArg { close: false },
                data,
            )
            .await?;
        let response = self.check("files/upload_session/start", response).await?;
        let started: SessionStartResponse = response.json().await?;
        Ok(started.session_id)
    }

    async fn upload_session_append(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
    ) -> Result<()> {
        let arg = SessionAppendArg {
            cursor: SessionCursor { session_id, offset },
            close: false,
        };
        let response = self
            .content("files/upload_session/append_v2", &arg, data)
            .await?;
        self.check("files/upload_session/append_v2", response)
            .await?;
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
        path: &str,
    ) -> Result<()> {
        let arg = SessionFinishArg {
            cursor: SessionCursor { session_id, offset },
            commit: CommitInfo::add(path),
        };
        let response = self
            .content("files/upload_session/finish", &arg, data)
            .await?;
        self.check("files/upload_session/finish", response).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self.rpc("files/delete_v2", &PathArg { path }).await?;
        self.check("files/delete_v2", response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_info_serializes_add_mode() {
        let arg = serde_json::to_value(CommitInfo::add("/snapshots/abc.tar")).unwrap();
        assert_eq!(arg["path"], "/snapshots/abc.tar");
        assert_eq!(arg["mode"], "add");
        assert_eq!(arg["autorename"], false);
    }

    #[test]
    fn test_finish_arg_carries_cursor_and_commit() {
        let arg = SessionFinishArg {
            cursor: SessionCursor {
                session_id: "sess-1",
                offset: 8_388_608,
            },
            commit: CommitInfo::add("/snapshots/abc.tar"),
        };
        let value = serde_json::to_value(&arg).unwrap();
        assert_eq!(value["cursor"]["session_id"], "sess-1");
        assert_eq!(value["cursor"]["offset"], 8_388_608);
        assert_eq!(value["commit"]["path"], "/snapshots/abc.tar");
    }
}
