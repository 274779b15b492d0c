//! qBittorrent WebUI API v2 adapter.
//!
//! # Design
//! - Login once in `connect`; the HTTP client's cookie store replays the session cookie.
//! - Every request carries a `Referer` matching the base URL to satisfy the WebUI CSRF check.
//! - `torrents/add` answers `Fails.` for rejected adds; only transport faults are errors.

mod wire;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use torsync_core::{
    AddTorrent, AdapterError, AdapterResult, Capabilities, ClientAdapter, ClientKind,
    ClientVersion, ContentAccess, ContentHash, TorrentId, TorrentRecord,
};
use tracing::{debug, warn};
use url::Url;

use crate::content::{Payload, build_http_client, unexpected_status};
use wire::{TorrentInfo, add_form_fields};

const KIND: ClientKind = ClientKind::Qbittorrent;
const ADD_REJECTED: &str = "Fails.";
const LOGIN_ACCEPTED: &str = "Ok.";

/// Adapter speaking to a qBittorrent daemon over its WebUI API.
pub struct QbittorrentAdapter {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
    logged_in: bool,
}

impl QbittorrentAdapter {
    /// Build an adapter for the WebUI at `base_url` (e.g. `http://localhost:8080/`).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the HTTP client cannot be constructed.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> AdapterResult<Self> {
        Ok(Self {
            http: build_http_client(KIND, timeout)?,
            base_url,
            username: username.into(),
            password: password.into(),
            logged_in: false,
        })
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> AdapterResult<Url> {
        self.base_url
            .join(&format!("api/v2/{path}"))
            .map_err(|err| AdapterError::protocol(KIND, operation, err.to_string()))
    }

    const fn ensure_connected(&self) -> AdapterResult<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(AdapterError::NotConnected { client: KIND })
        }
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(REFERER, self.base_url.as_str())
    }

    async fn send(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> AdapterResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| AdapterError::connection(KIND, operation, err))?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth { client: KIND });
        }
        Ok(response)
    }

    async fn login(&self) -> AdapterResult<()> {
        let url = self.endpoint("login", "auth/login")?;
        let request = self.authorised(self.http.post(url)).form(&[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ]);
        let response = self.send("login", request).await?;
        if !response.status().is_success() {
            return Err(unexpected_status(KIND, "login", response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| AdapterError::connection(KIND, "login", err))?;
        if body.trim() != LOGIN_ACCEPTED {
            return Err(AdapterError::Auth { client: KIND });
        }
        Ok(())
    }

    async fn get_text(&self, operation: &'static str, path: &str) -> AdapterResult<String> {
        let url = self.endpoint(operation, path)?;
        let response = self
            .send(operation, self.authorised(self.http.get(url)))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_status(KIND, operation, response.status()));
        }
        response
            .text()
            .await
            .map_err(|err| AdapterError::connection(KIND, operation, err))
    }

    async fn post_hashes(&self, path: &str, hashes: &str) -> AdapterResult<StatusCode> {
        let url = self.endpoint("pause", path)?;
        let request = self
            .authorised(self.http.post(url))
            .form(&[("hashes", hashes)]);
        Ok(self.send("pause", request).await?.status())
    }
}

#[async_trait]
impl ClientAdapter for QbittorrentAdapter {
    fn kind(&self) -> ClientKind {
        KIND
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_labels: true,
            content_access: ContentAccess::Export,
        }
    }

    async fn connect(&mut self) -> AdapterResult<ClientVersion> {
        self.logged_in = false;
        self.login().await?;
        let version = self.get_text("version", "app/version").await?;
        let api_version = match self.get_text("api version", "app/webapiVersion").await {
            Ok(value) => Some(value.trim().to_string()),
            Err(err) => {
                debug!(error = %err, "qBittorrent did not report a WebUI API version");
                None
            }
        };
        self.logged_in = true;
        Ok(ClientVersion {
            version: version.trim().to_string(),
            api_version,
        })
    }

    async fn list_torrents(&self) -> AdapterResult<Vec<TorrentRecord>> {
        self.ensure_connected()?;
        let url = self.endpoint("list torrents", "torrents/info")?;
        let response = self
            .send("list torrents", self.authorised(self.http.get(url)))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_status(KIND, "list torrents", response.status()));
        }
        let torrents: Vec<TorrentInfo> = response
            .json()
            .await
            .map_err(|err| AdapterError::protocol(KIND, "list torrents", err.to_string()))?;

        Ok(torrents
            .into_iter()
            .filter_map(|info| match info.into_record() {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "skipping qBittorrent torrent with invalid hash");
                    None
                }
            })
            .collect())
    }

    async fn export_content(&self, hash: &ContentHash, output_dir: &Path) -> AdapterResult<PathBuf> {
        self.ensure_connected()?;
        let export_error = |source: AdapterError| AdapterError::Export {
            hash: hash.clone(),
            source: Box::new(source),
        };

        let url = self.endpoint("export", "torrents/export")?;
        let request = self
            .authorised(self.http.get(url))
            .query(&[("hash", hash.as_str())]);
        let response = self.send("export", request).await.map_err(export_error)?;
        if !response.status().is_success() {
            return Err(export_error(unexpected_status(
                KIND,
                "export",
                response.status(),
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| export_error(AdapterError::connection(KIND, "export", err)))?;

        let path = output_dir.join(format!("{hash}.torrent"));
        tokio::fs::write(&path, &bytes).await.map_err(|source| {
            export_error(AdapterError::io("write exported torrent", &path, source))
        })?;
        debug!(hash = %hash, path = %path.display(), "exported torrent");
        Ok(path)
    }

    async fn pause_torrent(&self, id: &TorrentId) -> AdapterResult<()> {
        self.ensure_connected()?;
        let mut status = self.post_hashes("torrents/pause", id.as_str()).await?;
        if status == StatusCode::NOT_FOUND {
            // qBittorrent 5 renamed pause to stop.
            status = self.post_hashes("torrents/stop", id.as_str()).await?;
        }
        if status.is_success() {
            Ok(())
        } else {
            Err(unexpected_status(KIND, "pause", status))
        }
    }

    async fn add_torrent(&self, request: &AddTorrent<'_>) -> AdapterResult<bool> {
        self.ensure_connected()?;
        let mut form = add_form_fields(request, self.capabilities().supports_labels)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        form = match Payload::load(request.locator).await? {
            Payload::Metainfo(bytes) => {
                let part = Part::bytes(bytes)
                    .file_name(format!("{}.torrent", request.content_hash))
                    .mime_str("application/x-bittorrent")
                    .map_err(|err| AdapterError::protocol(KIND, "add", err.to_string()))?;
                form.part("torrents", part)
            }
            Payload::Magnet(link) => form.text("urls", link),
        };

        let url = self.endpoint("add", "torrents/add")?;
        let response = self
            .send("add", self.authorised(self.http.post(url)).multipart(form))
            .await?;
        let status = response.status();
        if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            warn!(hash = %request.content_hash, "qBittorrent rejected the torrent file as invalid");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(unexpected_status(KIND, "add", status));
        }
        let body = response
            .text()
            .await
            .map_err(|err| AdapterError::connection(KIND, "add", err))?;
        if body.trim() == ADD_REJECTED {
            warn!(hash = %request.content_hash, name = request.name, "qBittorrent rejected the add");
            return Ok(false);
        }
        Ok(true)
    }
}
