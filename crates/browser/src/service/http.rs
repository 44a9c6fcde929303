//! HTTP/JSON client for a remote file service.
//!
//! Endpoint layout (relative to the configured base URL):
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list      | `GET /api/files?path=` |
//! | upload    | `POST /api/files/upload` (multipart: `path` + one `files` part per file) |
//! | delete    | `POST /api/files/delete` (JSON body) |
//! | download  | `GET /api/files/download?path=` |
//! | info      | `GET /api/files/info?path=` |

use std::time::Duration;

use protocol::{
    DeleteRequest, DeleteResponse, DownloadPayload, ErrorBody, FileInfo, ListResponse,
    ProtocolError, Result, UploadPart, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::FileService;
use crate::config::ServiceConfig;

/// HTTP implementation of [`FileService`].
pub struct HttpFileService {
    client: Client,
    base_url: String,
}

impl HttpFileService {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[service]` configuration section.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/files{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T> {
        let url = self.url(endpoint);
        debug!(%url, path, "GET");
        let response = self
            .client
            .get(&url)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport_error)?;
        decode(check_status(response).await?).await
    }
}

impl FileService for HttpFileService {
    async fn list(&self, path: &str) -> Result<ListResponse> {
        self.get_json("", path).await
    }

    async fn upload(&self, path: &str, parts: Vec<UploadPart>) -> Result<UploadResponse> {
        let url = self.url("/upload");
        debug!(%url, path, files = parts.len(), "POST multipart");

        let mut form = Form::new().text("path", path.to_string());
        for part in parts {
            form = form.part("files", Part::bytes(part.data).file_name(part.name));
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        decode(check_status(response).await?).await
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse> {
        let url = self.url("/delete");
        debug!(%url, path = %request.path, "POST delete");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        decode(check_status(response).await?).await
    }

    async fn download(&self, path: &str) -> Result<DownloadPayload> {
        let url = self.url("/download");
        debug!(%url, path, "GET download");

        let response = self
            .client
            .get(&url)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let data = response.bytes().await.map_err(transport_error)?;

        Ok(DownloadPayload {
            file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            data: data.to_vec(),
        })
    }

    async fn file_info(&self, path: &str) -> Result<FileInfo> {
        self.get_json("/info", path).await
    }
}

fn transport_error(err: reqwest::Error) -> ProtocolError {
    if err.is_timeout() {
        ProtocolError::Timeout(err.to_string())
    } else if err.is_decode() {
        ProtocolError::Deserialization(err.to_string())
    } else {
        ProtocolError::Network(err.to_string())
    }
}

/// Turn a non-success status into a rejection carrying the service's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = rejection_message(status.as_u16(), status.canonical_reason(), &body);
    Err(ProtocolError::rejected(Some(status.as_u16()), message))
}

fn rejection_message(status: u16, reason: Option<&str>, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match reason {
        Some(reason) => format!("{} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(transport_error)?;
    Ok(serde_json::from_slice(&body)?)
}
