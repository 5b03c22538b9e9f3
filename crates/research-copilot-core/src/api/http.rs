use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{
    ErrorBody, FileInfoResponse, FilesResponse, QuestionRequest, SummaryResponse,
    TranslateRequest, TranslatedSummaryResponse, UploadResponse,
};
use super::{Answer, BackendApi, UploadFile};
use crate::config::{AppConfig, Lang};
use crate::error::{Error, Result};
use crate::model::{DocId, DocumentRecord, FileMetadata};

/// Backend client over HTTP.
///
/// Only uploads carry an explicit timeout; every other request relies on
/// the transport default.
pub struct HttpBackend {
    client: Client,
    /// Origin of the backend (e.g., "http://localhost:8000")
    pub api_base: String,
    /// Timeout applied to uploads only
    pub upload_timeout: Duration,
}

impl HttpBackend {
    pub fn new(api_base: impl Into<String>, upload_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            upload_timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api_base.clone(), config.upload_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_base.trim_end_matches('/'), path)
    }

    /// URL of a per-document endpoint; the id is sent as one path segment.
    fn doc_url(&self, endpoint: &str, id: &DocId) -> String {
        self.url(&format!("{}/{}", endpoint, urlencoding::encode(id.as_str())))
    }

    /// Send a request and turn transport failures and non-2xx statuses
    /// into [`Error`].
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("Request failed: {}", e);
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::detail_text);
        warn!("API error: {} - {}", status, body);

        Err(Error::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn upload(&self, file: UploadFile) -> Result<DocId> {
        let url = self.url("upload");
        debug!("POST {} ({}, {} bytes)", url, file.filename, file.bytes.len());

        let mime = mime_guess::from_path(&file.filename).first_or_octet_stream();
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(mime.as_ref())
            .map_err(|e| Error::InvalidResponse(format!("invalid upload MIME type: {e}")))?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .timeout(self.upload_timeout);

        let response = self.send(request).await?;
        let body: UploadResponse = Self::json(response).await?;
        Ok(body.doc_id)
    }

    async fn list_files(&self) -> Result<Vec<DocumentRecord>> {
        let url = self.url("files");
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        let body: FilesResponse = Self::json(response).await?;
        Ok(body.files.into_iter().map(DocumentRecord::from).collect())
    }

    async fn file_info(&self, id: &DocId) -> Result<FileMetadata> {
        let url = self.doc_url("file-info", id);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        let body: FileInfoResponse = Self::json(response).await?;
        Ok(body.into())
    }

    async fn delete(&self, id: &DocId) -> Result<()> {
        let url = self.doc_url("delete", id);
        debug!("DELETE {}", url);

        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn analyze(&self, id: &DocId) -> Result<String> {
        let url = self.doc_url("analyze", id);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        let body: SummaryResponse = Self::json(response).await?;
        Ok(body.summary)
    }

    async fn translate_summary(&self, id: &DocId, lang: &Lang) -> Result<String> {
        let url = self.doc_url("translate", id);
        debug!("POST {} (target {})", url, lang);

        let request = self.client.post(&url).json(&TranslateRequest {
            target_lang: lang.as_str(),
        });
        let response = self.send(request).await?;
        let body: TranslatedSummaryResponse = Self::json(response).await?;
        Ok(body.translated_summary)
    }

    async fn translate_document(&self, id: &DocId, lang: &Lang) -> Result<Bytes> {
        let url = self.doc_url("translate", id);
        debug!("POST {} (target {}, binary)", url, lang);

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/octet-stream, text/plain, */*")
            .json(&TranslateRequest {
                target_lang: lang.as_str(),
            });
        let response = self.send(request).await?;
        response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("download interrupted: {e}")))
    }

    async fn ask(&self, id: &DocId, question: &str) -> Result<Answer> {
        let url = self.doc_url("qa", id);
        debug!("POST {}", url);

        let request = self.client.post(&url).json(&QuestionRequest { question });
        let response = self.send(request).await?;
        Self::json(response).await
    }
}
