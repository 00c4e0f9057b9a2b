//! HTTP implementation of the document backend

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{
    BatchStatusReport, DocumentFilter, FileUpload, LibraryDocument, UploadAck, UploadOptions,
};

use super::DocumentBackend;

/// Backend client speaking the document service's HTTP API
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend client
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn upload_documents(
        &self,
        files: &[FileUpload],
        options: &UploadOptions,
    ) -> Result<Vec<UploadAck>> {
        let options_json = serde_json::to_string(options)?;
        let mut form = Form::new().text("options", options_json);

        for file in files {
            let part = Part::bytes(file.data.clone()).file_name(file.filename.clone());
            form = form.part("files", part);
        }

        tracing::info!("Uploading {} files to {}", files.len(), self.base_url);

        let response = self
            .client
            .post(self.url("/api/documents/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Submission(format!(
                "upload returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn batch_status(&self, batch_id: &str) -> Result<BatchStatusReport> {
        let response = self
            .client
            .get(self.url(&format!("/api/documents/batch/{}/status", batch_id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::BatchNotFound(batch_id.to_string()));
        }

        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<LibraryDocument>> {
        let mut request = self.client.get(self.url("/api/documents"));
        if let Some(category) = &filter.category {
            request = request.query(&[("category", category)]);
        }
        if let Some(status) = &filter.status {
            request = request.query(&[("status", status)]);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn document_content(&self, document_id: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url(&format!("/api/documents/{}/content", document_id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }

        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}
