use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OcrConfig;
use crate::workflows::admissions::ApplicationId;

/// Upload request forwarded to the external document store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub application_id: ApplicationId,
    pub document_type_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub process_ocr: bool,
}

/// Acknowledgement for an accepted upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub document_id: String,
}

/// Upload failure is terminal: no OCR polling may begin after one.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("document store rejected the upload (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("document transport failure: {0}")]
    Transport(String),
}

/// External document-store boundary.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UploadError>;
}

/// reqwest-backed gateway posting multipart uploads to the document store.
pub struct HttpDocumentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentGateway {
    pub fn new(config: &OcrConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| UploadError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DocumentGateway for HttpDocumentGateway {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UploadError> {
        let mime = mime_guess::from_path(&request.file_name).first_or_octet_stream();
        let part = reqwest::multipart::Part::bytes(request.bytes)
            .file_name(request.file_name.clone())
            .mime_str(mime.essence_str())
            .map_err(|err| UploadError::Transport(err.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("application_id", request.application_id.0.clone())
            .text("document_type_id", request.document_type_id.clone())
            .text("process_ocr", request.process_ocr.to_string())
            .part("file", part);

        let url = format!("{}/uploads", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|err| UploadError::Transport(err.to_string()))
    }
}
