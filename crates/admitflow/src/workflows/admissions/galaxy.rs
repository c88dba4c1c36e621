use async_trait::async_trait;
use serde::Deserialize;

use super::domain::{galaxy_path_for, ApplicationId};
use crate::config::GalaxyConfig;

/// Outbound propagation hook for the Galaxy system-of-record.
///
/// One logical endpoint per section; implementations return the status string
/// Galaxy reports for the section or fail with a transport/backend error.
#[async_trait]
pub trait GalaxyGateway: Send + Sync {
    async fn sync_section(
        &self,
        application_id: &ApplicationId,
        section: &str,
    ) -> Result<String, GalaxySyncError>;
}

/// Error enumeration for Galaxy propagation failures.
#[derive(Debug, thiserror::Error)]
pub enum GalaxySyncError {
    #[error("no Galaxy endpoint registered for section '{0}'")]
    UnknownSection(String),
    #[error("galaxy transport failure: {0}")]
    Transport(String),
    #[error("galaxy rejected the sync request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Deserialize)]
struct GalaxySyncResponse {
    status: String,
}

/// reqwest-backed gateway hitting the per-section Galaxy sync endpoints.
pub struct HttpGalaxyGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGalaxyGateway {
    pub fn new(config: &GalaxyConfig) -> Result<Self, GalaxySyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| GalaxySyncError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GalaxyGateway for HttpGalaxyGateway {
    async fn sync_section(
        &self,
        application_id: &ApplicationId,
        section: &str,
    ) -> Result<String, GalaxySyncError> {
        let path = galaxy_path_for(section)
            .ok_or_else(|| GalaxySyncError::UnknownSection(section.to_string()))?;
        let url = format!(
            "{}/applications/{}/sync/{}",
            self.base_url, application_id.0, path
        );

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|err| GalaxySyncError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GalaxySyncError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: GalaxySyncResponse = response
            .json()
            .await
            .map_err(|err| GalaxySyncError::Transport(err.to_string()))?;
        Ok(payload.status)
    }
}
