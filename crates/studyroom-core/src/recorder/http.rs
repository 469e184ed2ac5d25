//! HTTP session store -- `POST {base_url}/api/sessions`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::traits::SessionStore;
use crate::error::{ConfigError, RecordingError};
use crate::session::{SessionPayload, StoredSession, StudySession};
use crate::storage::config::BackendConfig;

const SESSIONS_PATH: &str = "api/sessions";

pub struct HttpSessionStore {
    sessions_url: Url,
    http_client: Client,
}

impl HttpSessionStore {
    /// Store rooted at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| ConfigError::InvalidValue {
            key: "backend".into(),
            message: e.to_string(),
        })?;
        Self::with_client(&config.base_url, client)
    }

    fn with_client(base_url: &str, http_client: Client) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "backend.base_url".into(),
            message,
        };
        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid(format!("'{base_url}' cannot be used as a base URL")));
        }
        // `join` replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let sessions_url = base
            .join(SESSIONS_PATH)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            sessions_url,
            http_client,
        })
    }

    pub fn sessions_url(&self) -> &Url {
        &self.sessions_url
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn create_session(
        &self,
        session: &StudySession,
    ) -> Result<StoredSession, RecordingError> {
        let body = SessionPayload::from(session);
        let resp = self
            .http_client
            .post(self.sessions_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RecordingError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<StoredSession>(&text)
            .map_err(|e| RecordingError::InvalidResponse(format!("{e}: {text}")))
    }
}
