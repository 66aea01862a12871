//! Maven repository access over HTTP

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{
    CONNECT_TIMEOUT_SECS, MAX_RETRIES, REQUEST_TIMEOUT_SECS, RETRY_DELAY_SECS, RepositoryConfig,
    USER_AGENT,
};
use crate::version::error::RepositoryError;
use crate::version::maven::MavenVersion;
use crate::version::metadata::MavenMetadata;
use crate::version::pom::project_url;
use crate::version::repository::{ArtifactCoordinates, MetadataRepository};

/// Repository implementation for Maven repositories served over http(s)
pub struct HttpRepository {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpRepository {
    /// Creates a repository client for the configured url, credentials and proxy
    pub fn new(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        let raw = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RepositoryError::InvalidUrl("repository url not specified".to_string()))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));

        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy.trim())?);
        }

        let credentials = match (&config.username, &config.password) {
            (Some(username), password) if !username.is_empty() => {
                Some((username.clone(), password.clone().unwrap_or_default()))
            }
            _ => None,
        };

        Ok(Self {
            client: builder.build()?,
            base_url: base_url(raw)?,
            credentials,
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
        })
    }

    /// Override the pause between retries of a failed request
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn resolve(&self, path: &str) -> Result<Url, RepositoryError> {
        self.base_url
            .join(path)
            .map_err(|e| RepositoryError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.with_credentials(self.client.get(url))
    }

    fn with_credentials(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// GET `url`, retrying network errors and 5xx answers
    async fn send_with_retry(&self, url: &Url) -> Result<reqwest::Response, RepositoryError> {
        let mut attempt = 0;
        loop {
            let result = self
                .get(url.clone())
                .header(ACCEPT, "application/xml")
                .send()
                .await;

            let retryable = match &result {
                Ok(response) => response.status().is_server_error(),
                Err(e) => {
                    error!("Exception while connecting to {}: {}", url, e);
                    e.is_connect() || e.is_timeout() || e.is_request()
                }
            };
            if !retryable || attempt >= self.max_retries {
                return Ok(result?);
            }

            attempt += 1;
            warn!(
                "Retrying request to {} ({}/{})",
                url, attempt, self.max_retries
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// GET `url` and return the body of a 200 answer
    async fn fetch_document(&self, url: Url) -> Result<String, RepositoryError> {
        let response = self.send_with_retry(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound(url.to_string()));
        }

        if status != StatusCode::OK {
            warn!("Maven repository returned status {}: {}", status, url);
            return Err(RepositoryError::InvalidResponse(format!(
                "HTTP {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Maven repository response: {}", e);
            RepositoryError::InvalidResponse(e.to_string())
        })?;
        debug!("{}", body);

        Ok(body)
    }

    async fn fetch_metadata(&self, url: Url) -> Result<MavenMetadata, RepositoryError> {
        let body = self.fetch_document(url).await?;
        Ok(MavenMetadata::parse(&body))
    }
}

/// Parses the repository url, making sure relative paths join below it
fn base_url(raw: &str) -> Result<Url, RepositoryError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&with_slash).map_err(|e| RepositoryError::InvalidUrl(format!("{}: {}", raw, e)))
}

#[async_trait::async_trait]
impl MetadataRepository for HttpRepository {
    async fn fetch_all_versions_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
    ) -> Result<MavenMetadata, RepositoryError> {
        let url = self.resolve(&coordinates.metadata_path())?;
        info!("Getting versions from {}", url);
        self.fetch_metadata(url).await
    }

    async fn fetch_snapshot_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<MavenMetadata, RepositoryError> {
        let url = self.resolve(&coordinates.snapshot_metadata_path(version))?;
        info!("Getting version for SNAPSHOT {}", url);
        self.fetch_metadata(url).await
    }

    async fn fetch_trackback_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<Option<String>, RepositoryError> {
        let url = self.resolve(&format!(
            "{}{}",
            coordinates.version_path(version),
            coordinates.pom_file_name(version)
        ))?;
        info!("Getting trackback from {}", url);
        let body = self.fetch_document(url).await?;
        Ok(project_url(&body))
    }

    async fn check_connection(&self) -> Result<bool, RepositoryError> {
        let url = self.base_url.clone();

        let head = self
            .with_credentials(self.client.head(url.clone()))
            .header(ACCEPT, "*/*")
            .send()
            .await?;
        if head.status() == StatusCode::OK {
            return Ok(true);
        }

        warn!(
            "http HEAD failed for repository '{}' will proceed with GET request",
            url
        );
        let response = self.get(url.clone()).header(ACCEPT, "*/*").send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            error!(
                "expected HTTP status 200 but got {} on check of url '{}'",
                status.as_u16(),
                url
            );
        } else {
            error!(
                "expected HTTP status 200 but got {} on check of url '{}', with entity: {}",
                status.as_u16(),
                url,
                body
            );
        }
        Ok(false)
    }

    fn artifact_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Option<String> {
        let path = format!(
            "{}{}",
            coordinates.version_path(version),
            coordinates.artifact_file_name(version)
        );
        self.resolve(&path).ok().map(String::from)
    }
}
