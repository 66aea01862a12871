//! Polling entry points over a configured repository and package

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, PollerConfig};
use crate::version::error::{RepositoryError, ResolveError, VersionError};
use crate::version::repositories::http::HttpRepository;
use crate::version::repository::{ArtifactCoordinates, MetadataRepository};
use crate::version::resolver::MavenResolver;
use crate::version::types::{Resolution, ResolvedVersion};

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A revision of the polled package, as reported to the build orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevision {
    /// `5.1.14` or `1.2-SNAPSHOT (20160809.063223-25)`
    pub revision: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The version as used in artifact file names
    #[serde(default)]
    pub version: String,
    /// Project url from the artifact's POM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trackback_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PackageRevision {
    /// Build a revision, stamping it with the current time when the
    /// repository did not report a modification time
    pub fn from_resolved(resolved: ResolvedVersion) -> Self {
        Self {
            timestamp: resolved.last_modified.unwrap_or_else(Utc::now),
            version: resolved.version.version_display(),
            revision: resolved.display_revision,
            location: resolved.location,
            trackback_url: resolved.trackback_url,
            error_message: resolved.error_message,
        }
    }

    /// A revision reported by an earlier poll, known only by its label and time
    pub fn known(revision: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let revision = revision.into();
        Self {
            version: revision.clone(),
            revision,
            timestamp,
            location: None,
            trackback_url: None,
            error_message: None,
        }
    }
}

/// Outcome of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub messages: Vec<String>,
}

impl ConnectionStatus {
    fn success(messages: Vec<String>) -> Self {
        Self {
            success: true,
            messages,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
        }
    }
}

/// Polls one package in one repository
pub struct Poller {
    config: PollerConfig,
    coordinates: ArtifactCoordinates,
    repository: Arc<dyn MetadataRepository>,
    resolver: MavenResolver,
}

impl Poller {
    /// Create a poller over `repository`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every validation problem of `config`.
    pub fn new(
        config: PollerConfig,
        repository: Arc<dyn MetadataRepository>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            coordinates: config.coordinates(),
            resolver: MavenResolver::new(Arc::clone(&repository), config.time_zone()),
            repository,
            config,
        })
    }

    /// Create a poller talking HTTP to the configured repository
    pub fn from_config(config: PollerConfig) -> Result<Self, PollError> {
        config.validate()?;
        let repository = HttpRepository::new(&config.repository)?;
        Ok(Self::new(config, Arc::new(repository))?)
    }

    /// The latest revision applicable under the configured bounds
    pub async fn latest_revision(&self) -> Result<Option<PackageRevision>, PollError> {
        info!(
            "getLatestRevision called with groupId {}, for repo: {}",
            self.coordinates.group_id,
            self.repository_url()
        );
        let constraints = self.config.constraints(None)?;

        let resolution = self
            .resolver
            .resolve_latest(&self.coordinates, &constraints)
            .await?;

        let revision = resolution.into_resolved().map(PackageRevision::from_resolved);
        if let Some(revision) = &revision {
            info!(
                "getLatestRevision returning with {}, {}",
                revision.revision, revision.timestamp
            );
        }
        Ok(revision)
    }

    /// The latest revision, if it differs from `previously_known`
    pub async fn latest_modification_since(
        &self,
        previously_known: &PackageRevision,
    ) -> Result<Option<PackageRevision>, PollError> {
        info!(
            "latestModificationSince called with groupId {}, for repo: {}",
            self.coordinates.group_id,
            self.repository_url()
        );
        let constraints = self.config.constraints(Some(&previously_known.revision))?;

        let updated = match self
            .resolver
            .resolve_latest(&self.coordinates, &constraints)
            .await?
        {
            Resolution::Resolved(resolved) => PackageRevision::from_resolved(resolved),
            Resolution::NoApplicableVersion => {
                info!("no modification since {}", previously_known.revision);
                return Ok(None);
            }
        };

        info!(
            "latestModificationSince returning with {}, {}",
            updated.revision, updated.timestamp
        );
        if updated.timestamp < previously_known.timestamp {
            warn!(
                "Updated Package {} published earlier ({}) than previous ({}, {})",
                updated.revision,
                updated.timestamp,
                previously_known.revision,
                previously_known.timestamp
            );
        }
        Ok(Some(updated))
    }

    /// Check that the repository root is reachable
    pub async fn check_repository_connection(&self) -> ConnectionStatus {
        match self.repository.check_connection().await {
            Ok(true) => ConnectionStatus::success(Vec::new()),
            Ok(false) => ConnectionStatus::failure("Did not get HTTP Status 200 response"),
            Err(e) => ConnectionStatus::failure(e.to_string()),
        }
    }

    /// Check that the repository is reachable and holds a revision of the package
    pub async fn check_package_connection(&self) -> ConnectionStatus {
        let repository_status = self.check_repository_connection().await;
        if !repository_status.success {
            return repository_status;
        }

        match self.latest_revision().await {
            Ok(Some(revision)) if revision.location.is_some() => {
                ConnectionStatus::success(vec![format!("Found {}", revision.revision)])
            }
            Ok(_) => ConnectionStatus::failure("Could not find package"),
            Err(e) => ConnectionStatus::failure(e.to_string()),
        }
    }

    fn repository_url(&self) -> &str {
        self.config.repository.url.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOCATION_ERROR_MESSAGE;
    use crate::version::metadata::MavenMetadata;
    use crate::version::repository::MockMetadataRepository;
    use chrono::TimeZone;
    use serde_json::json;

    fn config(extra_package: serde_json::Value) -> PollerConfig {
        let mut package = json!({
            "groupId": "mysql",
            "artifactId": "mysql-connector-java",
        });
        if let (Some(package), Some(extra)) = (package.as_object_mut(), extra_package.as_object()) {
            package.extend(extra.clone());
        }
        serde_json::from_value(json!({
            "repository": { "url": "https://repo1.maven.org/maven2", "timeZone": "UTC" },
            "package": package,
        }))
        .unwrap()
    }

    fn mysql_repository() -> MockMetadataRepository {
        let mut repository = MockMetadataRepository::new();
        repository.expect_fetch_all_versions_metadata().returning(|_| {
            Ok(
                MavenMetadata::with_versions(["5.1.0", "5.1.10", "5.1.14", "5.1.21"])
                    .with_last_updated("20110311152226"),
            )
        });
        repository.expect_artifact_url().returning(|coordinates, version| {
            Some(format!(
                "https://repo1.maven.org/maven2/{}{}",
                coordinates.version_path(version),
                coordinates.artifact_file_name(version)
            ))
        });
        repository
            .expect_fetch_trackback_url()
            .returning(|_, _| Ok(Some("http://dev.mysql.com/doc/connector-j/en/".to_string())));
        repository
    }

    fn revision(raw: &str, timestamp: DateTime<Utc>) -> PackageRevision {
        PackageRevision::known(raw, timestamp)
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = config(json!({ "pollVersionFrom": "2.0", "pollVersionTo": "1.0" }));

        let result = Poller::new(config, Arc::new(MockMetadataRepository::new()));

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn latest_revision_honours_upper_bound() {
        let poller = Poller::new(
            config(json!({ "pollVersionTo": "5.1.15" })),
            Arc::new(mysql_repository()),
        )
        .unwrap();

        let revision = poller.latest_revision().await.unwrap().unwrap();

        assert_eq!(revision.revision, "5.1.14");
        assert_eq!(revision.version, "5.1.14");
        assert_eq!(
            revision.timestamp,
            Utc.with_ymd_and_hms(2011, 3, 11, 15, 22, 26).unwrap()
        );
        assert_eq!(
            revision.location.as_deref(),
            Some("https://repo1.maven.org/maven2/mysql/mysql-connector-java/5.1.14/mysql-connector-java-5.1.14.jar")
        );
        assert_eq!(
            revision.trackback_url.as_deref(),
            Some("http://dev.mysql.com/doc/connector-j/en/")
        );
        assert_eq!(revision.error_message, None);
    }

    #[tokio::test]
    async fn latest_revision_keeps_revision_when_trackback_fails() {
        let mut repository = MockMetadataRepository::new();
        repository
            .expect_fetch_all_versions_metadata()
            .returning(|_| Ok(MavenMetadata::with_versions(["5.1.14"])));
        repository
            .expect_artifact_url()
            .returning(|_, _| Some("https://repo.example/5.1.14.jar".to_string()));
        repository
            .expect_fetch_trackback_url()
            .returning(|_, _| Err(RepositoryError::NotFound("pom".to_string())));
        let poller = Poller::new(config(json!({})), Arc::new(repository)).unwrap();

        let revision = poller.latest_revision().await.unwrap().unwrap();

        assert_eq!(revision.revision, "5.1.14");
        assert_eq!(revision.trackback_url, None);
        assert_eq!(
            revision.error_message.as_deref(),
            Some(LOCATION_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn latest_modification_since_returns_none_when_unchanged() {
        let poller = Poller::new(config(json!({})), Arc::new(mysql_repository())).unwrap();
        let known = revision("5.1.21", Utc::now());

        let result = poller.latest_modification_since(&known).await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_modification_since_returns_newer_revision() {
        let poller = Poller::new(config(json!({})), Arc::new(mysql_repository())).unwrap();
        let known = revision("5.1.14", Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap());

        let result = poller.latest_modification_since(&known).await.unwrap().unwrap();

        assert_eq!(result.revision, "5.1.21");
    }

    #[tokio::test]
    async fn latest_modification_since_rejects_invalid_known_revision() {
        let poller = Poller::new(config(json!({})), Arc::new(mysql_repository())).unwrap();
        let known = revision("  ", Utc::now());

        let result = poller.latest_modification_since(&known).await;

        assert!(matches!(result, Err(PollError::Version(VersionError::Empty))));
    }

    #[tokio::test]
    async fn check_repository_connection_reports_non_ok_status() {
        let mut repository = MockMetadataRepository::new();
        repository.expect_check_connection().returning(|| Ok(false));
        let poller = Poller::new(config(json!({})), Arc::new(repository)).unwrap();

        let status = poller.check_repository_connection().await;

        assert!(!status.success);
        assert_eq!(status.messages, vec!["Did not get HTTP Status 200 response"]);
    }

    #[tokio::test]
    async fn check_package_connection_reports_found_revision() {
        let mut repository = mysql_repository();
        repository.expect_check_connection().returning(|| Ok(true));
        let poller = Poller::new(config(json!({})), Arc::new(repository)).unwrap();

        let status = poller.check_package_connection().await;

        assert!(status.success);
        assert_eq!(status.messages, vec!["Found 5.1.21"]);
    }

    #[tokio::test]
    async fn check_package_connection_fails_without_versions() {
        let mut repository = MockMetadataRepository::new();
        repository.expect_check_connection().returning(|| Ok(true));
        repository
            .expect_fetch_all_versions_metadata()
            .returning(|_| Ok(MavenMetadata::unparsed()));
        let poller = Poller::new(config(json!({})), Arc::new(repository)).unwrap();

        let status = poller.check_package_connection().await;

        assert!(!status.success);
        assert_eq!(status.messages, vec!["Could not find package"]);
    }

    #[test]
    fn package_revision_serializes_camel_case() {
        let revision = PackageRevision {
            revision: "1.2-SNAPSHOT (20160809.063223-25)".to_string(),
            timestamp: Utc.with_ymd_and_hms(2016, 8, 9, 6, 32, 23).unwrap(),
            location: Some("https://repo.example/app-1.2-20160809.063223-25.jar".to_string()),
            version: "1.2-20160809.063223-25".to_string(),
            trackback_url: Some("https://scm.example/app".to_string()),
            error_message: None,
        };

        assert_eq!(
            serde_json::to_value(&revision).unwrap(),
            json!({
                "revision": "1.2-SNAPSHOT (20160809.063223-25)",
                "timestamp": "2016-08-09T06:32:23Z",
                "location": "https://repo.example/app-1.2-20160809.063223-25.jar",
                "version": "1.2-20160809.063223-25",
                "trackbackUrl": "https://scm.example/app",
            })
        );
    }
}
