//! Repository test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use maven_poller::config::RepositoryTimeZone;
use maven_poller::version::error::RepositoryError;
use maven_poller::version::maven::MavenVersion;
use maven_poller::version::metadata::MavenMetadata;
use maven_poller::version::pom::project_url;
use maven_poller::version::repository::{ArtifactCoordinates, MetadataRepository};
use maven_poller::version::resolver::MavenResolver;

pub const MYSQL_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>mysql</groupId>
  <artifactId>mysql-connector-java</artifactId>
  <version>5.1.14</version>
  <versioning>
    <latest>2.0.14</latest>
    <versions>
      <version>5.1.0</version>
      <version>5.1.10</version>
      <version>5.1.14</version>
      <version>5.1.18</version>
      <version>5.1.21</version>
      <version>2.0.14</version>
    </versions>
    <lastUpdated>20120710161425</lastUpdated>
  </versioning>
</metadata>
"#;

pub const MYSQL_METADATA_WITH_RELEASE_TAG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>mysql</groupId>
  <artifactId>mysql-connector-java</artifactId>
  <versioning>
    <latest>2.0.14</latest>
    <release>5.1.18</release>
    <versions>
      <version>5.1.0</version>
      <version>5.1.14</version>
      <version>5.1.18</version>
      <version>5.1.21</version>
      <version>2.0.14</version>
    </versions>
    <lastUpdated>20120710161425</lastUpdated>
  </versioning>
</metadata>
"#;

pub const APP_SNAPSHOT_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>com.example</groupId>
  <artifactId>app</artifactId>
  <version>1.2-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20160809.063223</timestamp>
      <buildNumber>25</buildNumber>
    </snapshot>
    <lastUpdated>20160809063223</lastUpdated>
  </versioning>
</metadata>
"#;

pub const MYSQL_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>mysql</groupId>
  <artifactId>mysql-connector-java</artifactId>
  <packaging>jar</packaging>
  <name>MySQL Connector/J</name>
  <url>http://dev.mysql.com/doc/connector-j/en/</url>
</project>
"#;

/// In-memory repository serving metadata documents by path
#[derive(Default)]
pub struct InMemoryRepository {
    documents: HashMap<String, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` as the artifact-level metadata of `coordinates`
    pub fn with_metadata(mut self, coordinates: &ArtifactCoordinates, document: &str) -> Self {
        self.documents
            .insert(coordinates.metadata_path(), document.to_string());
        self
    }

    /// Serve `document` as the version-level metadata of `version`
    pub fn with_snapshot_metadata(
        mut self,
        coordinates: &ArtifactCoordinates,
        version: &str,
        document: &str,
    ) -> Self {
        let version = MavenVersion::parse(version).unwrap();
        self.documents.insert(
            coordinates.snapshot_metadata_path(&version),
            document.to_string(),
        );
        self
    }

    /// Serve `document` as the POM of `version`
    pub fn with_pom(mut self, coordinates: &ArtifactCoordinates, version: &str, document: &str) -> Self {
        let version = MavenVersion::parse(version).unwrap();
        self.documents.insert(
            format!(
                "{}{}",
                coordinates.version_path(&version),
                coordinates.pom_file_name(&version)
            ),
            document.to_string(),
        );
        self
    }

    fn fetch(&self, path: String) -> Result<MavenMetadata, RepositoryError> {
        self.documents
            .get(&path)
            .map(|document| MavenMetadata::parse(document))
            .ok_or(RepositoryError::NotFound(path))
    }
}

#[async_trait]
impl MetadataRepository for InMemoryRepository {
    async fn fetch_all_versions_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
    ) -> Result<MavenMetadata, RepositoryError> {
        self.fetch(coordinates.metadata_path())
    }

    async fn fetch_snapshot_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<MavenMetadata, RepositoryError> {
        self.fetch(coordinates.snapshot_metadata_path(version))
    }

    async fn fetch_trackback_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<Option<String>, RepositoryError> {
        let path = format!(
            "{}{}",
            coordinates.version_path(version),
            coordinates.pom_file_name(version)
        );
        self.documents
            .get(&path)
            .map(|document| project_url(document))
            .ok_or(RepositoryError::NotFound(path))
    }

    async fn check_connection(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }

    fn artifact_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Option<String> {
        Some(format!(
            "memory:///{}{}",
            coordinates.version_path(version),
            coordinates.artifact_file_name(version)
        ))
    }
}

pub fn mysql() -> ArtifactCoordinates {
    ArtifactCoordinates::new("mysql", "mysql-connector-java", "jar")
}

pub fn app() -> ArtifactCoordinates {
    ArtifactCoordinates::new("com.example", "app", "jar")
}

/// Create a resolver over `repository` reading timestamps as UTC
pub fn create_test_resolver(repository: InMemoryRepository) -> MavenResolver {
    MavenResolver::new(Arc::new(repository), RepositoryTimeZone::utc())
}
