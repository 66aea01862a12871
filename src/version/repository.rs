//! Repository trait for fetching artifact metadata

#[cfg(test)]
use mockall::automock;

use crate::config::METADATA_FILE_NAME;
use crate::version::error::RepositoryError;
use crate::version::maven::MavenVersion;
use crate::version::metadata::MavenMetadata;

/// Identifies an artifact in a Maven repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub packaging: String,
}

impl ArtifactCoordinates {
    pub fn new(group_id: &str, artifact_id: &str, packaging: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            packaging: packaging.to_string(),
        }
    }

    /// `com/example/app/`, relative to the repository root
    pub fn artifact_path(&self) -> String {
        format!(
            "{}/{}/",
            without_slashes(&self.group_id).replace('.', "/"),
            without_slashes(&self.artifact_id)
        )
    }

    /// `com/example/app/1.2-SNAPSHOT/`
    pub fn version_path(&self, version: &MavenVersion) -> String {
        format!(
            "{}{}/",
            self.artifact_path(),
            without_slashes(version.original())
        )
    }

    /// `com/example/app/maven-metadata.xml`
    pub fn metadata_path(&self) -> String {
        format!("{}{}", self.artifact_path(), METADATA_FILE_NAME)
    }

    /// `com/example/app/1.2-SNAPSHOT/maven-metadata.xml`
    pub fn snapshot_metadata_path(&self, version: &MavenVersion) -> String {
        format!("{}{}", self.version_path(version), METADATA_FILE_NAME)
    }

    /// `app-1.2-20160809.063223-25.jar`
    pub fn artifact_file_name(&self, version: &MavenVersion) -> String {
        format!(
            "{}-{}.{}",
            self.artifact_id,
            version.version_display(),
            self.packaging
        )
    }

    /// `app-1.2-20160809.063223-25.pom`
    pub fn pom_file_name(&self, version: &MavenVersion) -> String {
        format!("{}-{}.pom", self.artifact_id, version.version_display())
    }
}

fn without_slashes(segment: &str) -> String {
    segment.replace('/', "")
}

/// Trait for fetching metadata documents from a Maven repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Fetches the artifact-level metadata listing every published version
    ///
    /// # Returns
    /// * `Ok(MavenMetadata)` - The metadata view; unparsed if the document was unreadable
    /// * `Err(RepositoryError)` - If the transport fails
    async fn fetch_all_versions_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
    ) -> Result<MavenMetadata, RepositoryError>;

    /// Fetches the version-level metadata of a SNAPSHOT version, which names
    /// the timestamp and build number of its latest build
    async fn fetch_snapshot_metadata(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<MavenMetadata, RepositoryError>;

    /// Fetches the POM of `version` and returns its first `<url>`
    ///
    /// # Returns
    /// * `Ok(None)` - If the POM names no url
    /// * `Err(RepositoryError)` - If the POM cannot be fetched
    async fn fetch_trackback_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Result<Option<String>, RepositoryError>;

    /// Returns true if the repository root answers with HTTP 200
    async fn check_connection(&self) -> Result<bool, RepositoryError>;

    /// URL of the artifact file of `version`
    fn artifact_url(
        &self,
        coordinates: &ArtifactCoordinates,
        version: &MavenVersion,
    ) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinates() -> ArtifactCoordinates {
        ArtifactCoordinates::new("com.example.tools", "app", "war")
    }

    #[test]
    fn metadata_path_maps_group_dots_to_directories() {
        assert_eq!(
            coordinates().metadata_path(),
            "com/example/tools/app/maven-metadata.xml"
        );
    }

    #[test]
    fn snapshot_metadata_path_includes_symbolic_version() {
        let version = MavenVersion::parse("1.2-SNAPSHOT").unwrap();

        assert_eq!(
            coordinates().snapshot_metadata_path(&version),
            "com/example/tools/app/1.2-SNAPSHOT/maven-metadata.xml"
        );
    }

    #[test]
    fn paths_drop_slashes_from_segments() {
        let coordinates = ArtifactCoordinates::new("com/example", "a/pp", "jar");

        assert_eq!(coordinates.artifact_path(), "comexample/app/");
    }

    #[test]
    fn artifact_file_name_uses_resolved_snapshot_build() {
        let version = MavenVersion::parse("1.2-SNAPSHOT (20160809.063223-25)").unwrap();

        assert_eq!(
            coordinates().artifact_file_name(&version),
            "app-1.2-20160809.063223-25.war"
        );
    }

    #[test]
    fn pom_file_name_ignores_packaging() {
        let version = MavenVersion::parse("1.2-SNAPSHOT (20160809.063223-25)").unwrap();

        assert_eq!(
            coordinates().pom_file_name(&version),
            "app-1.2-20160809.063223-25.pom"
        );
    }
}
