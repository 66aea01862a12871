//! Latest version resolution
//!
//! Turns the published versions of an artifact plus a set of
//! [`ResolutionConstraints`] into the single version a poll should report:
//!
//! 1. candidates come from the configured latest version tag, or from the full
//!    version listing when the tag is unset or absent from the metadata
//! 2. the upper bound picks the candidate closest below it
//! 3. a SNAPSHOT candidate is pinned to its latest timestamped build
//! 4. a candidate equal to the previously known version, or below the lower
//!    bound, yields [`Resolution::NoApplicableVersion`]
//! 5. the reported version carries its artifact location and the url of its
//!    POM; failing to find either is reported on the version, not as an error

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{LOCATION_ERROR_MESSAGE, RepositoryTimeZone};
use crate::version::error::ResolveError;
use crate::version::maven::MavenVersion;
use crate::version::metadata::MetadataView;
use crate::version::repository::{ArtifactCoordinates, MetadataRepository};
use crate::version::types::{Resolution, ResolutionConstraints, ResolvedVersion};

/// Resolves the current version of an artifact against a repository
pub struct MavenResolver {
    repository: Arc<dyn MetadataRepository>,
    time_zone: RepositoryTimeZone,
}

impl MavenResolver {
    pub fn new(repository: Arc<dyn MetadataRepository>, time_zone: RepositoryTimeZone) -> Self {
        Self {
            repository,
            time_zone,
        }
    }

    /// Resolve the latest version of `coordinates` applicable under `constraints`.
    ///
    /// # Errors
    /// Returns [`ResolveError::Repository`] when fetching metadata fails.
    /// Missing or unusable metadata is not an error and resolves to
    /// [`Resolution::NoApplicableVersion`].
    pub async fn resolve_latest(
        &self,
        coordinates: &ArtifactCoordinates,
        constraints: &ResolutionConstraints,
    ) -> Result<Resolution, ResolveError> {
        let metadata = self
            .repository
            .fetch_all_versions_metadata(coordinates)
            .await?;

        let candidates = candidates(&metadata, constraints.latest_version_tag.as_deref());
        if candidates.is_empty() {
            warn!("Returning no version - metadata lists no usable version");
            return Ok(Resolution::NoApplicableVersion);
        }

        let Some(latest) = select_subject_to_upper_bound(candidates, constraints.upper_bound.as_ref())
        else {
            info!("No version below the upper bound");
            return Ok(Resolution::NoApplicableVersion);
        };
        info!("latest version is {} and will be processed", latest);

        let latest = if latest.is_snapshot() {
            match self.resolve_snapshot(coordinates, latest).await? {
                Some(pinned) => pinned,
                None => return Ok(Resolution::NoApplicableVersion),
            }
        } else {
            latest
        };

        if let Some(known) = &constraints.previously_known_version {
            debug!("lastKnownVersion is {}", known.display_revision());
            if latest == *known {
                info!(
                    "version {} is not newer than the lastKnownVersion {}",
                    latest.display_revision(),
                    known.display_revision()
                );
                return Ok(Resolution::NoApplicableVersion);
            }
        }

        if let Some(lower_bound) = &constraints.lower_bound {
            if latest < *lower_bound {
                info!(
                    "version {} is below the lower bound {}",
                    latest.display_revision(),
                    lower_bound
                );
                return Ok(Resolution::NoApplicableVersion);
            }
        }

        let location = self.repository.artifact_url(coordinates, &latest);
        let trackback = self
            .repository
            .fetch_trackback_url(coordinates, &latest)
            .await;

        let mut resolved = ResolvedVersion::new(latest, metadata.last_updated(&self.time_zone))
            .with_location(location);
        match trackback {
            Ok(trackback_url) => resolved = resolved.with_trackback_url(trackback_url),
            Err(e) => {
                error!(
                    "Error getting location for {}: {}",
                    resolved.display_revision, e
                );
                resolved = resolved.with_error_message(LOCATION_ERROR_MESSAGE);
            }
        }
        if resolved.location.is_none() {
            error!("No location for {}", resolved.display_revision);
            resolved = resolved.with_error_message(LOCATION_ERROR_MESSAGE);
        }
        info!("Latest is {}", resolved.display_revision);

        Ok(Resolution::Resolved(resolved))
    }

    /// Resolve the latest version, reporting nothing when it equals `previously_known`.
    pub async fn resolve_since(
        &self,
        coordinates: &ArtifactCoordinates,
        constraints: &ResolutionConstraints,
        previously_known: MavenVersion,
    ) -> Result<Resolution, ResolveError> {
        let constraints = constraints
            .clone()
            .with_previously_known_version(previously_known);
        self.resolve_latest(coordinates, &constraints).await
    }

    /// Attach the latest build to a SNAPSHOT version; `None` when the
    /// version-level metadata does not name one
    async fn resolve_snapshot(
        &self,
        coordinates: &ArtifactCoordinates,
        version: MavenVersion,
    ) -> Result<Option<MavenVersion>, ResolveError> {
        let metadata = self
            .repository
            .fetch_snapshot_metadata(coordinates, &version)
            .await?;

        if !metadata.is_parsed() {
            warn!("could not handle snapshot resolution");
            return Ok(None);
        }

        match (
            metadata.snapshot_timestamp(),
            metadata.snapshot_build_number(),
        ) {
            (Some(timestamp), Some(build_number)) => {
                let pinned = version.with_snapshot_build(timestamp, build_number);
                info!(
                    "set snapshot information to specific version {}",
                    pinned.version_display()
                );
                Ok(Some(pinned))
            }
            _ => {
                warn!(
                    "snapshot metadata of {} names no timestamp and build number",
                    version
                );
                Ok(None)
            }
        }
    }
}

/// Versions eligible for resolution.
///
/// The value of `tag` is the only candidate when the metadata carries it.
/// Otherwise every parsable entry of the version listing is a candidate.
pub fn candidates(metadata: &dyn MetadataView, tag: Option<&str>) -> Vec<MavenVersion> {
    if let Some(tag) = tag {
        match metadata.tag_value(tag).map(MavenVersion::parse) {
            Some(Ok(version)) => {
                debug!("using version {} of tag <{}>", version, tag);
                return vec![version];
            }
            Some(Err(e)) => {
                warn!("ignoring tag <{}>: {}", tag, e);
            }
            None => {
                info!("tag <{}> not present in metadata, using all versions", tag);
            }
        }
    }

    metadata
        .versions()
        .iter()
        .filter_map(|raw| match MavenVersion::parse(raw) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("skipping version '{}': {}", raw, e);
                None
            }
        })
        .collect()
}

/// Pick the candidate a poll reports.
///
/// Without an upper bound this is the maximum; the first of several equal
/// maxima wins. With an upper bound the candidates are sorted and the last one
/// strictly below the bound wins, even when greater versions exist above it.
pub fn select_subject_to_upper_bound(
    mut candidates: Vec<MavenVersion>,
    upper_bound: Option<&MavenVersion>,
) -> Option<MavenVersion> {
    let Some(upper_bound) = upper_bound else {
        return candidates
            .into_iter()
            .reduce(|best, version| if version > best { version } else { best });
    };

    candidates.sort();
    let index = (0..candidates.len()).find(|&i| {
        candidates[i] < *upper_bound
            && candidates
                .get(i + 1)
                .is_none_or(|next| next >= upper_bound)
    })?;

    Some(candidates.swap_remove(index))
}
