//! Common types for version resolution

use chrono::{DateTime, Utc};

use crate::version::maven::MavenVersion;

/// Limits restricting which published version counts as current
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionConstraints {
    /// Inclusive lower bound
    pub lower_bound: Option<MavenVersion>,
    /// Exclusive upper bound
    pub upper_bound: Option<MavenVersion>,
    /// Version reported by the previous poll, if any
    pub previously_known_version: Option<MavenVersion>,
    /// Name of a `<versioning>` element naming the latest version, e.g. `release`
    pub latest_version_tag: Option<String>,
}

impl ResolutionConstraints {
    pub fn with_lower_bound(mut self, lower_bound: MavenVersion) -> Self {
        self.lower_bound = Some(lower_bound);
        self
    }

    pub fn with_upper_bound(mut self, upper_bound: MavenVersion) -> Self {
        self.upper_bound = Some(upper_bound);
        self
    }

    pub fn with_previously_known_version(mut self, version: MavenVersion) -> Self {
        self.previously_known_version = Some(version);
        self
    }

    pub fn with_latest_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.latest_version_tag = Some(tag.into());
        self
    }
}

/// A version picked by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The version, with its SNAPSHOT build attached when one was resolved
    pub version: MavenVersion,
    /// `1.2-SNAPSHOT (20160809.063223-25)` or the plain version string
    pub display_revision: String,
    /// `<lastUpdated>` of the artifact metadata
    pub last_modified: Option<DateTime<Utc>>,
    /// URL of the artifact file
    pub location: Option<String>,
    /// First `<url>` of the artifact's POM
    pub trackback_url: Option<String>,
    /// Set when the location or trackback could not be determined
    pub error_message: Option<String>,
}

impl ResolvedVersion {
    pub fn new(version: MavenVersion, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            display_revision: version.display_revision(),
            version,
            last_modified,
            location: None,
            trackback_url: None,
            error_message: None,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_trackback_url(mut self, trackback_url: Option<String>) -> Self {
        self.trackback_url = trackback_url;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Outcome of a resolution call that did not hit a hard error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing matched the constraints, or nothing changed since the known version
    NoApplicableVersion,
    Resolved(ResolvedVersion),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn into_resolved(self) -> Option<ResolvedVersion> {
        match self {
            Self::Resolved(resolved) => Some(resolved),
            Self::NoApplicableVersion => None,
        }
    }
}
