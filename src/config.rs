use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::version::error::VersionError;
use crate::version::maven::MavenVersion;
use crate::version::repository::ArtifactCoordinates;
use crate::version::types::ResolutionConstraints;

// =============================================================================
// Repository access constants
// =============================================================================

/// Connect timeout for repository requests (10 seconds)
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Overall timeout for a single repository request (30 seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = "maven-poller";

/// Name of the metadata document at artifact and version level
pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// Format of `<lastUpdated>` in maven-metadata.xml
pub const LAST_UPDATED_FORMAT: &str = "%Y%m%d%H%M%S";

pub const DEFAULT_PACKAGING: &str = "jar";

pub const INVALID_BOUNDS_MESSAGE: &str = "Lower Bound cannot be >= Upper Bound";

/// Retries of a repository request after a network error or 5xx answer
pub const MAX_RETRIES: u32 = 3;

/// Pause between retries (2 seconds)
pub const RETRY_DELAY_SECS: u64 = 2;

/// Reported on a revision whose location or trackback could not be determined
pub const LOCATION_ERROR_MESSAGE: &str =
    "Plugin could not determine location/trackback. Please see plugin log for details.";

/// Poller configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PollerConfig {
    pub repository: RepositoryConfig,
    pub package: PackageConfig,
}

/// Repository-level configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
    /// Zone `<lastUpdated>` values are written in (`UTC`, `Europe/Berlin`, `+02:00`)
    pub time_zone: Option<String>,
    /// Element under `<versioning>` naming the current version (`latest`, `release`)
    pub latest_version_tag: Option<String>,
}

/// Package-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageConfig {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub packaging: String,
    /// Inclusive lower bound
    pub poll_version_from: Option<String>,
    /// Exclusive upper bound
    pub poll_version_to: Option<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            group_id: None,
            artifact_id: None,
            packaging: DEFAULT_PACKAGING.to_string(),
            poll_version_from: None,
            poll_version_to: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl ValidationError {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PollerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check the configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.repository.validate();
        errors.extend(self.package.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Coordinates of the configured artifact; empty ids when unset
    pub fn coordinates(&self) -> ArtifactCoordinates {
        ArtifactCoordinates::new(
            self.package.group_id.as_deref().unwrap_or_default().trim(),
            self.package.artifact_id.as_deref().unwrap_or_default().trim(),
            &self.package.packaging,
        )
    }

    /// Build resolution constraints from the configured bounds and tag.
    ///
    /// # Errors
    /// Returns [`VersionError`] when a bound or the previously known version is
    /// not a valid version string.
    pub fn constraints(
        &self,
        previously_known_version: Option<&str>,
    ) -> Result<ResolutionConstraints, VersionError> {
        let parse = |value: Option<&String>| value.map(|v| MavenVersion::parse(v)).transpose();

        Ok(ResolutionConstraints {
            lower_bound: parse(self.package.poll_version_from.as_ref())?,
            upper_bound: parse(self.package.poll_version_to.as_ref())?,
            previously_known_version: previously_known_version
                .map(MavenVersion::parse)
                .transpose()?,
            latest_version_tag: self
                .repository
                .latest_version_tag
                .as_deref()
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        })
    }

    pub fn time_zone(&self) -> RepositoryTimeZone {
        RepositoryTimeZone::from_setting(self.repository.time_zone.as_deref())
    }
}

impl RepositoryConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let Some(raw) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            let message = "Repository url not specified";
            info!("{}", message);
            return vec![ValidationError::new("url", message)];
        };

        let mut errors = Vec::new();
        match Url::parse(raw) {
            Ok(url) => {
                if !matches!(url.scheme(), "http" | "https") {
                    errors.push(ValidationError::new(
                        "url",
                        "Invalid URL: Only http is supported.",
                    ));
                }
                if !url.username().is_empty() || url.password().is_some() {
                    errors.push(ValidationError::new(
                        "url",
                        "User info should not be provided as part of the URL. \
                         Please provide credentials using username and password configuration keys.",
                    ));
                }
            }
            Err(e) => {
                errors.push(ValidationError::new(
                    "url",
                    format!("Malformed URL specified: {}", e),
                ));
            }
        }
        errors
    }
}

impl PackageConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        validate_id(&mut errors, self.group_id.as_deref(), "groupId");
        validate_id(&mut errors, self.artifact_id.as_deref(), "artifactId");

        let lower = validate_bound(&mut errors, self.poll_version_from.as_deref(), "pollVersionFrom");
        let upper = validate_bound(&mut errors, self.poll_version_to.as_deref(), "pollVersionTo");

        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower >= upper {
                errors.push(ValidationError::new("pollVersionFrom", INVALID_BOUNDS_MESSAGE));
            }
        }
        errors
    }
}

fn validate_id(errors: &mut Vec<ValidationError>, id: Option<&str>, key: &str) {
    let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
        let message = format!("{} is not specified", key);
        info!("{}", message);
        errors.push(ValidationError::new(key, message));
        return;
    };

    if id.contains('*') || id.contains('?') {
        let message = format!("{} [{}] is invalid", key, id);
        info!("{}", message);
        errors.push(ValidationError::new(key, message));
    }
}

fn validate_bound(
    errors: &mut Vec<ValidationError>,
    bound: Option<&str>,
    key: &str,
) -> Option<MavenVersion> {
    MavenVersion::parse(bound?)
        .inspect_err(|e| errors.push(ValidationError::new(key, e.to_string())))
        .ok()
}

// =============================================================================
// Time zones
// =============================================================================

/// `UTC`, `GMT+2`, `+05:30`, `-0800`, ...
static FIXED_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:UTC|GMT)?(?P<sign>[+-])(?P<hours>\d{1,2})(?::?(?P<minutes>\d{2}))?$")
        .expect("static regex")
});

/// Zone used to interpret `<lastUpdated>` timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepositoryTimeZone {
    /// The zone of the machine running the poller
    #[default]
    Local,
    /// An IANA zone such as `Europe/Berlin`
    Named(Tz),
    Fixed(FixedOffset),
}

impl RepositoryTimeZone {
    /// Interpret a configured zone name. Unrecognised names fall back to UTC.
    pub fn from_setting(setting: Option<&str>) -> Self {
        let Some(setting) = setting.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Local;
        };

        if ["UTC", "GMT", "Z"]
            .iter()
            .any(|utc| setting.eq_ignore_ascii_case(utc))
        {
            return Self::utc();
        }

        if let Ok(zone) = setting.parse::<Tz>() {
            return Self::Named(zone);
        }

        match parse_fixed_offset(setting) {
            Some(offset) => Self::Fixed(offset),
            None => {
                warn!(
                    "The time zone '{}' was not found. Using UTC as fallback.",
                    setting
                );
                Self::utc()
            }
        }
    }

    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Convert a wall-clock time in this zone to UTC
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Named(zone) => zone
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

fn parse_fixed_offset(setting: &str) -> Option<FixedOffset> {
    let caps = FIXED_OFFSET.captures(setting)?;
    let hours: i32 = caps.name("hours")?.as_str().parse().ok()?;
    let minutes: i32 = caps
        .name("minutes")
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    let seconds = hours * 3600 + minutes * 60;

    match caps.name("sign")?.as_str() {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Returns the path to the data directory for maven-poller.
/// Uses $XDG_DATA_HOME/maven-poller if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/maven-poller,
/// or ./maven-poller if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("maven-poller.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("maven-poller")
}
