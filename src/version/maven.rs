//! Maven version model
//!
//! A Maven version is a dot-separated numeric run optionally followed by a
//! delimiter and a free-form qualifier (`1.2.3`, `10.2.333.4-sources`,
//! `1.2-SNAPSHOT`). SNAPSHOT versions can additionally carry the timestamp and
//! build number of the concrete build they resolved to.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::VersionError;
use crate::version::natural_order::natural_cmp;

/// Qualifier that marks a continuously republished pre-release build
pub const SNAPSHOT_QUALIFIER: &str = "SNAPSHOT";

/// `<version> (<yyyymmdd.hhmmss>-<buildNumber>)`, the form a resolved SNAPSHOT
/// revision is reported in
static SPECIFIC_SNAPSHOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<version>.+) \((?P<timestamp>\d{8}\.\d{6})-(?P<build>\d+)\)$")
        .expect("static regex")
});

#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    /// Numeric run as it appeared in the input, e.g. `1.2` for `1.2-SNAPSHOT`
    numeric: String,
    segments: Vec<u64>,
    qualifier: Option<String>,
    qualifier_delimiter: Option<char>,
    snapshot_timestamp: Option<String>,
    snapshot_build_number: Option<String>,
}

impl MavenVersion {
    /// Parse a raw version string.
    ///
    /// Surrounding whitespace is ignored. A SNAPSHOT version in its resolved
    /// form (`1.2-SNAPSHOT (20160809.063223-25)`) keeps its timestamp and build
    /// number; the parenthesized suffix is not part of [`Self::original`].
    ///
    /// # Errors
    /// * [`VersionError::Empty`] - the input is empty or blank
    /// * [`VersionError::Invalid`] - a numeric segment does not fit an integer
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let (original, snapshot_timestamp, snapshot_build_number) =
            split_specific_snapshot(trimmed);

        let (numeric, qualifier_delimiter) = strip_numeric_run(original);
        let (numeric, qualifier) = match numeric {
            None => (String::new(), Some(original.to_string())),
            Some(numeric) if numeric.len() < original.len() => {
                // the delimiter itself belongs to neither part
                let mut rest = original[numeric.len()..].chars();
                rest.next();
                let qualifier = rest.as_str().to_string();
                (numeric, Some(qualifier))
            }
            Some(numeric) => (numeric, None),
        };

        let segments = numeric
            .split('.')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<u64>()
                    .map_err(|_| VersionError::Invalid(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            original: original.to_string(),
            numeric,
            segments,
            qualifier,
            qualifier_delimiter,
            snapshot_timestamp,
            snapshot_build_number,
        })
    }

    /// The trimmed input, without a resolved SNAPSHOT suffix
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    pub fn bugfix(&self) -> u64 {
        self.segment(2)
    }

    pub fn hotfix(&self) -> u64 {
        self.segment(3)
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Non-alphanumeric character that separated the numeric run from the qualifier
    pub fn qualifier_delimiter(&self) -> Option<char> {
        self.qualifier_delimiter
    }

    pub fn snapshot_timestamp(&self) -> Option<&str> {
        self.snapshot_timestamp.as_deref()
    }

    pub fn snapshot_build_number(&self) -> Option<&str> {
        self.snapshot_build_number.as_deref()
    }

    pub fn is_snapshot(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.eq_ignore_ascii_case(SNAPSHOT_QUALIFIER))
    }

    /// Attach the concrete build a SNAPSHOT version resolved to
    pub fn with_snapshot_build(
        mut self,
        timestamp: impl Into<String>,
        build_number: impl Into<String>,
    ) -> Self {
        self.snapshot_timestamp = Some(timestamp.into());
        self.snapshot_build_number = Some(build_number.into());
        self
    }

    fn snapshot_build(&self) -> Option<(&str, &str)> {
        match (&self.snapshot_timestamp, &self.snapshot_build_number) {
            (Some(timestamp), Some(build_number)) => {
                Some((timestamp.as_str(), build_number.as_str()))
            }
            _ => None,
        }
    }

    /// The version as it appears in artifact file names.
    ///
    /// A resolved SNAPSHOT renders as `1.2-20160809.063223-25`; anything else
    /// renders as [`Self::original`].
    pub fn version_display(&self) -> String {
        match self.snapshot_build() {
            Some((timestamp, build_number)) if self.is_snapshot() && !self.numeric.is_empty() => {
                let delimiter = self.qualifier_delimiter.unwrap_or('-');
                format!(
                    "{}{}{}-{}",
                    self.numeric, delimiter, timestamp, build_number
                )
            }
            _ => self.original.clone(),
        }
    }

    /// The revision label reported to callers.
    ///
    /// `1.2-SNAPSHOT (20160809.063223-25)` once the SNAPSHOT build is known,
    /// otherwise [`Self::original`]. Parses back into an equal version.
    pub fn display_revision(&self) -> String {
        match self.snapshot_build() {
            Some((timestamp, build_number)) => {
                format!("{} ({}-{})", self.original, timestamp, build_number)
            }
            None => self.original.clone(),
        }
    }

    fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }

    fn compare_snapshot_builds(&self, other: &Self) -> Ordering {
        let has_build =
            |v: &MavenVersion| v.snapshot_timestamp.is_some() || v.snapshot_build_number.is_some();

        match (has_build(self), has_build(other)) {
            (false, false) => Ordering::Equal,
            // a resolved SNAPSHOT outranks an unresolved one
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => compare_present(&self.snapshot_timestamp, &other.snapshot_timestamp)
                .then_with(|| {
                    compare_present(&self.snapshot_build_number, &other.snapshot_build_number)
                }),
        }
    }
}

fn compare_present(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => natural_cmp(a, b),
        _ => Ordering::Equal,
    }
}

/// Splits `1.2-SNAPSHOT (20160809.063223-25)` into the version and its build.
fn split_specific_snapshot(input: &str) -> (&str, Option<String>, Option<String>) {
    if !input.contains(SNAPSHOT_QUALIFIER) {
        return (input, None, None);
    }

    match SPECIFIC_SNAPSHOT.captures(input) {
        Some(caps) => {
            let version = caps.name("version").map_or(input, |m| m.as_str().trim_end());
            let timestamp = caps.name("timestamp").map(|m| m.as_str().to_string());
            let build = caps.name("build").map(|m| m.as_str().to_string());
            (version, timestamp, build)
        }
        None => (input, None, None),
    }
}

/// Extracts the leading dot-separated numeric run.
///
/// Returns the run exactly as written (`1.` stays `1.`) and the last
/// non-alphanumeric delimiter seen while scanning, or `None` for the run when
/// the input does not start with a digit.
fn strip_numeric_run(input: &str) -> (Option<String>, Option<char>) {
    let mut parts: Vec<&str> = Vec::new();
    let mut delimiter = None;
    let mut rest = input;

    loop {
        match rest.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
            None => {
                parts.push(rest);
                break;
            }
            Some((index, c)) => {
                if !c.is_alphanumeric() {
                    delimiter = Some(c);
                }
                if index == 0 {
                    break;
                }

                parts.push(&rest[..index]);
                if c != '.' {
                    break;
                }
                rest = &rest[index + 1..];
            }
        }
    }

    if parts.is_empty() {
        (None, delimiter)
    } else {
        (Some(parts.join(".")), delimiter)
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        let segments = (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal);
        if segments.is_ne() {
            return segments;
        }

        match (&self.qualifier, &other.qualifier) {
            (Some(a), Some(b)) => natural_cmp(a, b).then_with(|| {
                if self.is_snapshot() && other.is_snapshot() {
                    self.compare_snapshot_builds(other)
                } else {
                    Ordering::Equal
                }
            }),
            // a release outranks any qualified build of the same numbers
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for MavenVersion {}

impl FromStr for MavenVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
