//! Repository metadata as seen by the resolver
//!
//! [`MetadataView`] is the set of facts resolution needs about an artifact.
//! [`MavenMetadata`] provides them from a `maven-metadata.xml` document:
//!
//! ```xml
//! <metadata>
//!   <groupId>mysql</groupId>
//!   <artifactId>mysql-connector-java</artifactId>
//!   <versioning>
//!     <latest>8.0.11</latest>
//!     <release>8.0.11</release>
//!     <versions>
//!       <version>5.1.14</version>
//!       ...
//!     </versions>
//!     <snapshot>
//!       <timestamp>20160809.063223</timestamp>
//!       <buildNumber>25</buildNumber>
//!     </snapshot>
//!     <lastUpdated>20180419141037</lastUpdated>
//!   </versioning>
//! </metadata>
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{info, warn};

use crate::config::{LAST_UPDATED_FORMAT, RepositoryTimeZone};

const LAST_UPDATED_TAG: &str = "lastUpdated";

/// Facts about the published versions of one artifact.
///
/// A view over a document that could not be parsed reports an empty or absent
/// value for every field.
pub trait MetadataView {
    /// Every published version, in document order
    fn versions(&self) -> &[String];

    /// Text of the element `name` directly under `<versioning>`, if non-empty
    fn tag_value(&self, name: &str) -> Option<&str>;

    fn snapshot_timestamp(&self) -> Option<&str>;

    fn snapshot_build_number(&self) -> Option<&str>;

    /// `<lastUpdated>` interpreted in `time_zone`
    fn last_updated(&self, time_zone: &RepositoryTimeZone) -> Option<DateTime<Utc>>;
}

/// Fields extracted from a `maven-metadata.xml` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenMetadata {
    parsed: bool,
    versions: Vec<String>,
    tags: HashMap<String, String>,
    snapshot_timestamp: Option<String>,
    snapshot_build_number: Option<String>,
}

impl MavenMetadata {
    /// Extract metadata fields from an XML document.
    ///
    /// Never fails: a document that is not well-formed XML yields an unparsed,
    /// empty view.
    pub fn parse(document: &str) -> Self {
        match extract(document) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("cannot handle metadata: {}", e);
                Self::unparsed()
            }
        }
    }

    /// A view over a document that could not be read
    pub fn unparsed() -> Self {
        Self::default()
    }

    /// A parsed view listing `versions`
    pub fn with_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parsed: true,
            versions: versions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, name: &str, value: &str) -> Self {
        self.parsed = true;
        self.tags.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_snapshot(mut self, timestamp: &str, build_number: &str) -> Self {
        self.parsed = true;
        self.snapshot_timestamp = Some(timestamp.to_string());
        self.snapshot_build_number = Some(build_number.to_string());
        self
    }

    pub fn with_last_updated(self, last_updated: &str) -> Self {
        self.with_tag(LAST_UPDATED_TAG, last_updated)
    }

    /// Whether the underlying document could be read
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }
}

impl MetadataView for MavenMetadata {
    fn versions(&self) -> &[String] {
        &self.versions
    }

    fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn snapshot_timestamp(&self) -> Option<&str> {
        non_empty(&self.snapshot_timestamp)
    }

    fn snapshot_build_number(&self) -> Option<&str> {
        non_empty(&self.snapshot_build_number)
    }

    fn last_updated(&self, time_zone: &RepositoryTimeZone) -> Option<DateTime<Utc>> {
        let raw = self.tag_value(LAST_UPDATED_TAG)?;

        if raw.len() != 14 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            warn!(
                "lastUpdated '{}' does not match the expected date pattern '{}'",
                raw, LAST_UPDATED_FORMAT
            );
            return None;
        }

        match NaiveDateTime::parse_from_str(raw, LAST_UPDATED_FORMAT) {
            Ok(naive) => {
                info!("lastUpdated set to '{}'", raw);
                time_zone.to_utc(naive)
            }
            Err(e) => {
                warn!("unable to parse lastUpdated '{}': {}", raw, e);
                None
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Walks the document and collects the fields under `/metadata/versioning`
fn extract(document: &str) -> Result<MavenMetadata, String> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut metadata = MavenMetadata {
        parsed: true,
        ..MavenMetadata::default()
    };
    let mut element_stack: Vec<String> = Vec::new();
    let mut current_text = String::new();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if element_stack.is_empty() {
                    saw_root = true;
                }
                element_stack.push(name);
                current_text.clear();
            }
            Ok(Event::Empty(_)) => {
                if element_stack.is_empty() {
                    saw_root = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                current_text.push_str(&text);
            }
            Ok(Event::CData(ref e)) => {
                current_text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) => {
                let path: Vec<&str> = element_stack.iter().map(String::as_str).collect();
                let text = current_text.trim();

                match path.as_slice() {
                    ["metadata", "versioning", "versions", "version"] => {
                        if !text.is_empty() {
                            metadata.versions.push(text.to_string());
                        }
                    }
                    ["metadata", "versioning", "snapshot", "timestamp"] => {
                        metadata.snapshot_timestamp = Some(text.to_string());
                    }
                    ["metadata", "versioning", "snapshot", "buildNumber"] => {
                        metadata.snapshot_build_number = Some(text.to_string());
                    }
                    ["metadata", "versioning", tag] => {
                        if !text.is_empty() {
                            metadata.tags.insert(tag.to_string(), text.to_string());
                        }
                    }
                    _ => {}
                }

                element_stack.pop();
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err("document has no root element".to_string());
    }
    if !element_stack.is_empty() {
        return Err(format!("unclosed element <{}>", element_stack.join("><")));
    }

    Ok(metadata)
}
