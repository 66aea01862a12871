//! Maven version model and resolution
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Repository  │────▶│   Metadata   │◀────│   Resolver   │
//! │   (fetch)    │     │ (xml facts)  │     │  (bounds)    │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                         │
//!        ▼                                         ▼
//! ┌──────────────┐                          ┌──────────────┐
//! │ Repositories │                          │ MavenVersion │
//! │    (http)    │                          │ (ordering)   │
//! └──────────────┘                          └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`maven`]: Version parsing and total ordering
//! - [`natural_order`]: Natural order string comparison for qualifiers and builds
//! - [`pom`]: Project url of a POM, reported as trackback
//! - [`metadata`]: `maven-metadata.xml` extraction behind the `MetadataView` trait
//! - [`repository`]: Repository trait and artifact coordinates
//! - [`repositories`]: Concrete repository implementations
//! - [`resolver`]: Latest version resolution under bounds
//! - [`error`]: Error types for parsing, fetching and resolution
//! - [`types`]: Constraints and resolution results

pub mod error;
pub mod maven;
pub mod metadata;
pub mod natural_order;
pub mod pom;
pub mod repositories;
pub mod repository;
pub mod resolver;
pub mod types;
