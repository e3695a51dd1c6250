//! Data-file format sniffing and openness scoring.
//!
//! For an arbitrary downloaded data file, determine its canonical data
//! format from its content, and derive from that (plus archival and
//! license metadata) an integer openness score on the 0-5 five-stars
//! scale together with a human-readable justification.
//!
//! The crate is a library-level contract: fetching and caching resource
//! files, persisting results and exposing them over an API are the
//! hosting application's concern.

/// External collaborator records (archiver, dataset/license)
pub mod archival;
/// Error types
pub mod error;
/// Canonical format registry
pub mod formats;
/// Tracing setup
pub mod logging;
/// Openness score table
pub mod scores;
/// The scoring cascade
pub mod scoring;
/// Content classifiers and mimetype triage
pub mod sniff;

pub use archival::{ArchivalRecord, ArchivalStatus, Dataset, Resource};
pub use error::{QaError, Result};
pub use formats::{canonicalize, registry, FormatDescriptor, FormatRegistry};
pub use scores::ScoreTable;
pub use scoring::{
    extension_variants, score_dataset, score_dataset_resource, score_resource, QaResult,
    ResourceContext, ResourceInputs, OPENNESS_SCORE_DESCRIPTION,
};
pub use sniff::{detect_mimetype, sniff_file_format, SniffResult};
