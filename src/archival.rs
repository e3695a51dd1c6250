//! Read-only records consumed from external collaborators.
//!
//! The download/cache layer ("archiver") and the dataset/license layer are
//! not implemented here; scoring only reads the records they produce.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of the archiver's most recent attempt for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchivalStatus {
    ArchivedSuccessfully,
    ChoseNotToDownload,
    DownloadError,
    SystemErrorDuringArchival,
}

impl fmt::Display for ArchivalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ArchivalStatus::ArchivedSuccessfully => "Archived successfully",
            ArchivalStatus::ChoseNotToDownload => "Chose not to download",
            ArchivalStatus::DownloadError => "Download error",
            ArchivalStatus::SystemErrorDuringArchival => "System error during archival",
        };
        write!(f, "{}", text)
    }
}

/// Metadata about a prior attempt to download and cache a resource's file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchivalRecord {
    /// Whether the link is currently known to be broken. `None` means the
    /// archiver has not reached a verdict.
    pub is_broken: Option<bool>,
    /// Local path of the cached download, when one exists.
    pub cache_filepath: Option<PathBuf>,
    pub cache_url: Option<String>,
    pub status: Option<ArchivalStatus>,
    /// Failure reason as recorded by the archiver.
    pub reason: String,
    /// Time of the most recent attempt.
    pub updated: Option<NaiveDateTime>,
    pub last_success: Option<NaiveDateTime>,
    pub first_failure: Option<NaiveDateTime>,
    pub failure_count: u32,
}

/// A dataset resource, as supplied by the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    /// The publisher-supplied format field, e.g. "CSV" or ".xls".
    pub format_field: Option<String>,
}

/// A dataset and its license verdict, from the license collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// Whether the dataset's license is open.
    pub is_open: bool,
    pub resources: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_archiver_texts() {
        assert_eq!(ArchivalStatus::DownloadError.to_string(), "Download error");
        assert_eq!(
            ArchivalStatus::ChoseNotToDownload.to_string(),
            "Chose not to download"
        );
        assert_eq!(
            ArchivalStatus::SystemErrorDuringArchival.to_string(),
            "System error during archival"
        );
    }
}
