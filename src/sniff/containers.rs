//! Zip container inspection.
//!
//! Lists archive entry names without decompressing anything, recognises
//! domain-specific bundles (Shapefile, GTFS) and otherwise picks the entry
//! format with the best openness score. A corrupt or unreadable archive
//! yields no format; broken containers are common in the wild.

use crate::formats::registry;
use crate::scores::ScoreTable;
use crate::sniff::SniffResult;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};
use zip::ZipArchive;

/// Filenames that together make a zip a GTFS feed.
const GTFS_REQUIRED: [&str; 6] = [
    "agency.txt",
    "stops.txt",
    "routes.txt",
    "trips.txt",
    "stop_times.txt",
    "calendar.txt",
];

/// For a given zip file, return the format of the files inside.
///
/// For multiple files, choose by the most open format, and then by the
/// most popular extension (ties resolve to the lexicographically first
/// extension).
pub fn zipped_format(filepath: &Path, scores: &ScoreTable) -> Option<SniffResult> {
    let file = match File::open(filepath) {
        Ok(f) => f,
        Err(e) => {
            warn!("Zip file open raised error: {}", e);
            return None;
        }
    };
    let archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => {
            info!("Zip file open raised error: {}", e);
            return None;
        }
    };
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    // Shapefile check - a Shapefile is a zip containing specific files:
    // .shp, .dbf and .shx amongst others
    let last_segments: HashSet<String> = names
        .iter()
        .filter_map(|name| name.rsplit('.').next())
        .map(str::to_lowercase)
        .collect();
    if ["shp", "dbf", "shx"]
        .iter()
        .all(|ext| last_segments.contains(*ext))
    {
        info!("Shapefile detected");
        return Some(SniffResult::format("SHP"));
    }

    // GTFS check - a GTFS is a zip containing specific filenames
    let basenames: HashSet<&str> = names
        .iter()
        .map(|name| name.rsplit('/').next().unwrap_or(name))
        .collect();
    if GTFS_REQUIRED.iter().all(|name| basenames.contains(name)) {
        info!("GTFS detected");
        return Some(SniffResult::format("GTFS"));
    }

    let mut top_score = 0u8;
    let mut top_scoring_extension_counts: HashMap<String, usize> = HashMap::new();
    for name in &names {
        let extension = entry_extension(name);
        let Some(descriptor) = registry().lookup(&extension) else {
            info!("Zipped file of unknown extension: {:?} ({})", extension, name);
            continue;
        };
        if let Some(score) = scores.score_for(&descriptor.shortname) {
            if score > top_score {
                top_score = score;
                top_scoring_extension_counts.clear();
            }
            if score == top_score {
                *top_scoring_extension_counts.entry(extension).or_default() += 1;
            }
        }
    }

    if top_scoring_extension_counts.is_empty() {
        info!("Zip has no known extensions: {}", filepath.display());
        return Some(SniffResult::format("ZIP"));
    }

    let top_extension = top_scoring_extension_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(extension, _)| extension.clone())?;
    info!(
        "Zip file's most popular extension is {:?} (All extensions: {:?})",
        top_extension, top_scoring_extension_counts
    );
    let descriptor = registry().lookup(&top_extension)?;
    info!("Zipped file format detected: {}", descriptor.display_name);
    Some(SniffResult {
        format: descriptor.shortname.clone(),
        container: Some("ZIP".to_string()),
    })
}

/// Extension of an archive entry: the part after the final "." of its
/// basename, empty when there is none.
fn entry_extension(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(entries: &[&str]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let mut writer = ZipWriter::new(file.reopen().expect("reopen"));
        for entry in entries {
            writer
                .start_file(*entry, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(b"data").expect("write entry");
        }
        writer.finish().expect("finish zip");
        file
    }

    fn scores() -> ScoreTable {
        ScoreTable::builtin().expect("builtin scores")
    }

    #[test]
    fn shapefile_bundle() {
        let file = write_zip(&["roads.shp", "roads.dbf", "roads.shx", "roads.prj"]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        assert_eq!(result.format, "SHP");
        assert_eq!(result.container, None);
    }

    #[test]
    fn gtfs_bundle_regardless_of_extras() {
        let file = write_zip(&[
            "agency.txt",
            "stops.txt",
            "routes.txt",
            "trips.txt",
            "stop_times.txt",
            "calendar.txt",
            "notes.csv",
            "README.pdf",
        ]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        assert_eq!(result.format, "GTFS");
    }

    #[test]
    fn best_scoring_extension_wins() {
        // CSV scores 3, TXT scores 1: one csv beats two txt
        let file = write_zip(&["readme.txt", "license.txt", "data.csv"]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        assert_eq!(result.format, "CSV");
        assert_eq!(result.container.as_deref(), Some("ZIP"));
    }

    #[test]
    fn popularity_breaks_score_ties() {
        // XLS and XLSX both score 2; two xls entries beat one xlsx
        let file = write_zip(&["a.xls", "b.xls", "c.xlsx"]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        assert_eq!(result.format, "XLS");
    }

    #[test]
    fn exact_ties_resolve_lexicographically() {
        let file = write_zip(&["a.xls", "b.xlsx"]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        // xls < xlsx, so XLS wins the exact tie deterministically
        assert_eq!(result.format, "XLS");
    }

    #[test]
    fn unknown_extensions_fall_back_to_zip() {
        let file = write_zip(&["blob.zar", "noextension"]);
        let result = zipped_format(file.path(), &scores()).expect("verdict");
        assert_eq!(result.format, "ZIP");
        assert_eq!(result.container, None);
    }

    #[test]
    fn corrupt_archive_yields_no_format() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"PK\x03\x04 this is not really a zip")
            .expect("write");
        assert!(zipped_format(file.path(), &scores()).is_none());
    }

    #[test]
    fn entry_extension_semantics() {
        assert_eq!(entry_extension("dir/data.csv"), "csv");
        assert_eq!(entry_extension("DATA.CSV"), "csv");
        assert_eq!(entry_extension("noextension"), "");
        assert_eq!(entry_extension(".hidden"), "");
        assert_eq!(entry_extension("dir/"), "");
    }
}
