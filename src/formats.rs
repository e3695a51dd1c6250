//! Canonical resource-format registry.
//!
//! A static bidirectional table mapping lower-cased file extensions,
//! mimetypes and canonical XML tag names to format descriptors. Built once
//! per process and immutable thereafter. Unknown keys yield `None`; absence
//! of a mapping is expected and common.

use crate::error::{QaError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One canonical data format and the keys that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Canonical shortname, e.g. "CSV". Unique within the registry.
    pub shortname: String,
    pub display_name: String,
    /// Lookup keys: extensions and canonical XML tag names.
    pub extensions: Vec<String>,
    pub mimetypes: Vec<String>,
}

impl FormatDescriptor {
    fn new(shortname: &str, display_name: &str, extensions: &[&str], mimetypes: &[&str]) -> Self {
        Self {
            shortname: shortname.to_string(),
            display_name: display_name.to_string(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            mimetypes: mimetypes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Immutable lookup table over format descriptors.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    descriptors: Vec<FormatDescriptor>,
    by_key: HashMap<String, usize>,
}

impl FormatRegistry {
    /// Build a registry, indexing every shortname, extension and mimetype.
    ///
    /// Keys must map to at most one descriptor; a duplicate across
    /// descriptors is a construction error.
    pub fn from_descriptors(descriptors: Vec<FormatDescriptor>) -> Result<Self> {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (idx, descriptor) in descriptors.iter().enumerate() {
            // de-duplicate within one descriptor (shortname often doubles
            // as an extension)
            let mut keys: BTreeSet<String> = BTreeSet::new();
            keys.insert(descriptor.shortname.to_lowercase());
            keys.extend(descriptor.extensions.iter().map(|e| e.to_lowercase()));
            keys.extend(descriptor.mimetypes.iter().map(|m| m.to_lowercase()));
            for key in keys {
                if let Some(&prev) = by_key.get(&key) {
                    return Err(QaError::Internal(format!(
                        "duplicate format registry key {:?} ({} and {})",
                        key, descriptors[prev].shortname, descriptor.shortname
                    )));
                }
                by_key.insert(key, idx);
            }
        }
        Ok(Self {
            descriptors,
            by_key,
        })
    }

    /// Look up a descriptor by extension, mimetype, shortname or canonical
    /// XML tag name. Keys are matched case-insensitively.
    pub fn lookup(&self, key: &str) -> Option<&FormatDescriptor> {
        self.by_key
            .get(&key.trim().to_lowercase())
            .map(|&idx| &self.descriptors[idx])
    }

    /// Shortname for a key, if known.
    pub fn shortname(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|d| d.shortname.as_str())
    }

    pub fn descriptors(&self) -> &[FormatDescriptor] {
        &self.descriptors
    }
}

/// Normalise a user-supplied format name towards a canonical key:
/// trim, lowercase, strip one leading "." and drop anything outside
/// `[a-z/+]`.
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    let trimmed = trimmed.strip_prefix('.').unwrap_or(&trimmed);
    trimmed
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '/' | '+'))
        .collect()
}

fn builtin_descriptors() -> Vec<FormatDescriptor> {
    vec![
        FormatDescriptor::new(
            "CSV",
            "Comma Separated Values File",
            &["csv"],
            &["text/csv", "application/csv"],
        ),
        FormatDescriptor::new("PSV", "Pipe Separated Values File", &["psv"], &[]),
        FormatDescriptor::new(
            "XLS",
            "Excel Document",
            &["xls"],
            &["application/vnd.ms-excel"],
        ),
        FormatDescriptor::new(
            "XLSX",
            "Excel OOXML Document",
            &["xlsx"],
            &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
        ),
        FormatDescriptor::new("DOC", "Word Document", &["doc"], &["application/msword"]),
        FormatDescriptor::new(
            "DOCX",
            "Word OOXML Document",
            &["docx"],
            &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
        ),
        FormatDescriptor::new(
            "PPT",
            "PowerPoint Presentation",
            &["ppt"],
            &["application/vnd.ms-powerpoint"],
        ),
        FormatDescriptor::new(
            "PPTX",
            "PowerPoint OOXML Presentation",
            &["pptx"],
            &["application/vnd.openxmlformats-officedocument.presentationml.presentation"],
        ),
        FormatDescriptor::new(
            "ODS",
            "OpenDocument Spreadsheet",
            &["ods"],
            &["application/vnd.oasis.opendocument.spreadsheet"],
        ),
        FormatDescriptor::new(
            "ODT",
            "OpenDocument Text",
            &["odt"],
            &["application/vnd.oasis.opendocument.text"],
        ),
        FormatDescriptor::new(
            "ODP",
            "OpenDocument Presentation",
            &["odp"],
            &["application/vnd.oasis.opendocument.presentation"],
        ),
        FormatDescriptor::new("JSON", "JSON", &["json"], &["application/json"]),
        FormatDescriptor::new(
            "XML",
            "XML Document",
            &["xml"],
            &["application/xml", "text/xml"],
        ),
        FormatDescriptor::new("HTML", "Web Page", &["html", "htm"], &["text/html"]),
        FormatDescriptor::new("TXT", "Text File", &["txt"], &["text/plain"]),
        FormatDescriptor::new("PDF", "PDF File", &["pdf"], &["application/pdf"]),
        FormatDescriptor::new("ZIP", "Zip File", &["zip"], &["application/zip"]),
        FormatDescriptor::new(
            "GZIP",
            "Gzip File",
            &["gz", "gzip"],
            &["application/gzip", "application/x-gzip"],
        ),
        FormatDescriptor::new(
            "RDF",
            "RDF",
            &["rdf", "rdf/xml"],
            &["application/rdf+xml"],
        ),
        FormatDescriptor::new("TTL", "Turtle RDF", &["ttl"], &["text/turtle"]),
        FormatDescriptor::new("RDFa", "RDFa", &["rdfa", "html+rdfa"], &[]),
        FormatDescriptor::new(
            "IATI",
            "IATI XML",
            &["iati", "iati-activities", "iati-organisations"],
            &[],
        ),
        FormatDescriptor::new("SHP", "Shapefile", &["shp"], &[]),
        FormatDescriptor::new(
            "GTFS",
            "General Transit Feed Specification",
            &["gtfs"],
            &[],
        ),
        FormatDescriptor::new(
            "WMS",
            "Web Mapping Service",
            &["wms"],
            &["application/vnd.ogc.wms_xml"],
        ),
        FormatDescriptor::new("WFS", "Web Feature Service", &["wfs"], &[]),
        FormatDescriptor::new("WMTS", "Web Map Tile Service", &["wmts"], &[]),
        FormatDescriptor::new("WCS", "Web Coverage Service", &["wcs"], &[]),
        FormatDescriptor::new(
            "KML",
            "KML File",
            &["kml"],
            &["application/vnd.google-earth.kml+xml"],
        ),
        FormatDescriptor::new("RSS", "RSS Feed", &["rss"], &["application/rss+xml"]),
        FormatDescriptor::new(
            "Atom Feed",
            "Atom Feed",
            &["atom", "atom feed"],
            &["application/atom+xml"],
        ),
    ]
}

static REGISTRY: Lazy<FormatRegistry> = Lazy::new(|| {
    FormatRegistry::from_descriptors(builtin_descriptors())
        .expect("built-in format table is consistent")
});

/// The process-wide, immutable format registry.
pub fn registry() -> &'static FormatRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_is_consistent() {
        let registry = FormatRegistry::from_descriptors(builtin_descriptors());
        assert!(registry.is_ok());
    }

    #[test]
    fn lookup_by_extension_mimetype_and_shortname() {
        let r = registry();
        assert_eq!(r.shortname("csv"), Some("CSV"));
        assert_eq!(r.shortname("text/csv"), Some("CSV"));
        assert_eq!(r.shortname("application/vnd.ms-excel"), Some("XLS"));
        assert_eq!(r.shortname("xls"), Some("XLS"));
        assert_eq!(r.shortname("atom feed"), Some("Atom Feed"));
        assert_eq!(r.shortname("iati-activities"), Some("IATI"));
        assert_eq!(r.shortname("zar"), None);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(registry().shortname("CSV"), Some("CSV"));
        assert_eq!(registry().shortname("Text/Plain"), Some("TXT"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let descriptors = vec![
            FormatDescriptor::new("CSV", "Comma Separated Values File", &["csv"], &[]),
            FormatDescriptor::new("CSW", "Catalogue Service", &["csv"], &[]),
        ];
        let err = FormatRegistry::from_descriptors(descriptors);
        assert!(err.is_err());
        let message = err.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("csv"), "{}", message);
    }

    #[test]
    fn canonicalize_strips_noise() {
        assert_eq!(canonicalize(" .CSV "), "csv");
        assert_eq!(canonicalize("Zipped CSV"), "zippedcsv");
        assert_eq!(canonicalize("rdf/xml"), "rdf/xml");
        assert_eq!(canonicalize("atom+xml"), "atom+xml");
        assert_eq!(canonicalize("CSV file (2010)"), "csvfile");
    }
}
