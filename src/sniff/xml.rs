//! XML-family detection.
//!
//! Streams a buffer only far enough to capture the first start tag, then
//! canonicalises well-known root-tag variants (WMS/WFS capability
//! documents, Atom feeds, RDF/XML) before a registry lookup. Also home to
//! the HTML, IATI, RDFa and declaration-less-XML pattern checks, which all
//! work on a bounded text sample.

use crate::formats::registry;
use crate::sniff::SniffResult;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Regex, RegexBuilder};
use tracing::{debug, info, warn};

/// Outcome of streaming a buffer for its first start tag.
///
/// Parsing stops as soon as the first start tag is seen; this is an
/// early-exit signal, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstTag {
    Found { name: String },
    NotFound,
}

/// Stream the buffer and return the first start-tag name, if any.
pub fn first_start_tag(buf: &str) -> FirstTag {
    let mut reader = Reader::from_str(buf);
    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                return FirstTag::Found { name };
            }
            Ok(Event::Eof) => return FirstTag::NotFound,
            Err(e) => {
                debug!("XML parse stopped before any start tag: {}", e);
                return FirstTag::NotFound;
            }
            Ok(_) => {}
        }
    }
}

/// If this buffer is in a format based on XML, return the format type.
///
/// Works with or without an XML declaration; falls back to generic "XML"
/// when the root tag is not a recognised variant.
pub fn xml_variant(buf: &str) -> Option<SniffResult> {
    let name = match first_start_tag(buf) {
        FirstTag::Found { name } => name.to_lowercase(),
        FirstTag::NotFound => return Some(SniffResult::format("XML")),
    };
    info!("Top level tag detected as: {}", name);

    let mut name = name.replace("rdf:rdf", "rdf");
    name = name.replace("wms_capabilities", "wms"); // WMS 1.3
    name = name.replace("wmt_ms_capabilities", "wms"); // WMS 1.1.1
    name = WFS_PREFIX_RE.replace(&name, "wfs").into_owned(); // WFS 2.0
    name = name.replace("wfs_capabilities", "wfs"); // WFS 1.0/1.1
    name = name.replace("feed", "atom feed");
    if name == "capabilities" && buf.contains("xmlns=\"http://www.opengis.net/wmts/") {
        name = "wmts".to_string();
    }
    if (name == "capabilities" || name == "coveragedescriptions")
        && buf.contains("xmlns=\"http://www.opengis.net/wcs/")
    {
        name = "wcs".to_string();
    }

    if let Some(descriptor) = registry().lookup(&name) {
        info!("XML variant detected: {}", descriptor.display_name);
        return Some(SniffResult::format(&descriptor.shortname));
    }
    warn!("Did not recognise XML format: {}", name);
    Some(SniffResult::format("XML"))
}

static WFS_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new("wfs:.*").expect("wfs regex"));

static XML_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^.{0,3}\s*<\?xml[^>]*>")
        .case_insensitive(true)
        .build()
        .expect("xml declaration regex")
});

static HTML_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^.{0,3}\s*(<\?xml[^>]*>\s*)?(<!doctype[^>]*>\s*)?<html[^>]*>")
        .case_insensitive(true)
        .build()
        .expect("html regex")
});

static IATI_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"^.{0,3}\s*(<\?xml[^>]*>\s*)?(<!doctype[^>]*>\s*)?<iati-(activities|organisations)[^>]*>",
    )
    .case_insensitive(true)
    .build()
    .expect("iati regex")
});

static FIRST_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^.{0,3}\s*(<\?xml[^>]*>\s*)?(<!doctype[^>]*>\s*)?<([^>\s]*)([^>]*)>")
        .case_insensitive(true)
        .build()
        .expect("first tag regex")
});

static RDFA_ABOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<[^>]+\sabout="[^"]+"[^>]*>"#).expect("rdfa about regex"));

static RDFA_PROPERTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<[^>]+\sproperty="[^"]+"[^>]*>"#).expect("rdfa property regex"));

/// Whether the buffer opens with an `<?xml ...?>` declaration (a few bytes
/// of BOM/noise tolerated).
pub fn has_xml_declaration(buf: &str) -> bool {
    XML_DECL_RE.is_match(buf)
}

/// Whether the buffer opens with an HTML tag.
pub fn is_html(buf: &str) -> bool {
    if HTML_RE.is_match(buf) {
        info!("HTML tag detected");
        return true;
    }
    debug!("Not HTML");
    false
}

/// Whether the buffer opens with an IATI root tag. IATI documents are
/// frequently misidentified as HTML by magic detection.
pub fn is_iati(buf: &str) -> bool {
    if IATI_RE.is_match(buf) {
        info!("IATI tag detected");
        return true;
    }
    debug!("Not IATI");
    false
}

/// Decides if this is a buffer of XML that is missing the usual
/// `<?xml ...?>` declaration.
///
/// Binary data can contain an accidental `<...>` span; an implausibly long
/// first tag name or attribute list rules those out, unless a namespace
/// declaration vouches for the tag.
pub fn is_xml_but_without_declaration(buf: &str) -> bool {
    let Some(caps) = FIRST_TAG_RE.captures(buf) else {
        debug!("Not XML (without declaration) - tag not detected");
        return false;
    };
    let tag_name = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let tag_attributes = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    if !tag_attributes.contains("xmlns:") && (tag_name.len() > 20 || tag_attributes.len() > 200) {
        debug!(
            "Not XML (without declaration) - unlikely length first tag: <{} {}>",
            tag_name, tag_attributes
        );
        return false;
    }
    info!("XML detected - first tag name: <{}>", tag_name);
    true
}

/// If the buffer of HTML contains RDFa then this returns true.
///
/// Both `about=` and `property=` must appear as genuine tag attributes,
/// not merely as substrings.
pub fn has_rdfa(buf: &str) -> bool {
    // quick check for the key words
    if !buf.contains("about=") || !buf.contains("property=") {
        debug!("Not RDFa");
        return false;
    }
    if !RDFA_ABOUT_RE.is_match(buf) || !RDFA_PROPERTY_RE.is_match(buf) {
        debug!("Not RDFa");
        return false;
    }
    info!("RDFa tags found in HTML");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tag_extraction_stops_early() {
        let buf = "<?xml version=\"1.0\"?>\n<jobs date=\"2011\"><job>x</job></jobs>";
        assert_eq!(
            first_start_tag(buf),
            FirstTag::Found {
                name: "jobs".to_string()
            }
        );
        // truncated content after the first tag is irrelevant
        let truncated = "<?xml version=\"1.0\"?><jobs><job>unfini";
        assert_eq!(
            first_start_tag(truncated),
            FirstTag::Found {
                name: "jobs".to_string()
            }
        );
    }

    #[test]
    fn no_tag_found() {
        assert_eq!(first_start_tag("plain text, no markup"), FirstTag::NotFound);
        assert_eq!(first_start_tag(""), FirstTag::NotFound);
    }

    #[test]
    fn wms_variants_collapse() {
        let wms13 = "<?xml version=\"1.0\"?><WMS_Capabilities version=\"1.3.0\"></WMS_Capabilities>";
        assert_eq!(xml_variant(wms13).map(|f| f.format), Some("WMS".to_string()));
        let wms111 = "<?xml version=\"1.0\"?><WMT_MS_Capabilities version=\"1.1.1\"></WMT_MS_Capabilities>";
        assert_eq!(xml_variant(wms111).map(|f| f.format), Some("WMS".to_string()));
    }

    #[test]
    fn wfs_variants_collapse() {
        let wfs20 = "<wfs:WFS_Capabilities version=\"2.0.0\"></wfs:WFS_Capabilities>";
        assert_eq!(xml_variant(wfs20).map(|f| f.format), Some("WFS".to_string()));
        let wfs10 = "<WFS_Capabilities version=\"1.0.0\"></WFS_Capabilities>";
        assert_eq!(xml_variant(wfs10).map(|f| f.format), Some("WFS".to_string()));
    }

    #[test]
    fn wmts_and_wcs_need_their_namespace() {
        let wmts = "<Capabilities xmlns=\"http://www.opengis.net/wmts/1.0\"></Capabilities>";
        assert_eq!(xml_variant(wmts).map(|f| f.format), Some("WMTS".to_string()));
        let wcs = "<CoverageDescriptions xmlns=\"http://www.opengis.net/wcs/2.0\"></CoverageDescriptions>";
        assert_eq!(xml_variant(wcs).map(|f| f.format), Some("WCS".to_string()));
        // a bare Capabilities root with no known namespace is just XML
        let bare = "<Capabilities></Capabilities>";
        assert_eq!(xml_variant(bare).map(|f| f.format), Some("XML".to_string()));
    }

    #[test]
    fn feed_becomes_atom_and_rdf_collapses() {
        let atom = "<feed xmlns=\"http://www.w3.org/2005/Atom\"></feed>";
        assert_eq!(
            xml_variant(atom).map(|f| f.format),
            Some("Atom Feed".to_string())
        );
        let rdf = "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"></rdf:RDF>";
        assert_eq!(xml_variant(rdf).map(|f| f.format), Some("RDF".to_string()));
    }

    #[test]
    fn unknown_root_falls_back_to_xml() {
        let buf = "<?xml version=\"1.0\"?><creditorInvoices></creditorInvoices>";
        assert_eq!(xml_variant(buf).map(|f| f.format), Some("XML".to_string()));
    }

    #[test]
    fn html_and_iati_checks() {
        assert!(is_html("<!DOCTYPE html>\n<html lang=\"en\"><head>"));
        assert!(is_html("<html>"));
        assert!(!is_html("<xml><html>nested later</html></xml>"));
        assert!(is_iati("<?xml version=\"1.0\"?><iati-activities version=\"1.03\">"));
        assert!(is_iati("<iati-organisations>"));
        assert!(!is_iati("<html><body>iati-activities</body></html>"));
    }

    #[test]
    fn xml_declaration_check() {
        assert!(has_xml_declaration("<?xml version=\"1.0\"?><a/>"));
        assert!(has_xml_declaration("\u{feff}<?xml version=\"1.0\"?>"));
        assert!(!has_xml_declaration("<a><b/></a>"));
    }

    #[test]
    fn declaration_less_xml_heuristic() {
        assert!(is_xml_but_without_declaration("<jobs date=\"2011\"><job/></jobs>"));
        // implausibly long first tag on binary-ish content
        let long_tag = format!("<{}>", "x".repeat(30));
        assert!(!is_xml_but_without_declaration(&long_tag));
        // but a namespaced tag of any length passes
        let namespaced = format!("<{} xmlns:gml=\"http://www.opengis.net/gml\">", "x".repeat(30));
        assert!(is_xml_but_without_declaration(&namespaced));
        assert!(!is_xml_but_without_declaration("no tags here at all"));
    }

    #[test]
    fn rdfa_needs_both_attributes() {
        let rdfa = "<div about=\"/dataset/1\"><span property=\"dc:title\">x</span></div>";
        assert!(has_rdfa(rdfa));
        let about_only = "<div about=\"/dataset/1\">x</div>";
        assert!(!has_rdfa(about_only));
        let substrings_only = "<p>talks about= things and property= values</p>";
        assert!(!has_rdfa(substrings_only));
    }
}
