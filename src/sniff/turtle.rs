//! Turtle RDF detection.
//!
//! Two heuristics: the `@prefix`/`@base` directive that Turtle documents
//! may carry near the beginning, or a run of matched
//! `subject predicate object .` triple patterns (tolerating `;`-chained
//! predicate-object lists). RDF terms recognised: angle-bracket IRIs,
//! blank nodes, quoted literals with optional language tag or datatype
//! suffix, numeric literals and booleans. Prefixed terms are not needed:
//! a document using them would have already matched on `@prefix`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Triples required before the sample counts as Turtle.
const REQUIRED_TRIPLES: usize = 5;

static AT_DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^@(prefix|base) ").expect("turtle directive regex"));

static TRIPLE_RE: Lazy<Regex> = Lazy::new(|| {
    let term = concat!(
        r#"(<[^\s+>]+>"#,
        r#"|_:\S+"#,
        r#"|".+?"(@\w+)?(\^\^\S+)?"#,
        r#"|'.+?'(@\w+)?(\^\^\S+)?"#,
        r#"|""".+?"""(@\w+)?(\^\^\S+)?"#,
        r#"|'''.+?'''(@\w+)?(\^\^\S+)?"#,
        r#"|[+-]?([0-9]+|[0-9]*\.[0-9]+)(E[+-]?[0-9]+)?"#,
        r#"|false|true)"#,
    );
    let triple = format!(r"(?m)(^{term}|;)\s*{term}\s+{term}\s*(;|\.\s*$)");
    Regex::new(&triple).expect("turtle triple regex")
});

/// A compiled regex that matches one turtle triple (or one `;`-chained
/// predicate-object continuation).
pub fn triple_regex() -> &'static Regex {
    &TRIPLE_RE
}

/// If the buffer is a Turtle RDF file then return true.
pub fn is_turtle(buf: &str) -> bool {
    // Turtle spec: documents may have '@prefix' or '@base' near the
    // beginning of the document
    if AT_DIRECTIVE_RE.is_match(buf) {
        info!("Turtle RDF detected - @prefix or @base");
        return true;
    }

    // alternatively look for several triples
    let triples = TRIPLE_RE.find_iter(buf).take(REQUIRED_TRIPLES).count();
    if triples >= REQUIRED_TRIPLES {
        info!("Turtle RDF detected - {} triples", triples);
        return true;
    }
    debug!("Not Turtle RDF - triples not detected ({})", triples);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_triple(object: &str) -> bool {
        let line = format!("<subject> <predicate> {} .", object);
        TRIPLE_RE.is_match(&line)
    }

    #[test]
    fn term_forms() {
        assert!(matches_triple("<url>"));
        assert!(matches_triple("\"a literal\""));
        assert!(matches_triple("\"translation\"@ru"));
        assert!(matches_triple(
            "\"literal type\"^^<http://www.w3.org/2001/XMLSchema#string>"
        ));
        assert!(matches_triple("\"literal typed with prefix\"^^xsd:string"));
        assert!(matches_triple("'single quotes'"));
        assert!(matches_triple("\"\"\"triple quotes but not multiline\"\"\""));
        assert!(matches_triple("'''triple quotes but not multiline'''"));
        assert!(matches_triple("12"));
        assert!(matches_triple("1.12"));
        assert!(matches_triple(".12"));
        assert!(matches_triple("12E12"));
        assert!(matches_triple("-4.2E-9"));
        assert!(matches_triple("false"));
        assert!(matches_triple("_:blank_node"));
    }

    #[test]
    fn chained_predicate_objects() {
        assert!(TRIPLE_RE.is_match("<s> <p> <o> ;\n <p> <o> ."));
        assert!(TRIPLE_RE.is_match("<s> <p> <o>;<p> <o>."));
        assert!(TRIPLE_RE.is_match("<s> <p> <o> ;"));
        assert!(TRIPLE_RE.is_match(" ;<p> <o>."));
        assert!(TRIPLE_RE.is_match(";\n<p> <o>;"));
    }

    #[test]
    fn non_triples_rejected() {
        assert!(!TRIPLE_RE.is_match("<s> <p> <o>. rubbish"));
        assert!(!matches_triple("word"));
        assert!(!matches_triple("prefix:node"));
    }

    #[test]
    fn directive_detection() {
        assert!(is_turtle("@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n"));
        assert!(is_turtle("# comment line\n@base <http://example.org/> .\n"));
        assert!(!is_turtle("an email mentioning @prefix mid-line"));
    }

    #[test]
    fn triple_count_threshold_is_five() {
        let triple = "<subject> <predicate> <object>; <predicate> <object>.";
        let two = [triple; 2].join("\n");
        assert!(!is_turtle(&two));
        let five = [triple; 5].join("\n");
        assert!(is_turtle(&five));
    }
}
