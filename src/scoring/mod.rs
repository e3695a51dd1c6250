//! Openness scoring cascade.
//!
//! Scores a resource against the five stars of openness by running a
//! strictly ordered sequence of strategies: the archiver's broken-link
//! verdict, a content sniff of the cached file, the URL's extension, and
//! the publisher's format field, with a default of 1 when nothing matched.
//! Every strategy appends its diagnostic clause to the reasons list, so
//! the final justification records the whole path taken, not just the
//! winning step. A final license gate unconditionally zeroes the score of
//! any resource whose dataset license is not open.

pub mod narrative;

use crate::archival::{ArchivalRecord, ArchivalStatus, Dataset, Resource};
use crate::error::{QaError, Result};
use crate::formats::{canonicalize, registry};
use crate::scores::ScoreTable;
use crate::sniff::sniff_file_format;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Description of each score, used by reporting layers.
pub static OPENNESS_SCORE_DESCRIPTION: [&str; 6] = [
    "Not obtainable or license is not open",
    "Obtainable and open license",
    "Machine readable format",
    "Open and standardized format",
    "Ontologically represented",
    "Fully Linked Open Data as appropriate",
];

const NOT_DOWNLOADED: &str = "This file had not been downloaded at the time of scoring it.";

/// Result of scoring one resource. Created once per scoring call and
/// handed to the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaResult {
    pub openness_score: u8,
    pub openness_score_reason: String,
    pub format: Option<String>,
    /// Time of the archival that this result is based on, ISO-8601.
    pub archival_timestamp: Option<String>,
}

/// Everything the cascade consumes for one resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext<'a> {
    pub resource: &'a Resource,
    /// The archiver's record for this resource, if it has run.
    pub archival: Option<&'a ArchivalRecord>,
    /// Whether the containing dataset's license is open.
    pub license_is_open: bool,
    /// Format recorded for this resource by a previous scoring run.
    pub previous_format: Option<&'a str>,
}

/// Score a resource on the five stars of openness.
pub fn score_resource(ctx: &ResourceContext<'_>, scores: &ScoreTable) -> Result<QaResult> {
    let mut reasons: Vec<String> = Vec::new();

    let (mut score, mut format) = score_if_link_broken(ctx, &mut reasons);
    if score.is_none() {
        // we don't want to take the publisher's word for it, in case the
        // link is only to a landing page, so highest priority is the
        // sniffed type
        (score, format) = score_by_sniffing_data(ctx, &mut reasons, scores)?;
    }
    if score.is_none() {
        (score, format) = score_by_url_extension(ctx.resource, &mut reasons, scores);
    }
    if score.is_none() {
        (score, format) = score_by_format_field(ctx.resource, &mut reasons, scores);
    }
    let mut score = match score {
        Some(score) => score,
        None => {
            warn!(
                "Could not score resource: {:?} with url: {:?}",
                ctx.resource.id, ctx.resource.url
            );
            reasons.push("Could not understand the file format, therefore score is 1.".to_string());
            if format.is_none() {
                // use any previously stored format value for this resource
                format = ctx.previous_format.map(str::to_string);
            }
            1
        }
    };

    let mut score_reason = reasons.join(" ");

    // Even if we can get the link, the resource scores 0 if the license
    // is not open. This check runs after the link check so that the
    // broken-link diagnosis is still recorded above.
    if score > 0 && !ctx.license_is_open {
        score_reason = "License not open".to_string();
        score = 0;
    }
    info!("Score: {} Reason: {}", score, score_reason);

    let archival_timestamp = ctx
        .archival
        .and_then(|a| a.updated)
        .map(|updated| updated.format("%Y-%m-%dT%H:%M:%S").to_string());

    Ok(QaResult {
        openness_score: score,
        openness_score_reason: score_reason,
        format,
        archival_timestamp,
    })
}

/// Per-resource inputs the caller supplies when scoring a whole dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceInputs<'a> {
    pub archival: Option<&'a ArchivalRecord>,
    pub previous_format: Option<&'a str>,
}

/// Score every resource of a dataset. More efficient than locating each
/// resource by id when a whole dataset is rescored.
pub fn score_dataset<'a, F>(
    dataset: &Dataset,
    mut inputs_for: F,
    scores: &ScoreTable,
) -> Result<Vec<(String, QaResult)>>
where
    F: FnMut(&Resource) -> ResourceInputs<'a>,
{
    info!(
        "Openness scoring dataset {} ({} resources)",
        dataset.name,
        dataset.resources.len()
    );
    let mut results = Vec::with_capacity(dataset.resources.len());
    for resource in &dataset.resources {
        let inputs = inputs_for(resource);
        let ctx = ResourceContext {
            resource,
            archival: inputs.archival,
            license_is_open: dataset.is_open,
            previous_format: inputs.previous_format,
        };
        results.push((resource.id.clone(), score_resource(&ctx, scores)?));
    }
    Ok(results)
}

/// Score a resource of a dataset, located by id.
pub fn score_dataset_resource(
    dataset: &Dataset,
    resource_id: &str,
    archival: Option<&ArchivalRecord>,
    previous_format: Option<&str>,
    scores: &ScoreTable,
) -> Result<QaResult> {
    let resource = dataset
        .resources
        .iter()
        .find(|r| r.id == resource_id)
        .ok_or_else(|| QaError::MissingResource(resource_id.to_string()))?;
    let ctx = ResourceContext {
        resource,
        archival,
        license_is_open: dataset.is_open,
        previous_format,
    };
    score_resource(&ctx, scores)
}

/// Looks to see if the archiver said the link was broken, and if so scores
/// 0 with the failure narrative, keeping any previously known format.
fn score_if_link_broken(
    ctx: &ResourceContext<'_>,
    reasons: &mut Vec<String>,
) -> (Option<u8>, Option<String>) {
    if let Some(archival) = ctx.archival {
        if archival.is_broken == Some(true) {
            reasons.push(narrative::broken_link_error_message(archival));
            let format = ctx.previous_format.map(str::to_string);
            info!("Archiver says link is broken. Previous format: {:?}", format);
            return (Some(0), format);
        }
    }
    (None, None)
}

/// Looks inside the cached data file's contents to determine its format
/// and score. This is the single most information-rich step.
fn score_by_sniffing_data(
    ctx: &ResourceContext<'_>,
    reasons: &mut Vec<String>,
    scores: &ScoreTable,
) -> Result<(Option<u8>, Option<String>)> {
    let Some(archival) = ctx.archival else {
        reasons.push(NOT_DOWNLOADED.to_string());
        return Ok((None, None));
    };
    let Some(filepath) = archival.cache_filepath.as_deref() else {
        // no cached copy; the archiver's status says why
        if archival.status == Some(ArchivalStatus::ChoseNotToDownload) {
            reasons.push(format!(
                "File was not downloaded deliberately. Reason: {}. \
                 Using other methods to determine file openness.",
                archival.reason
            ));
        } else if archival.is_broken.is_none() && archival.status.is_some() {
            // i.e. a download failure or a system error during archival
            reasons.push(format!(
                "A system error occurred during downloading this file. Reason: {}. \
                 Using other methods to determine file openness.",
                archival.reason
            ));
        } else {
            reasons.push(NOT_DOWNLOADED.to_string());
        }
        return Ok((None, None));
    };
    if !filepath.exists() {
        // the cache has been cleaned out from under us
        reasons.push(
            "A system error occurred during downloading this file. \
             Using other methods to determine file openness."
                .to_string(),
        );
        return Ok((None, None));
    }

    match sniff_file_format(filepath, scores)? {
        Some(sniffed) => {
            let score = scores.score_for(&sniffed.format);
            match score {
                Some(score) => reasons.push(format!(
                    "Content of file appeared to be format \"{}\" which receives \
                     openness score: {}.",
                    sniffed.format, score
                )),
                None => reasons.push(format!(
                    "Content of file appeared to be format \"{}\" but no openness \
                     score is configured for it.",
                    sniffed.format
                )),
            }
            Ok((score, Some(sniffed.format)))
        }
        None => {
            reasons.push("The format of the file was not recognized from its contents.".to_string());
            Ok((None, None))
        }
    }
}

/// Looks at the URL for a resource to determine its format and score.
fn score_by_url_extension(
    resource: &Resource,
    reasons: &mut Vec<String>,
    scores: &ScoreTable,
) -> (Option<u8>, Option<String>) {
    let variants = extension_variants(resource.url.trim());
    if variants.is_empty() {
        reasons.push("Could not determine a file extension in the URL.".to_string());
        return (None, None);
    }
    for extension in &variants {
        if let Some(descriptor) = registry().lookup(extension) {
            let shortname = descriptor.shortname.clone();
            match scores.score_for(&shortname) {
                Some(score) if score > 0 => {
                    reasons.push(format!(
                        "URL extension \"{}\" relates to format \"{}\" and receives \
                         score: {}.",
                        extension, shortname, score
                    ));
                    return (Some(score), Some(shortname));
                }
                _ => {
                    reasons.push(format!(
                        "URL extension \"{}\" relates to format \"{}\" but a score \
                         for that format is not configured, so giving it default \
                         score 1.",
                        extension, shortname
                    ));
                    return (Some(1), Some(shortname));
                }
            }
        }
        reasons.push(format!(
            "URL extension \"{}\" is an unknown format.",
            extension
        ));
    }
    (None, None)
}

/// Looks at the publisher-supplied format field of a resource.
fn score_by_format_field(
    resource: &Resource,
    reasons: &mut Vec<String>,
    scores: &ScoreTable,
) -> (Option<u8>, Option<String>) {
    let format_field = resource.format_field.as_deref().unwrap_or("").trim();
    if format_field.is_empty() {
        reasons.push("Format field is blank.".to_string());
        return (None, None);
    }
    let descriptor = registry()
        .lookup(format_field)
        .or_else(|| registry().lookup(&canonicalize(format_field)));
    let Some(descriptor) = descriptor else {
        reasons.push(format!(
            "Format field \"{}\" does not correspond to a known format.",
            format_field
        ));
        return (None, None);
    };
    let shortname = descriptor.shortname.clone();
    let score = scores.score_for(&shortname);
    match score {
        Some(score) => reasons.push(format!(
            "Format field \"{}\" receives score: {}.",
            format_field, score
        )),
        None => reasons.push(format!(
            "Format field \"{}\" is recognized but no openness score is configured \
             for it.",
            format_field
        )),
    }
    // an unscored but recognised format still flows into the default step
    (score, Some(shortname))
}

/// Extension candidates for a URL, most significant first.
///
/// `http://dept.gov.uk/coins.data.1996.csv.zip` gives
/// `["csv.zip", "zip"]`; a URL with no dotted final path segment gives
/// nothing.
pub fn extension_variants(url: &str) -> Vec<String> {
    let url = url.split('?').next().unwrap_or(url); // get rid of params
    let filename = url.rsplit('/').next().unwrap_or(url);
    let sections: Vec<&str> = filename.split('.').collect();
    let mut results = Vec::new();
    for number_of_sections in [2usize, 1] {
        if sections.len() > number_of_sections {
            results.push(sections[sections.len() - number_of_sections..].join("."));
        }
    }
    results
}
