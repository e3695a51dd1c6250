//! Human-readable narrative for broken download links.

use crate::archival::ArchivalRecord;
use chrono::NaiveDateTime;

fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Given an archival record for a broken link, build a helpful error
/// message describing the download attempts.
pub fn broken_link_error_message(archival: &ArchivalRecord) -> String {
    let status = archival
        .status
        .map(|s| s.to_string())
        .unwrap_or_default();
    let mut messages = vec![
        "File could not be downloaded.".to_string(),
        format!("Reason: {}.", status),
        format!("Error details: {}.", archival.reason),
        format!("Attempted on {}.", format_date(archival.updated)),
    ];
    let last_success = format_date(archival.last_success);
    if archival.failure_count == 1 {
        if last_success.is_empty() {
            messages.push("This was the first attempt.".to_string());
        } else {
            messages.push(format!("This URL last worked on: {}.", last_success));
        }
    } else {
        messages.push(format!(
            "Tried {} times since {}.",
            archival.failure_count,
            format_date(archival.first_failure)
        ));
        if last_success.is_empty() {
            messages.push("This URL has not worked in the history of this tool.".to_string());
        } else {
            messages.push(format!("This URL last worked on: {}.", last_success));
        }
    }
    messages.join(" ")
}
