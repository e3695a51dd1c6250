//! Delimited-text recognisers.
//!
//! CSV detection reparses the sample through a strict row parser and then
//! applies the cells-per-row judgment: real spreadsheets settle above two
//! columns per row, while prose and logs do not.

use csv::ReaderBuilder;
use tracing::{debug, info};

/// If the sample parses as CSV with plural columns then return true.
pub fn is_csv(sample: &str) -> bool {
    // stop at the last complete line: a truncated sample must not fail the
    // reparse with an unterminated quote
    let sample = match sample.rfind('\n') {
        Some(idx) => &sample[..=idx],
        None => sample,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(sample.as_bytes());

    let mut num_cells = 0usize;
    let mut num_rows = 0usize;
    for record in reader.records() {
        match record {
            Ok(row) => {
                num_cells += row.len();
                num_rows += 1;
            }
            Err(e) => {
                debug!("CSV reparse stopped: {}", e);
                break;
            }
        }
        if num_cells > 20 || num_rows > 10 {
            let cells_per_row = num_cells as f64 / num_rows as f64;
            if cells_per_row > 1.9 {
                info!(
                    "Is CSV because {:.1} cells per row ({} cells, {} rows)",
                    cells_per_row, num_cells, num_rows
                );
                return true;
            }
        }
    }

    // if the sample is short then be more lenient
    if num_cells > 3 || num_rows > 1 {
        let cells_per_row = num_cells as f64 / num_rows as f64;
        if cells_per_row > 1.5 {
            info!(
                "Is CSV because {:.1} cells per row ({} cells, {} rows)",
                cells_per_row, num_cells, num_rows
            );
            return true;
        }
    }
    debug!(
        "Not CSV - not enough valid cells per row ({} cells, {} rows)",
        num_cells, num_rows
    );
    false
}

/// Pipe-separated detection is a declared gap: this always defers to the
/// other classifiers.
// TODO: analyse the sample with '|' as the delimiter, as is_csv does for ','
pub fn is_psv(_sample: &str) -> bool {
    false
}
