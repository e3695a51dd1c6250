//! Legacy-office probes.
//!
//! A spreadsheet probe (can the file be opened as an XLS workbook?) and a
//! fallback that consults the general-purpose `file(1)` signature tool to
//! split Word/PowerPoint/Excel/Shapefile apart when the mimetype is
//! uninformative. The subprocess is bounded by a timeout; a non-zero exit
//! or timeout is a negative verdict for this classifier only, never an
//! error.

use crate::formats::registry;
use crate::sniff::SniffResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on one `file(1)` invocation.
const FILE_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

static CREATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Name of Creating Application: ([^,]*),").expect("creator regex"));

/// Whether the file opens as a legacy Excel workbook.
///
/// Success implies "XLS"; failure is not itself informative, other
/// detectors must run too.
pub fn is_excel(filepath: &Path) -> bool {
    use calamine::{Reader as _, Xls};

    let file = match File::open(filepath) {
        Ok(f) => f,
        Err(e) => {
            debug!("Not Excel - could not open: {}", e);
            return false;
        }
    };
    match Xls::new(BufReader::new(file)) {
        Ok(_) => {
            info!("Excel file opened successfully");
            true
        }
        Err(e) => {
            debug!("Not Excel - failed to load: {}", e);
            false
        }
    }
}

/// Run the signature tool `file(1)` to determine the file type. Returns a
/// verdict, or `None` if the tool fails or recognises nothing useful.
pub fn file_signature(filepath: &Path) -> Option<SniffResult> {
    let output = run_file_tool(filepath)?;

    if let Some(caps) = CREATOR_RE.captures(&output) {
        let app_name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let extension = match app_name {
            "Microsoft Office PowerPoint" | "Microsoft PowerPoint" => Some("ppt"),
            "Microsoft Excel" => Some("xls"),
            "Microsoft Office Word" | "Microsoft Word 10.0" | "Microsoft Macintosh Word" => {
                Some("doc")
            }
            _ => None,
        };
        if let Some(extension) = extension {
            let descriptor = registry().lookup(extension)?;
            info!("\"file\" detected file format: {}", descriptor.display_name);
            return Some(SniffResult::format(&descriptor.shortname));
        }
    }
    if output.contains(": ESRI Shapefile") {
        info!("\"file\" detected file format: SHP");
        return Some(SniffResult::format("SHP"));
    }
    info!(
        "\"file\" could not determine file format of {:?}: {}",
        filepath,
        output.trim_end()
    );
    None
}

/// Run `file <path>` as a scoped synchronous operation with a bounded
/// timeout; the child is killed at the deadline.
fn run_file_tool(filepath: &Path) -> Option<String> {
    let mut child = match Command::new("file")
        .arg(filepath)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            debug!("Could not spawn \"file\": {}", e);
            return None;
        }
    };

    let deadline = Instant::now() + FILE_TOOL_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut output = String::new();
                if let Some(mut stdout) = child.stdout.take() {
                    let _ = stdout.read_to_string(&mut output);
                }
                if !status.success() {
                    info!("\"file\" exited with {}", status);
                    return None;
                }
                return Some(output);
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    warn!(
                        "\"file\" timed out after {:?}, killing it",
                        FILE_TOOL_TIMEOUT
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => {
                debug!("Waiting for \"file\" failed: {}", e);
                return None;
            }
        }
    }
}
