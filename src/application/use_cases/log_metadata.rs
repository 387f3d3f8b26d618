// ============================================================
// LOG METADATA USE CASE
// ============================================================
// Best-effort well/curve/depth extraction from LIS and DLIS files

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::domain::error::{AppError, Result};
use crate::domain::well_log::{LogFormat, WellLogSummary};

static WELL_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)WELL(?:\s+NAME)?\s*[:=-]\s*([A-Za-z0-9_\-\s]{3,})").unwrap(),
        Regex::new(r"(?i)NAME\s*[:=-]\s*([A-Za-z0-9_\-\s]{3,})\s*WELL").unwrap(),
    ]
});

static CURVE_SPLIT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,:;]+").unwrap());

static CURVE_TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]{1,15}$").unwrap());

static DEPTH_START_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)(?:start|from)\s*depth\s*[:=-]?\s*(-?\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?i)depth\s*\(start\)\s*[:=-]?\s*(-?\d+(?:\.\d+)?)").unwrap(),
    ]
});

static DEPTH_END_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)(?:end|to)\s*depth\s*[:=-]?\s*(-?\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?i)depth\s*\(end\)\s*[:=-]?\s*(-?\d+(?:\.\d+)?)").unwrap(),
    ]
});

static DEPTH_RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)depth\s*[:=-]?\s*(-?\d+(?:\.\d+)?)\s*[-to]+\s*(-?\d+(?:\.\d+)?)").unwrap()
});

/// One tier of the extraction chain.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path, file_name: &str, format: LogFormat) -> Result<WellLogSummary>;
}

/// Structured tier: delegate to an optional external parser command
/// (`<cmd> <FORMAT> <path>`) that dumps well and curve metadata as
/// JSON on stdout. Every failure here is recoverable by design; the
/// caller falls back to [`HeuristicExtractor`].
pub struct StructuredExtractor {
    parser_cmd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StructuredDump {
    #[serde(default)]
    wells: Vec<String>,
    #[serde(default)]
    curves: Vec<StructuredCurve>,
}

#[derive(Debug, Deserialize)]
struct StructuredCurve {
    name: String,
    #[serde(default)]
    dimension: Option<String>,
    #[serde(default)]
    first: Option<f64>,
    #[serde(default)]
    last: Option<f64>,
}

impl StructuredExtractor {
    pub fn new(parser_cmd: Option<String>) -> Self {
        Self { parser_cmd }
    }

    pub fn is_configured(&self) -> bool {
        self.parser_cmd.is_some()
    }
}

impl MetadataExtractor for StructuredExtractor {
    fn extract(&self, path: &Path, file_name: &str, format: LogFormat) -> Result<WellLogSummary> {
        let cmd = self.parser_cmd.as_deref().ok_or_else(|| {
            AppError::WellLogError("structured log parser is not configured".to_string())
        })?;

        let output = Command::new(cmd)
            .arg(format.as_str())
            .arg(path.as_os_str())
            .output()
            .map_err(|e| AppError::WellLogError(format!("failed to start {}: {}", cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::WellLogError(format!(
                "{} exited with {}: {}",
                cmd,
                output.status,
                stderr.trim()
            )));
        }

        let dump: StructuredDump = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::WellLogError(format!("invalid output from {}: {}", cmd, e)))?;

        let mut curve_names = Vec::with_capacity(dump.curves.len());
        let mut depth_min: Option<f64> = None;
        let mut depth_max: Option<f64> = None;
        let mut depth_unit: Option<String> = None;

        for curve in &dump.curves {
            curve_names.push(curve.name.clone());
            // First curve with a dimension wins; later curves are not
            // cross-checked against it.
            if depth_unit.is_none() {
                depth_unit = curve.dimension.clone();
            }
            if let Some(first) = curve.first {
                if depth_min.map_or(true, |min| first < min) {
                    depth_min = Some(first);
                }
            }
            if let Some(last) = curve.last {
                if depth_max.map_or(true, |max| last > max) {
                    depth_max = Some(last);
                }
            }
        }

        Ok(WellLogSummary {
            file_name: file_name.to_string(),
            log_format: format,
            well_names: unique_preserve(dump.wells.iter().map(String::as_str)),
            curve_names: unique_preserve(curve_names.iter().map(String::as_str)),
            depth_min,
            depth_max,
            depth_unit,
            notes: vec![format!("Parsed using {}.", cmd)],
        })
    }
}

/// Heuristic tier: decode the raw bytes as windows-1252 (a total
/// single-byte decoding, so arbitrary binary input cannot fail) and
/// scan the text for common well/curve/depth markers.
pub struct HeuristicExtractor;

impl MetadataExtractor for HeuristicExtractor {
    fn extract(&self, path: &Path, file_name: &str, format: LogFormat) -> Result<WellLogSummary> {
        let raw_bytes = std::fs::read(path)
            .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", file_name, e)))?;
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&raw_bytes);

        let well_names = extract_well_names(&text);
        let curve_names = extract_curve_names(&text);
        let (depth_min, depth_max) = extract_depths(&text);

        Ok(WellLogSummary {
            file_name: file_name.to_string(),
            log_format: format,
            // The well-name list is never left empty.
            well_names: if well_names.is_empty() {
                vec!["Not found".to_string()]
            } else {
                well_names
            },
            curve_names,
            depth_min,
            depth_max,
            depth_unit: None,
            notes: vec![
                "Parsed using heuristic text search. Results may be approximate.".to_string(),
            ],
        })
    }
}

/// Fallback chain over the two tiers. Structured failures never reach
/// the caller; they degrade to the heuristic tier with a note.
pub struct LogMetadataService {
    structured: StructuredExtractor,
    heuristic: HeuristicExtractor,
}

impl LogMetadataService {
    pub fn new(parser_cmd: Option<String>) -> Self {
        Self {
            structured: StructuredExtractor::new(parser_cmd),
            heuristic: HeuristicExtractor,
        }
    }

    /// Produce a summary for the uploaded file. `file_name` is the
    /// client-supplied name and decides the format; `path` is where
    /// the bytes were spooled.
    pub fn load_summary(&self, path: &Path, file_name: &str) -> Result<WellLogSummary> {
        let format = LogFormat::from_file_name(file_name).ok_or_else(|| {
            AppError::WellLogError(
                "Unsupported file type. Expected a .lis or .dlis file.".to_string(),
            )
        })?;

        let mut notes: Vec<String> = Vec::new();

        if self.structured.is_configured() {
            match self.structured.extract(path, file_name, format) {
                Ok(mut summary) => {
                    summary.notes.extend(notes);
                    return Ok(summary);
                }
                Err(err) => {
                    warn!(error = %err, file_name, "structured log parse failed");
                    notes.push(format!(
                        "Structured parsing failed ({}). Using heuristic parser instead.",
                        err
                    ));
                }
            }
        } else {
            notes.push(
                "Structured log parser is not configured. Falling back to heuristic text parsing."
                    .to_string(),
            );
        }

        let mut summary = self.heuristic.extract(path, file_name, format)?;
        summary.notes.extend(notes);
        Ok(summary)
    }
}

fn extract_well_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for pattern in WELL_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let candidate = caps[1].trim();
            if !candidate.is_empty() {
                names.push(candidate.to_string());
            }
        }
    }
    unique_preserve(names.iter().map(String::as_str))
}

fn extract_curve_names(text: &str) -> Vec<String> {
    let mut curves = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if lower.contains("curve") || lower.contains("mnemonic") || lower.contains("mnem") {
            for token in CURVE_SPLIT_PATTERN.split(line) {
                if CURVE_TOKEN_PATTERN.is_match(token) {
                    curves.push(token.to_string());
                }
            }
        }
    }
    unique_preserve(curves.iter().map(String::as_str))
}

fn extract_depths(text: &str) -> (Option<f64>, Option<f64>) {
    let depth_min = search_first_float(text, DEPTH_START_PATTERNS.iter());
    let depth_max = search_first_float(text, DEPTH_END_PATTERNS.iter());

    if depth_min.is_none() && depth_max.is_none() {
        // Some files write the range as "DEPTH 1000-3500". The two
        // captures land in min/max as-is, without reordering.
        if let Some(caps) = DEPTH_RANGE_PATTERN.captures(text) {
            return (safe_float(&caps[1]), safe_float(&caps[2]));
        }
    }

    (depth_min, depth_max)
}

fn search_first_float<'a>(
    text: &str,
    patterns: impl Iterator<Item = &'a Regex>,
) -> Option<f64> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            return safe_float(&caps[1]);
        }
    }
    None
}

fn safe_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

/// Dedup case-insensitively, preserving first occurrence; blank items
/// are dropped.
fn unique_preserve<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        let key = item.trim();
        if key.is_empty() {
            continue;
        }
        if seen.insert(key.to_lowercase()) {
            result.push(key.to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn heuristic_service() -> LogMetadataService {
        LogMetadataService::new(None)
    }

    #[test]
    fn test_well_names_dedup_across_patterns() {
        let text = "Well Name: Alpha-1.\nsome header text.\nWell: Alpha-1.\n";
        assert_eq!(extract_well_names(text), vec!["Alpha-1"]);
    }

    #[test]
    fn test_well_names_case_insensitive_dedup_keeps_first() {
        let text = "WELL: FOO-1.\nwell: foo-1.\nWELL: BAR-2.\n";
        assert_eq!(extract_well_names(text), vec!["FOO-1", "BAR-2"]);
    }

    #[test]
    fn test_curve_names_from_mnemonic_lines() {
        let text = "HEADER\nCurve mnemonics: GR, DT, RHOB\nDATA 1 2 3\n";
        assert_eq!(
            extract_curve_names(text),
            vec!["Curve", "mnemonics", "GR", "DT", "RHOB"]
        );
    }

    #[test]
    fn test_curve_tokens_filtered_by_shape() {
        // single letters and overlong tokens are rejected
        let text = "MNEM: X A1234567890123456 GR\n";
        assert_eq!(extract_curve_names(text), vec!["MNEM", "GR"]);
    }

    #[test]
    fn test_explicit_depth_range() {
        let text = "Start Depth: 100.0 ... End Depth: 3500.5";
        assert_eq!(extract_depths(text), (Some(100.0), Some(3500.5)));
    }

    #[test]
    fn test_combined_depth_range_is_not_swapped() {
        let (min, max) = extract_depths("DEPTH 1000-500");
        assert_eq!(min, Some(1000.0));
        assert_eq!(max, Some(500.0));
    }

    #[test]
    fn test_explicit_start_only() {
        let text = "FROM DEPTH 250.5\n";
        assert_eq!(extract_depths(text), (Some(250.5), None));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let file = write_log(b"WELL: A-1");
        let err = heuristic_service()
            .load_summary(file.path(), "well.las")
            .unwrap_err();
        assert!(matches!(err, AppError::WellLogError(_)));
    }

    #[test]
    fn test_heuristic_summary_with_fallback_note() {
        let file = write_log(b"WELL NAME: ALPHA-1.\nCURVE GR DT\nSTART DEPTH: 10.0\nEND DEPTH: 90.0\n");
        let summary = heuristic_service()
            .load_summary(file.path(), "run.lis")
            .unwrap();

        assert_eq!(summary.log_format, LogFormat::Lis);
        assert_eq!(summary.file_name, "run.lis");
        assert_eq!(summary.well_names, vec!["ALPHA-1"]);
        assert_eq!(summary.depth_min, Some(10.0));
        assert_eq!(summary.depth_max, Some(90.0));
        assert_eq!(summary.depth_unit, None);
        assert_eq!(
            summary.notes,
            vec![
                "Parsed using heuristic text search. Results may be approximate.".to_string(),
                "Structured log parser is not configured. Falling back to heuristic text parsing."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_well_names_yield_marker() {
        let file = write_log(b"nothing of interest");
        let summary = heuristic_service()
            .load_summary(file.path(), "empty.dlis")
            .unwrap();
        assert_eq!(summary.well_names, vec!["Not found"]);
        assert!(summary.curve_names.is_empty());
    }

    #[test]
    fn test_binary_bytes_do_not_break_decoding() {
        let mut content = vec![0x00, 0xff, 0x81, 0x9d];
        content.extend_from_slice(b"WELL: DEEP-9.\n");
        content.extend_from_slice(&[0xfe, 0x01]);
        let file = write_log(&content);

        let summary = heuristic_service()
            .load_summary(file.path(), "deep.dlis")
            .unwrap();
        assert_eq!(summary.well_names, vec!["DEEP-9"]);
    }

    #[test]
    fn test_structured_failure_falls_back_with_note() {
        let file = write_log(b"WELL: FALLBACK-1.\n");
        let service = LogMetadataService::new(Some("/nonexistent/well-log-dump".to_string()));

        let summary = service.load_summary(file.path(), "run.lis").unwrap();
        assert_eq!(summary.well_names, vec!["FALLBACK-1"]);
        assert_eq!(summary.notes.len(), 2);
        assert!(summary.notes[0].starts_with("Parsed using heuristic"));
        assert!(summary.notes[1].starts_with("Structured parsing failed"));
    }
}
