use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Recognized well-log container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogFormat {
    Lis,
    Dlis,
}

impl LogFormat {
    /// Map a file name's extension to a format. `None` for anything
    /// other than `.lis` / `.dlis` (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<LogFormat> {
        let ext = Path::new(file_name).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "lis" => Some(LogFormat::Lis),
            "dlis" => Some(LogFormat::Dlis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Lis => "LIS",
            LogFormat::Dlis => "DLIS",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort metadata extracted from a LIS/DLIS file. Transient:
/// returned to the caller, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct WellLogSummary {
    pub file_name: String,
    #[serde(rename = "format")]
    pub log_format: LogFormat,
    /// Distinct well names, case-insensitive dedup, first-seen order.
    pub well_names: Vec<String>,
    /// Distinct curve (measurement channel) names, same dedup rule.
    pub curve_names: Vec<String>,
    pub depth_min: Option<f64>,
    pub depth_max: Option<f64>,
    pub depth_unit: Option<String>,
    /// Human-readable notes on how extraction was performed or where
    /// it degraded.
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(LogFormat::from_file_name("run1.lis"), Some(LogFormat::Lis));
        assert_eq!(
            LogFormat::from_file_name("RUN2.DLIS"),
            Some(LogFormat::Dlis)
        );
        assert_eq!(LogFormat::from_file_name("well.xlsx"), None);
        assert_eq!(LogFormat::from_file_name("noext"), None);
    }

    #[test]
    fn test_format_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&LogFormat::Lis).unwrap(),
            "\"LIS\""
        );
        assert_eq!(
            serde_json::to_string(&LogFormat::Dlis).unwrap(),
            "\"DLIS\""
        );
    }
}
