//! Report file types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Request handed to the reporter backend to generate a file
///
/// Built by a handler and consumed once; the gateway never stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFileRequest {
    /// Kind of report (royalty, vat, transactions, ...)
    pub report_type: String,

    /// Output format (pdf, csv, xlsx)
    pub file_type: String,

    /// Merchant the report is about
    #[serde(default)]
    pub merchant_id: String,

    /// Report-specific parameters
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,

    /// User who asked for the report
    #[serde(default)]
    pub user_id: String,

    /// Channel notified once the file is ready
    #[serde(default)]
    pub notification_channel_id: String,

    /// Skip reporter post-processing (set for profile-scoped channels)
    #[serde(default)]
    pub skip_post_process: bool,
}

/// Backend-assigned file identifier usable as a local file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Accept an identifier that cannot escape its directory
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();

        if raw.is_empty() || raw == "." || raw == ".." {
            return Err(CoreError::InvalidFileName(raw));
        }

        if raw.contains(['/', '\\', '\0']) {
            return Err(CoreError::InvalidFileName(raw));
        }

        Ok(Self(raw))
    }

    /// Borrow the file name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        self.0
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
