// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion status reported by the backend for an uploaded model.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionStatus::Pending => "pending",
            ConversionStatus::Processing => "processing",
            ConversionStatus::Completed => "completed",
            ConversionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Body of the viewer status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerStatus {
    #[serde(default)]
    pub xkt_conversion_status: Option<ConversionStatus>,
    #[serde(default)]
    pub xkt_file_path: Option<String>,
    #[serde(default)]
    pub metadata_file_path: Option<String>,
    #[serde(default)]
    pub has_xkt: bool,
    #[serde(default)]
    pub has_metadata: bool,
}

impl ViewerStatus {
    /// Conversion finished and both the scene asset and metadata exist.
    pub fn is_viewable(&self) -> bool {
        self.xkt_conversion_status == Some(ConversionStatus::Completed)
            && self.has_xkt
            && self.has_metadata
    }

    /// Status label for error messages.
    pub fn describe(&self) -> String {
        match self.xkt_conversion_status {
            Some(status) if status == ConversionStatus::Completed && !self.has_xkt => {
                "completed without scene asset".to_string()
            }
            Some(status) if status == ConversionStatus::Completed && !self.has_metadata => {
                "completed without metadata".to_string()
            }
            Some(status) => status.to_string(),
            None => "not started".to_string(),
        }
    }
}
