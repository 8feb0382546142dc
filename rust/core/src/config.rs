// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration.
//!
//! Every field has a default, so the browser may pass a partial options
//! object (camelCase keys) or nothing at all.

use crate::color::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Model id used to namespace object keys (`{model_id}#{element_id}`).
    pub model_id: String,
    /// Selection highlight. Never recorded as an object's original color.
    pub highlight_color: Color,
    /// Tint applied to non-selected objects in wireframe mode.
    pub neutral_tint: Color,
    /// Per-channel tolerance when comparing colors read back from the engine.
    pub color_tolerance: f32,
    /// Delay between scene readiness polls.
    pub scene_poll_interval_ms: u32,
    /// Scene readiness polls before giving up.
    pub scene_poll_attempts: u32,
    /// Frames to wait for a zero-sized canvas before proceeding anyway.
    pub canvas_retry_frames: u32,
    /// Drop selected ids that the metadata index does not contain.
    pub enforce_known_ids: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_id: "model".into(),
            highlight_color: Color::HIGHLIGHT,
            neutral_tint: Color::NEUTRAL,
            color_tolerance: 1e-3,
            scene_poll_interval_ms: 100,
            scene_poll_attempts: 50,
            canvas_retry_frames: 1,
            enforce_known_ids: true,
        }
    }
}

impl ViewerConfig {
    pub fn with_model_id(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Self::default()
        }
    }

    /// Upper bound on time spent polling for the scene.
    pub fn scene_poll_budget_ms(&self) -> u64 {
        self.scene_poll_interval_ms as u64 * self.scene_poll_attempts as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"modelId": "m1", "scenePollAttempts": 5}"#).unwrap();
        assert_eq!(config.model_id, "m1");
        assert_eq!(config.scene_poll_attempts, 5);
        assert_eq!(config.scene_poll_interval_ms, 100);
        assert_eq!(config.highlight_color, Color::HIGHLIGHT);
        assert_eq!(config.scene_poll_budget_ms(), 500);
    }

    #[test]
    fn test_color_option_as_array() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"highlightColor": [0.0, 1.0, 0.0]}"#).unwrap();
        assert_eq!(config.highlight_color, Color::new(0.0, 1.0, 0.0));
    }
}
