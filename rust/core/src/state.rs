// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer state store
//!
//! Holds the four interacting state dimensions of a mounted viewer:
//! selection, visibility (hidden ids plus an optional isolation set),
//! x-ray, and display mode. Transitions only change values here. Nothing in
//! this module talks to a rendering engine; the reconciler derives engine
//! effects from a snapshot of this state.

use crate::element::{ElementId, MetadataIndex};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the model surfaces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Wireframe,
    Solid,
    #[default]
    Shaded,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Wireframe => "wireframe",
            DisplayMode::Solid => "solid",
            DisplayMode::Shaded => "shaded",
        }
    }

    pub fn shows_edges(&self) -> bool {
        matches!(self, DisplayMode::Wireframe)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wireframe" => Ok(DisplayMode::Wireframe),
            "solid" => Ok(DisplayMode::Solid),
            "shaded" => Ok(DisplayMode::Shaded),
            other => Err(format!("unknown display mode: {other}")),
        }
    }
}

/// Everything the UI can change about a mounted viewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    /// Insertion order is click order; the first entry is the primary selection.
    selected: Vec<ElementId>,
    hidden: FxHashSet<ElementId>,
    /// `Some` means isolation is active and `hidden` is not applied.
    isolated: Option<FxHashSet<ElementId>>,
    xray: bool,
    display_mode: DisplayMode,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- selection ------------------------------------------------------

    /// Click-style selection.
    ///
    /// Non-additive replaces the selection with `{id}`. Additive toggles:
    /// an already selected id is removed, a new one is appended.
    pub fn select(&mut self, id: &str, additive: bool) {
        if !additive {
            self.selected.clear();
            self.selected.push(id.to_string());
            return;
        }
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    /// Replace the selection, dropping duplicates and keeping first occurrence order.
    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = FxHashSet::default();
        self.selected.clear();
        for id in ids {
            let id = id.as_ref();
            if seen.insert(id.to_string()) {
                self.selected.push(id.to_string());
            }
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// The element whose properties the UI shows.
    pub fn primary_selection(&self) -> Option<&str> {
        self.selected.first().map(String::as_str)
    }

    // ---- visibility -----------------------------------------------------

    pub fn set_hidden(&mut self, id: &str, hidden: bool) {
        if hidden {
            self.hidden.insert(id.to_string());
        } else {
            self.hidden.remove(id);
        }
    }

    pub fn hide_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.set_hidden(id.as_ref(), true);
        }
    }

    pub fn show_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.set_hidden(id.as_ref(), false);
        }
    }

    /// `None` ends isolation. An empty set is treated as `None`.
    pub fn set_isolation<I, S>(&mut self, ids: Option<I>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.isolated = ids
            .map(|ids| {
                ids.into_iter()
                    .map(|id| id.as_ref().to_string())
                    .collect::<FxHashSet<_>>()
            })
            .filter(|set| !set.is_empty());
    }

    /// Clear hidden ids and isolation.
    pub fn show_all(&mut self) {
        self.hidden.clear();
        self.isolated = None;
    }

    pub fn hidden(&self) -> &FxHashSet<ElementId> {
        &self.hidden
    }

    pub fn isolated(&self) -> Option<&FxHashSet<ElementId>> {
        self.isolated.as_ref()
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    /// Whether `id` should be drawn. Isolation takes precedence over hidden ids.
    pub fn is_visible(&self, id: &str) -> bool {
        match &self.isolated {
            Some(isolated) => isolated.contains(id),
            None => !self.hidden.contains(id),
        }
    }

    // ---- rendering modes ------------------------------------------------

    pub fn set_xray(&mut self, enabled: bool) {
        self.xray = enabled;
    }

    pub fn xray(&self) -> bool {
        self.xray
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    // ---- housekeeping ---------------------------------------------------

    /// Drop ids the metadata index does not know. Returns the dropped ids.
    pub fn retain_known(&mut self, index: &MetadataIndex) -> Vec<ElementId> {
        let mut dropped = Vec::new();
        self.selected.retain(|id| {
            let known = index.contains(id);
            if !known {
                dropped.push(id.clone());
            }
            known
        });
        dropped
    }

    /// Serializable view for the UI.
    pub fn snapshot(&self) -> StateSnapshot {
        let mut hidden: Vec<ElementId> = self.hidden.iter().cloned().collect();
        hidden.sort_unstable();
        let isolated = self.isolated.as_ref().map(|set| {
            let mut ids: Vec<ElementId> = set.iter().cloned().collect();
            ids.sort_unstable();
            ids
        });
        StateSnapshot {
            selected_ids: self.selected.clone(),
            hidden_ids: hidden,
            isolated_ids: isolated,
            xray: self.xray,
            display_mode: self.display_mode,
        }
    }
}

/// Plain-data copy of a [`ViewerState`], sorted where order carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub selected_ids: Vec<ElementId>,
    pub hidden_ids: Vec<ElementId>,
    pub isolated_ids: Option<Vec<ElementId>>,
    pub xray: bool,
    pub display_mode: DisplayMode,
}
