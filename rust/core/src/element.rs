// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element metadata index
//!
//! The converter emits one `metadata.json` per model next to the scene asset:
//!
//! ```json
//! {
//!   "file_upload_id": "…",
//!   "model_name": "Tower",
//!   "elements": {
//!     "2O2Fr$t4X7Zf8NOew3FLOH": {
//!       "category": "IfcWall",
//!       "family": "",
//!       "type": "Basic Wall:Generic 200",
//!       "name": "Wall-001",
//!       "parameters": { "Width": "200" }
//!     }
//!   }
//! }
//! ```
//!
//! The viewer treats this document as read-only. Element ids are the stable
//! identity used by every state operation.

use crate::error::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable domain element identifier (IFC GlobalId or Revit UniqueId).
pub type ElementId = String;

/// One element of the metadata index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Filled in from the map key when the index is loaded.
    #[serde(default, skip_serializing)]
    pub id: ElementId,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub family: String,
    #[serde(default, rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Id in the authoring tool, when the converter could recover it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
}

impl Element {
    /// Display label: name, else type, else category.
    pub fn label(&self) -> &str {
        [&self.name, &self.type_name, &self.category]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or(self.id.as_str())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(default)]
    file_upload_id: String,
    #[serde(default)]
    model_name: String,
    #[serde(default)]
    elements: FxHashMap<ElementId, Element>,
}

/// Parsed `metadata.json`.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    pub file_upload_id: String,
    pub model_name: String,
    elements: FxHashMap<ElementId, Element>,
}

impl MetadataIndex {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawIndex = serde_json::from_str(json)?;
        Ok(Self::from_parts(raw.file_upload_id, raw.model_name, raw.elements))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawIndex = serde_json::from_value(value)?;
        Ok(Self::from_parts(raw.file_upload_id, raw.model_name, raw.elements))
    }

    fn from_parts(
        file_upload_id: String,
        model_name: String,
        mut elements: FxHashMap<ElementId, Element>,
    ) -> Self {
        for (id, element) in elements.iter_mut() {
            element.id = id.clone();
        }
        Self {
            file_upload_id,
            model_name,
            elements,
        }
    }

    /// Build an index from elements directly (ids taken from `Element::id`).
    pub fn from_elements(model_name: &str, elements: impl IntoIterator<Item = Element>) -> Self {
        Self {
            file_upload_id: String::new(),
            model_name: model_name.to_string(),
            elements: elements.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All element ids, sorted.
    pub fn element_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.elements.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of every element of `category`, sorted.
    pub fn by_category(&self, category: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .elements
            .values()
            .filter(|e| e.category == category)
            .map(|e| e.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
