// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Saved element groups (named sets of element ids a user can isolate or select).

use crate::element::{ElementId, MetadataIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub element_ids: Vec<ElementId>,
}

impl ElementGroup {
    /// Split members into ids the index knows and ids it does not.
    pub fn partition_known<'a>(&'a self, index: &MetadataIndex) -> (Vec<&'a str>, Vec<&'a str>) {
        self.element_ids
            .iter()
            .map(String::as_str)
            .partition(|id| index.contains(id))
    }
}
