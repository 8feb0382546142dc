// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolver: element id → live engine handles.
//!
//! Object keys are tried in a fixed order:
//!
//! 1. `{model_id}#{element_id}`
//! 2. `{element_id}` (engines that do not namespace by model)
//! 3. any key ending in `#{element_id}` (model id differs from ours)
//!
//! The first scheme that yields anything wins, and everything it yields is
//! returned. Bindings are rebuilt on every call; handles do not outlive a
//! loaded model.

use crate::adapter::SceneAdapter;
use bimview_core::{ElementId, Error};
use rustc_hash::{FxHashMap, FxHashSet};

/// Which key scheme produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    Composite,
    Bare,
    Suffix,
}

/// Handles resolved for a batch of ids.
#[derive(Debug, Clone)]
pub struct Resolution<H> {
    pub handles: Vec<H>,
    /// Ids with no live object. Not an error: geometry may not have survived conversion.
    pub missed: Vec<ElementId>,
}

impl<H> Default for Resolution<H> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
            missed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    model_id: String,
}

impl Resolver {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn composite_key(&self, element_id: &str) -> String {
        format!("{}#{}", self.model_id, element_id)
    }

    /// All handles for `element_id`, or an empty list.
    pub fn resolve<A: SceneAdapter>(&self, adapter: &A, element_id: &str) -> Vec<A::Handle> {
        self.resolve_with_scheme(adapter, element_id)
            .map(|(handles, _)| handles)
            .unwrap_or_default()
    }

    /// Like [`resolve`](Self::resolve), also naming the scheme that matched.
    pub fn resolve_with_scheme<A: SceneAdapter>(
        &self,
        adapter: &A,
        element_id: &str,
    ) -> Option<(Vec<A::Handle>, KeyScheme)> {
        let composite = adapter.lookup(&self.composite_key(element_id));
        if !composite.is_empty() {
            return Some((composite, KeyScheme::Composite));
        }

        let bare = adapter.lookup(element_id);
        if !bare.is_empty() {
            return Some((bare, KeyScheme::Bare));
        }

        let suffix = format!("#{}", element_id);
        let handles: Vec<A::Handle> = adapter
            .object_keys()
            .iter()
            .filter(|key| key.ends_with(&suffix))
            .flat_map(|key| adapter.lookup(key))
            .collect();
        if handles.is_empty() {
            None
        } else {
            Some((handles, KeyScheme::Suffix))
        }
    }

    /// Resolve a batch. Handles are de-duplicated; misses are collected, not raised.
    ///
    /// The suffix index is built at most once per batch, on the first id that
    /// needs it.
    pub fn resolve_all<A, I, S>(&self, adapter: &A, ids: I) -> Resolution<A::Handle>
    where
        A: SceneAdapter,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Resolution::default();
        let mut seen: FxHashSet<A::Handle> = FxHashSet::default();
        let mut suffix_index: Option<FxHashMap<String, Vec<String>>> = None;

        for id in ids {
            let id = id.as_ref();
            let mut found = adapter.lookup(&self.composite_key(id));
            if found.is_empty() {
                found = adapter.lookup(id);
            }
            if found.is_empty() && id.contains('#') {
                // the suffix index splits on the last '#', so scan instead
                found = self.resolve(adapter, id);
            } else if found.is_empty() {
                let index = suffix_index.get_or_insert_with(|| build_suffix_index(adapter));
                if let Some(keys) = index.get(id) {
                    found = keys.iter().flat_map(|key| adapter.lookup(key)).collect();
                }
            }

            if found.is_empty() {
                let miss = Error::ResolutionMiss {
                    model_id: self.model_id.clone(),
                    element_id: id.to_string(),
                };
                tracing::debug!(error = %miss, "skipping element");
                out.missed.push(id.to_string());
                continue;
            }
            for handle in found {
                if seen.insert(handle.clone()) {
                    out.handles.push(handle);
                }
            }
        }
        out
    }

    /// Map a picked object key back to an element id.
    pub fn element_id_of<'k>(&self, key: &'k str) -> &'k str {
        if let Some(rest) = key
            .strip_prefix(self.model_id.as_str())
            .and_then(|rest| rest.strip_prefix('#'))
            .filter(|rest| !rest.is_empty())
        {
            return rest;
        }
        match key.rsplit_once('#') {
            Some((_, id)) if !id.is_empty() => id,
            _ => key,
        }
    }
}

/// Element id (text after the last `#`) → namespaced keys carrying it.
fn build_suffix_index<A: SceneAdapter>(adapter: &A) -> FxHashMap<String, Vec<String>> {
    let mut index: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for key in adapter.object_keys() {
        if let Some((_, id)) = key.rsplit_once('#') {
            if !id.is_empty() {
                index.entry(id.to_string()).or_default().push(key.clone());
            }
        }
    }
    index
}
