// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Appearance ledger: the color each object had before we overrode it.
//!
//! A record is written the first time an object is overridden during a
//! selection episode and removed once the original has been written back.
//! Reserved override colors (the selection highlight, the wireframe tint) are
//! never stored as an original; reading one back means some override of ours
//! is still active, so the record becomes [`Original::NoOverride`].

use crate::adapter::SceneAdapter;
use bimview_core::Color;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// What to write back when an override ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Original {
    /// The object carried this override color before us.
    Color(Color),
    /// No override was active; restore by resetting to the base material.
    NoOverride,
}

#[derive(Debug)]
pub struct AppearanceLedger<H> {
    records: FxHashMap<H, Original>,
    reserved: Vec<Color>,
    tolerance: f32,
}

impl<H: Clone + Eq + Hash + std::fmt::Debug> AppearanceLedger<H> {
    /// `highlight` is always reserved; add more with [`reserve`](Self::reserve).
    pub fn new(highlight: Color, tolerance: f32) -> Self {
        Self {
            records: FxHashMap::default(),
            reserved: vec![highlight],
            tolerance,
        }
    }

    pub fn reserve(mut self, color: Color) -> Self {
        self.reserved.push(color);
        self
    }

    fn is_reserved(&self, color: &Color) -> bool {
        self.reserved
            .iter()
            .any(|reserved| reserved.approx_eq(color, self.tolerance))
    }

    /// Record the current color of `handle` unless a record already exists.
    ///
    /// Returns `true` when a new record was written. An unreadable color is
    /// recorded as [`Original::NoOverride`].
    pub fn capture<A>(&mut self, adapter: &A, handle: &H) -> bool
    where
        A: SceneAdapter<Handle = H>,
    {
        if self.records.contains_key(handle) {
            return false;
        }
        let original = self.read_original(adapter, handle);
        self.records.insert(handle.clone(), original);
        true
    }

    /// What the current color of `handle` would be recorded as.
    pub fn read_original<A>(&self, adapter: &A, handle: &H) -> Original
    where
        A: SceneAdapter<Handle = H>,
    {
        match adapter.read_color(handle) {
            Ok(Some(color)) if self.is_reserved(&color) => {
                tracing::debug!(?handle, "current color is an active override; recording none");
                Original::NoOverride
            }
            Ok(Some(color)) => Original::Color(color),
            Ok(None) => Original::NoOverride,
            Err(err) => {
                tracing::warn!(?handle, error = %err, "cannot read object color");
                Original::NoOverride
            }
        }
    }

    /// Store an original obtained elsewhere, unless a record already exists.
    pub fn record(&mut self, handle: H, original: Original) -> bool {
        if self.records.contains_key(&handle) {
            return false;
        }
        self.records.insert(handle, original);
        true
    }

    /// The stored original. The record stays until [`clear`](Self::clear).
    pub fn consume_original(&self, handle: &H) -> Option<Original> {
        self.records.get(handle).copied()
    }

    pub fn clear(&mut self, handle: &H) {
        self.records.remove(handle);
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.records.contains_key(handle)
    }

    pub fn handles(&self) -> Vec<H> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
