// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Narrow interface to a loaded scene in an external rendering engine.
//!
//! One method per effect. Implementations hide how the effect is applied on
//! their engine build (usually through a [`StrategyChain`](crate::StrategyChain))
//! and report `Error::CapabilityUnavailable` when nothing worked.

use bimview_core::{Color, Result};
use std::fmt::Debug;
use std::hash::Hash;

/// A loaded model inside a rendering engine.
///
/// Handles are owned by the engine and only valid while this model is loaded.
/// The synchronization engine discovers and mutates them; it never creates or
/// destroys them.
pub trait SceneAdapter {
    type Handle: Clone + Eq + Hash + Debug;

    /// Keys of every live object in the scene (`{model}#{element}` or bare ids).
    fn object_keys(&self) -> Vec<String>;

    /// Handles registered under exactly `key`. Several primitives may share a key.
    fn lookup(&self, key: &str) -> Vec<Self::Handle>;

    /// Every live object handle of the loaded model.
    fn all_handles(&self) -> Vec<Self::Handle> {
        self.object_keys()
            .iter()
            .flat_map(|key| self.lookup(key))
            .collect()
    }

    fn set_visible(&mut self, handle: &Self::Handle, visible: bool) -> Result<()>;

    /// Current override color, `None` when the object shows its base material.
    fn read_color(&self, handle: &Self::Handle) -> Result<Option<Color>>;

    fn write_color(&mut self, handle: &Self::Handle, color: Color) -> Result<()>;

    /// Drop any color override so the base material shows again.
    fn reset_color(&mut self, handle: &Self::Handle) -> Result<()>;

    /// Engine-native selection flag.
    fn set_selected(&mut self, handle: &Self::Handle, selected: bool) -> Result<()>;

    fn set_xrayed(&mut self, handle: &Self::Handle, xrayed: bool) -> Result<()>;

    fn set_edges(&mut self, handle: &Self::Handle, edges: bool) -> Result<()>;

    /// Move the camera so the whole model is in view.
    fn fit_to_view(&mut self) -> Result<()>;
}
