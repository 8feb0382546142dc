// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pick events and modifier tracking.
//!
//! Not every engine build puts modifier state on its picked event, so the
//! tracker also follows key-down/key-up and mouse-down. The payload wins when
//! it carries modifiers; otherwise the tracked state decides. If focus leaves
//! the canvas while a key is held, the tracked state stays held until the
//! key-up arrives.

use serde::{Deserialize, Serialize};

/// Modifier keys that make a pick additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Engine "picked" event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickEvent {
    /// Key of the clicked object, `None` for empty space.
    pub object_key: Option<String>,
    /// Modifiers reported by the engine, if this build reports them.
    pub modifiers: Option<Modifiers>,
}

impl PickEvent {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            object_key: Some(key.into()),
            modifiers: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }
}

/// What a pick asks the state store to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickIntent {
    Select { key: String, additive: bool },
    DeselectAll,
    /// Additive click on empty space: keep the selection.
    Keep,
}

/// Out-of-band modifier state.
#[derive(Debug, Clone, Default)]
pub struct ModifierTracker {
    held: Modifiers,
    at_mouse_down: Option<Modifiers>,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` is a DOM `KeyboardEvent.key` value.
    pub fn key_down(&mut self, key: &str) {
        self.set_key(key, true);
    }

    pub fn key_up(&mut self, key: &str) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: &str, down: bool) {
        match key {
            "Shift" => self.held.shift = down,
            "Control" => self.held.ctrl = down,
            "Meta" | "OS" => self.held.meta = down,
            _ => {}
        }
    }

    /// Snapshot from the mouse-down that starts a click.
    pub fn mouse_down(&mut self, modifiers: Modifiers) {
        self.at_mouse_down = Some(modifiers);
    }

    pub fn held(&self) -> Modifiers {
        self.held
    }

    /// Whether the pick should extend the selection.
    pub fn is_additive(&self, event: &PickEvent) -> bool {
        if let Some(modifiers) = event.modifiers {
            if modifiers.any() {
                return true;
            }
        }
        self.held.any() || self.at_mouse_down.map(|m| m.any()).unwrap_or(false)
    }

    /// Turn a pick into a store intent. Consumes the mouse-down snapshot.
    pub fn interpret(&mut self, event: &PickEvent) -> PickIntent {
        let additive = self.is_additive(event);
        self.at_mouse_down = None;
        match &event.object_key {
            Some(key) => PickIntent::Select {
                key: key.clone(),
                additive,
            },
            None if additive => PickIntent::Keep,
            None => PickIntent::DeselectAll,
        }
    }
}
