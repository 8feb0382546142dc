// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operation table handed to the UI once a model is loaded.
//!
//! Each operation updates the [`ViewerState`] and runs the matching
//! reconciliation routine. Before a scene is attached every operation is a
//! no-op. None of them return errors: engine problems are logged and retried
//! on the next reconciliation.

use crate::adapter::SceneAdapter;
use crate::input::{ModifierTracker, Modifiers, PickEvent, PickIntent};
use crate::reconciler::{ReconcileReport, Reconciler};
use bimview_core::{
    DisplayMode, Element, ElementGroup, MetadataIndex, StateSnapshot, ViewerConfig, ViewerState,
};

pub struct Viewer<A: SceneAdapter> {
    config: ViewerConfig,
    state: ViewerState,
    metadata: Option<MetadataIndex>,
    reconciler: Option<Reconciler<A>>,
    input: ModifierTracker,
}

impl<A: SceneAdapter> Viewer<A> {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            state: ViewerState::new(),
            metadata: None,
            reconciler: None,
            input: ModifierTracker::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Attach a loaded scene and bring it in line with the current state.
    pub fn attach(&mut self, adapter: A) -> ReconcileReport {
        let mut reconciler = Reconciler::new(adapter, &self.config);
        let report = reconciler.reconcile(&self.state);
        tracing::info!(
            model_id = %self.config.model_id,
            objects = report.resolved,
            "scene attached"
        );
        self.reconciler = Some(reconciler);
        report
    }

    /// Drop the scene. No handle is used after this.
    pub fn detach(&mut self) -> Option<A> {
        self.reconciler.take().map(Reconciler::into_adapter)
    }

    pub fn is_ready(&self) -> bool {
        self.reconciler.is_some()
    }

    pub fn set_metadata(&mut self, index: MetadataIndex) {
        self.metadata = Some(index);
    }

    pub fn metadata(&self) -> Option<&MetadataIndex> {
        self.metadata.as_ref()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn reconciler(&self) -> Option<&Reconciler<A>> {
        self.reconciler.as_ref()
    }

    /// Metadata of the first selected element.
    pub fn primary_selection(&self) -> Option<&Element> {
        let id = self.state.primary_selection()?;
        self.metadata.as_ref()?.get(id)
    }

    fn ready(&mut self, operation: &'static str) -> Option<&mut Reconciler<A>> {
        if self.reconciler.is_none() {
            tracing::debug!(operation, "viewer not ready, ignoring");
        }
        self.reconciler.as_mut()
    }

    fn drop_unknown_selection(&mut self) {
        if !self.config.enforce_known_ids {
            return;
        }
        if let Some(index) = &self.metadata {
            let dropped = self.state.retain_known(index);
            if !dropped.is_empty() {
                tracing::debug!(?dropped, "ignoring ids missing from metadata");
            }
        }
    }

    // ---- selection ------------------------------------------------------

    pub fn select_elements<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.ready("selectElements").is_none() {
            return;
        }
        self.state.set_selection(ids);
        self.sync_selection();
    }

    /// Single click-style selection; `additive` toggles membership.
    pub fn select(&mut self, id: &str, additive: bool) {
        if self.ready("select").is_none() {
            return;
        }
        self.state.select(id, additive);
        self.sync_selection();
    }

    pub fn deselect_all(&mut self) {
        if self.ready("deselectAll").is_none() {
            return;
        }
        self.state.deselect_all();
        self.sync_selection();
    }

    pub fn select_group(&mut self, group: &ElementGroup) {
        self.select_elements(&group.element_ids);
    }

    fn sync_selection(&mut self) {
        self.drop_unknown_selection();
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.apply_selection(&self.state);
        }
    }

    // ---- visibility -----------------------------------------------------

    pub fn hide_elements<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.ready("hideElements").is_none() {
            return;
        }
        self.state.hide_many(ids);
        self.sync_visibility();
    }

    pub fn show_elements<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.ready("showElements").is_none() {
            return;
        }
        self.state.show_many(ids);
        self.sync_visibility();
    }

    /// `None` ends isolation and hidden ids apply again.
    pub fn isolate_elements<I, S>(&mut self, ids: Option<I>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.ready("isolateElements").is_none() {
            return;
        }
        self.state.set_isolation(ids);
        self.sync_visibility();
    }

    pub fn isolate_group(&mut self, group: &ElementGroup) {
        self.isolate_elements(Some(&group.element_ids));
    }

    pub fn show_all(&mut self) {
        if self.ready("showAll").is_none() {
            return;
        }
        self.state.show_all();
        self.sync_visibility();
    }

    fn sync_visibility(&mut self) {
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.apply_visibility(&self.state);
        }
    }

    // ---- rendering modes ------------------------------------------------

    pub fn set_xray_mode(&mut self, enabled: bool) {
        if self.ready("setXrayMode").is_none() {
            return;
        }
        self.state.set_xray(enabled);
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.apply_xray(&self.state);
        }
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.ready("setDisplayMode").is_none() {
            return;
        }
        self.state.set_display_mode(mode);
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.apply_display_mode(&self.state);
        }
    }

    pub fn fit_to_view(&mut self) {
        if let Some(reconciler) = self.ready("fitToView") {
            reconciler.fit_to_view();
        }
    }

    /// Re-run every routine against the current state.
    pub fn refresh(&mut self) -> Option<ReconcileReport> {
        let reconciler = self.reconciler.as_mut()?;
        Some(reconciler.reconcile(&self.state))
    }

    // ---- input ----------------------------------------------------------

    pub fn key_down(&mut self, key: &str) {
        self.input.key_down(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn mouse_down(&mut self, modifiers: Modifiers) {
        self.input.mouse_down(modifiers);
    }

    /// Selection entry point for engine pick events.
    pub fn handle_pick(&mut self, event: &PickEvent) {
        if self.ready("pick").is_none() {
            return;
        }
        match self.input.interpret(event) {
            PickIntent::Select { key, additive } => {
                let id = match &self.reconciler {
                    Some(reconciler) => reconciler.resolver().element_id_of(&key).to_string(),
                    None => return,
                };
                self.select(&id, additive);
            }
            PickIntent::DeselectAll => self.deselect_all(),
            PickIntent::Keep => {}
        }
    }
}
