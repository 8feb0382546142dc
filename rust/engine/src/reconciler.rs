// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciler: drives a loaded scene toward a [`ViewerState`].
//!
//! Every routine re-derives the full desired effect from the state it is
//! given, so running one twice, or running several out of order, converges on
//! the same scene. Color and visibility are not independent inside the
//! engine (hiding, isolating, x-ray and mode switches can all evict the
//! selection tint), so [`Reconciler::reconcile`] applies them in a fixed
//! order and the selection tint always goes last.
//!
//! Engine failures never abort a routine: misses and missing capabilities
//! are logged, counted in the [`ReconcileReport`], and retried on the next pass.

use crate::adapter::SceneAdapter;
use crate::ledger::{AppearanceLedger, Original};
use crate::resolver::Resolver;
use bimview_core::{Color, DisplayMode, ElementId, Result, ViewerConfig, ViewerState};
use rustc_hash::{FxHashMap, FxHashSet};

/// Outcome of one reconciliation routine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Handles the routine touched.
    pub resolved: usize,
    /// Ids that had no live object.
    pub missed: Vec<ElementId>,
    /// Engine calls that could not be applied.
    pub failed: usize,
}

impl ReconcileReport {
    fn merge(&mut self, other: ReconcileReport) {
        self.resolved += other.resolved;
        self.failed += other.failed;
        for id in other.missed {
            if !self.missed.contains(&id) {
                self.missed.push(id);
            }
        }
    }

    /// Nothing failed and nothing was missing.
    pub fn is_clean(&self) -> bool {
        self.missed.is_empty() && self.failed == 0
    }
}

pub struct Reconciler<A: SceneAdapter> {
    adapter: A,
    resolver: Resolver,
    ledger: AppearanceLedger<A::Handle>,
    highlight: Color,
    neutral: Color,
    /// Ids highlighted by the last selection pass.
    applied_selection: Vec<ElementId>,
    /// Handles carrying the wireframe tint, with the color it covers.
    tinted: FxHashMap<A::Handle, Original>,
}

impl<A: SceneAdapter> Reconciler<A> {
    pub fn new(adapter: A, config: &ViewerConfig) -> Self {
        Self {
            adapter,
            resolver: Resolver::new(config.model_id.clone()),
            ledger: AppearanceLedger::new(config.highlight_color, config.color_tolerance)
                .reserve(config.neutral_tint),
            highlight: config.highlight_color,
            neutral: config.neutral_tint,
            applied_selection: Vec::new(),
            tinted: FxHashMap::default(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &AppearanceLedger<A::Handle> {
        &self.ledger
    }

    /// Give the adapter back, e.g. for teardown.
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Apply every dimension in the fixed order, selection tint last.
    pub fn reconcile(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = self.apply_visibility(state);
        report.merge(self.apply_xray(state));
        report.merge(self.apply_display_mode(state));
        report.merge(self.apply_selection(state));
        report
    }

    /// Restore the previous selection, then highlight the current one.
    pub fn apply_selection(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let wireframe = state.display_mode() == DisplayMode::Wireframe;

        let next = self.resolver.resolve_all(&self.adapter, state.selected());
        let next_set: FxHashSet<A::Handle> = next.handles.iter().cloned().collect();

        // Everything previously highlighted: the last selection plus any
        // handle a reassertion captured since.
        let previous = self
            .resolver
            .resolve_all(&self.adapter, &self.applied_selection);
        let mut to_restore = previous.handles;
        for handle in self.ledger.handles() {
            if !to_restore.contains(&handle) {
                to_restore.push(handle);
            }
        }

        for handle in &to_restore {
            report.failed += check(self.adapter.set_selected(handle, false), "selected");
            let original = match self.restore(handle) {
                Ok(original) => original,
                Err(err) => {
                    // record kept so the next pass retries
                    tracing::warn!(?handle, error = %err, "could not restore original color");
                    report.failed += 1;
                    continue;
                }
            };
            if wireframe && !next_set.contains(handle) {
                report.failed += self.tint_over(handle, original);
            }
        }

        for handle in &next.handles {
            report.failed += self.highlight(handle);
        }

        report.resolved = next.handles.len();
        report.missed = next.missed;
        self.applied_selection = state.selected().to_vec();

        tracing::debug!(
            selected = state.selected().len(),
            resolved = report.resolved,
            restored = to_restore.len(),
            ledger = self.ledger.len(),
            "selection applied"
        );
        report
    }

    /// Hidden ids, or the isolation set when one is active.
    pub fn apply_visibility(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let all = self.adapter.all_handles();

        let (shown_or_hidden, isolating) = match state.isolated() {
            Some(isolated) => (self.resolver.resolve_all(&self.adapter, isolated), true),
            None => (self.resolver.resolve_all(&self.adapter, state.hidden()), false),
        };
        let members: FxHashSet<A::Handle> = shown_or_hidden.handles.into_iter().collect();

        for handle in &all {
            // isolation shows members; otherwise members are the hidden ones
            let visible = members.contains(handle) == isolating;
            report.failed += check(self.adapter.set_visible(handle, visible), "visible");
        }

        report.resolved = all.len();
        report.missed = shown_or_hidden.missed;
        report.merge(self.reassert_selection(state));

        tracing::debug!(
            objects = all.len(),
            isolating,
            members = members.len(),
            failed = report.failed,
            "visibility applied"
        );
        report
    }

    pub fn apply_xray(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let all = self.adapter.all_handles();
        for handle in &all {
            report.failed += check(self.adapter.set_xrayed(handle, state.xray()), "xray");
        }
        report.resolved = all.len();
        if !state.xray() {
            report.merge(self.reassert_selection(state));
        }
        report
    }

    /// Edges and neutral tint for wireframe; plain surfaces otherwise.
    pub fn apply_display_mode(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mode = state.display_mode();
        let all = self.adapter.all_handles();
        let selected = self.resolver.resolve_all(&self.adapter, state.selected());
        let selected: FxHashSet<A::Handle> = selected.handles.into_iter().collect();

        for handle in &all {
            report.failed += check(self.adapter.set_edges(handle, mode.shows_edges()), "edges");
        }

        if mode == DisplayMode::Wireframe {
            for handle in all.iter().filter(|h| !selected.contains(*h)) {
                report.failed += self.tint(handle);
            }
        } else {
            let tinted: Vec<(A::Handle, Original)> = self.tinted.drain().collect();
            for (handle, original) in tinted {
                if selected.contains(&handle) {
                    self.ledger.record(handle, original);
                    continue;
                }
                let result = match original {
                    Original::Color(color) => self.adapter.write_color(&handle, color),
                    Original::NoOverride => self.adapter.reset_color(&handle),
                };
                if check(result, "untint") > 0 {
                    report.failed += 1;
                    self.tinted.insert(handle, original);
                }
            }
        }

        report.resolved = all.len();
        report.merge(self.reassert_selection(state));
        tracing::debug!(mode = %mode, objects = all.len(), "display mode applied");
        report
    }

    pub fn fit_to_view(&mut self) {
        if let Err(err) = self.adapter.fit_to_view() {
            tracing::warn!(error = %err, "fit to view failed");
        }
    }

    /// Put the highlight back on every selected object.
    fn reassert_selection(&mut self, state: &ViewerState) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let selected = self.resolver.resolve_all(&self.adapter, state.selected());
        for handle in &selected.handles {
            report.failed += self.highlight(handle);
        }
        report.resolved = selected.handles.len();
        report.missed = selected.missed;
        report
    }

    /// Capture the original, then paint and flag as selected. Returns failures.
    fn highlight(&mut self, handle: &A::Handle) -> usize {
        match self.tinted.remove(handle) {
            Some(original) => {
                self.ledger.record(handle.clone(), original);
            }
            None => {
                self.ledger.capture(&self.adapter, handle);
            }
        }
        check(self.adapter.write_color(handle, self.highlight), "colorize")
            + check(self.adapter.set_selected(handle, true), "selected")
    }

    fn tint(&mut self, handle: &A::Handle) -> usize {
        let original = match self.tinted.get(handle) {
            Some(original) => *original,
            None => self.ledger.read_original(&self.adapter, handle),
        };
        self.tint_over(handle, original)
    }

    /// Paint the neutral tint over `original`, keeping the first original seen.
    fn tint_over(&mut self, handle: &A::Handle, original: Original) -> usize {
        let failed = check(self.adapter.write_color(handle, self.neutral), "tint");
        if failed == 0 {
            self.tinted.entry(handle.clone()).or_insert(original);
        }
        failed
    }

    /// Write back the recorded original and drop the record once accepted.
    /// Returns what was written back.
    fn restore(&mut self, handle: &A::Handle) -> Result<Original> {
        let Some(original) = self.ledger.consume_original(handle) else {
            self.adapter.reset_color(handle)?;
            return Ok(Original::NoOverride);
        };
        match original {
            Original::Color(color) => self.adapter.write_color(handle, color)?,
            Original::NoOverride => self.adapter.reset_color(handle)?,
        }
        self.ledger.clear(handle);
        Ok(original)
    }
}

/// Log a failed effect and count it.
fn check(result: Result<()>, effect: &'static str) -> usize {
    match result {
        Ok(()) => 0,
        Err(err) => {
            tracing::warn!(effect, error = %err, "engine effect not applied");
            1
        }
    }
}
