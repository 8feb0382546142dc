// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convergence, leak and precedence properties of the reconciler.

mod common;

use approx::assert_relative_eq;
use bimview_core::{Color, DisplayMode, ViewerConfig, ViewerState};
use bimview_engine::{AppearanceLedger, KeyScheme, Original, Reconciler, Resolver};
use common::{FakeScene, BASE};

fn reconciler(keys: &[&str]) -> Reconciler<FakeScene> {
    Reconciler::new(FakeScene::with_keys(keys), &ViewerConfig::with_model_id("m1"))
}

fn selected(ids: &[&str]) -> ViewerState {
    let mut state = ViewerState::new();
    state.set_selection(ids);
    state
}

#[test]
fn test_apply_selection_is_idempotent() {
    let mut rec = reconciler(&["m1#A", "m1#B", "m1#C"]);
    let state = selected(&["A", "B"]);

    rec.apply_selection(&state);
    let once = rec.adapter().objects.borrow().clone();
    let ledger_once = rec.ledger().len();

    rec.apply_selection(&state);
    assert_eq!(*rec.adapter().objects.borrow(), once);
    assert_eq!(rec.ledger().len(), ledger_once);
    assert_eq!(ledger_once, 2);
}

#[test]
fn test_ledger_empties_after_select_switch_and_clear() {
    let mut rec = reconciler(&["m1#A", "m1#B", "m1#C"]);
    let mut state = ViewerState::new();

    state.select("A", false);
    rec.apply_selection(&state);
    assert_eq!(rec.ledger().len(), 1);

    state.select("B", false);
    rec.apply_selection(&state);
    assert_eq!(rec.ledger().len(), 1);
    assert_eq!(rec.adapter().object("m1#A").colorize, None);

    state.deselect_all();
    rec.apply_selection(&state);
    assert!(rec.ledger().is_empty());
    assert!(rec.adapter().keys_with_color(Color::HIGHLIGHT).is_empty());
}

#[test]
fn test_original_override_color_is_restored() {
    let mut rec = reconciler(&["m1#A"]);
    let custom = Color::new(0.1, 0.7, 0.2);
    rec.adapter().objects.borrow_mut()[0].colorize = Some(custom);

    rec.apply_selection(&selected(&["A"]));
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::HIGHLIGHT));

    rec.apply_selection(&ViewerState::new());
    let restored = rec.adapter().object("m1#A").displayed_color();
    assert_relative_eq!(restored.r, custom.r);
    assert_relative_eq!(restored.g, custom.g);
    assert_relative_eq!(restored.b, custom.b);
    assert!(rec.ledger().is_empty());
}

#[test]
fn test_capture_on_highlighted_object_never_stores_highlight() {
    let mut scene = FakeScene::with_keys(&["m1#A"]);
    scene.objects.borrow_mut()[0].colorize = Some(Color::new(1.0, 0.850_000_1, 0.0));
    let mut ledger = AppearanceLedger::new(Color::HIGHLIGHT, 1e-3);

    ledger.capture(&scene, &0);
    assert_eq!(ledger.consume_original(&0), Some(Original::NoOverride));

    // re-entrant selection on an object still carrying the tint
    let mut rec = Reconciler::new(scene, &ViewerConfig::with_model_id("m1"));
    rec.apply_selection(&selected(&["A"]));
    rec.apply_selection(&ViewerState::new());
    let object = rec.adapter().object("m1#A");
    assert_eq!(object.colorize, None);
    assert_eq!(object.displayed_color(), BASE);

    scene = rec.into_adapter();
    assert!(!scene.object("m1#A").selected);
}

#[test]
fn test_isolation_precedence_over_hidden() {
    let mut rec = reconciler(&["m1#A", "m1#B", "m1#C", "m1#D"]);
    let mut state = ViewerState::new();

    state.set_hidden("A", true);
    rec.apply_visibility(&state);
    assert_eq!(rec.adapter().visible_keys(), ["m1#B", "m1#C", "m1#D"]);

    state.set_isolation(Some(["B", "C"]));
    rec.apply_visibility(&state);
    assert_eq!(rec.adapter().visible_keys(), ["m1#B", "m1#C"]);

    state.set_isolation(None::<Vec<&str>>);
    rec.apply_visibility(&state);
    assert_eq!(rec.adapter().visible_keys(), ["m1#B", "m1#C", "m1#D"]);
}

#[test]
fn test_resolution_fallback_chain() {
    let resolver = Resolver::new("m1");

    let composite = FakeScene::with_keys(&["m1#E1"]);
    assert_eq!(
        resolver.resolve_with_scheme(&composite, "E1").map(|(h, s)| (h.len(), s)),
        Some((1, KeyScheme::Composite))
    );

    let bare = FakeScene::with_keys(&["E1"]);
    assert_eq!(
        resolver.resolve_with_scheme(&bare, "E1").map(|(h, s)| (h.len(), s)),
        Some((1, KeyScheme::Bare))
    );

    let foreign = FakeScene::with_keys(&["m2#E1"]);
    assert_eq!(
        resolver.resolve_with_scheme(&foreign, "E1").map(|(h, s)| (h.len(), s)),
        Some((1, KeyScheme::Suffix))
    );
}

#[test]
fn test_additive_selection_converges_with_direct_selection() {
    let keys = ["m1#A", "m1#B", "m1#C"];

    let mut stepwise = reconciler(&keys);
    let mut state = ViewerState::new();
    state.select("A", false);
    stepwise.apply_selection(&state);
    state.select("B", true);
    stepwise.apply_selection(&state);

    let mut direct = reconciler(&keys);
    let direct_state = selected(&["A", "B"]);
    direct.apply_selection(&direct_state);

    let mut a: Vec<&str> = state.selected().iter().map(String::as_str).collect();
    let mut b: Vec<&str> = direct_state.selected().iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);

    let mut stepwise_ledger = stepwise.ledger().handles();
    let mut direct_ledger = direct.ledger().handles();
    stepwise_ledger.sort_unstable();
    direct_ledger.sort_unstable();
    assert_eq!(stepwise_ledger, direct_ledger);
    for handle in &direct_ledger {
        assert_eq!(
            stepwise.ledger().consume_original(handle),
            direct.ledger().consume_original(handle)
        );
    }
    assert_eq!(*stepwise.adapter().objects.borrow(), *direct.adapter().objects.borrow());
}

#[test]
fn test_hide_show_cycle_reasserts_highlight() {
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    let mut state = selected(&["A"]);
    rec.apply_selection(&state);

    // an engine that clears colorize on hide
    state.set_hidden("A", true);
    rec.apply_visibility(&state);
    rec.adapter().objects.borrow_mut()[0].colorize = None;

    state.set_hidden("A", false);
    rec.apply_visibility(&state);
    let a = rec.adapter().object("m1#A");
    assert!(a.visible);
    assert_eq!(a.colorize, Some(Color::HIGHLIGHT));
    assert_eq!(rec.ledger().len(), 1);
}

#[test]
fn test_isolation_reasserts_selected_member_tint() {
    let mut rec = reconciler(&["m1#A", "m1#B", "m1#C"]);
    let mut state = selected(&["B"]);
    rec.apply_selection(&state);
    rec.adapter().objects.borrow_mut()[1].colorize = None;

    state.set_isolation(Some(["B", "C"]));
    rec.apply_visibility(&state);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(Color::HIGHLIGHT));
    assert_eq!(rec.adapter().object("m1#C").colorize, None);
}

#[test]
fn test_xray_toggle_and_tint_reassertion() {
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    let mut state = selected(&["A"]);
    rec.apply_selection(&state);

    state.set_xray(true);
    rec.apply_xray(&state);
    assert!(rec.adapter().object("m1#A").xrayed);
    assert!(rec.adapter().object("m1#B").xrayed);
    rec.adapter().objects.borrow_mut()[0].colorize = None;

    state.set_xray(false);
    rec.apply_xray(&state);
    assert!(!rec.adapter().object("m1#B").xrayed);
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::HIGHLIGHT));
}

#[test]
fn test_wireframe_tints_unselected_and_solid_clears() {
    let mut rec = reconciler(&["m1#A", "m1#B", "m1#C"]);
    let mut state = selected(&["A"]);
    rec.apply_selection(&state);

    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);
    let neutral = Color::NEUTRAL;
    assert_eq!(rec.adapter().keys_with_color(neutral), ["m1#B", "m1#C"]);
    assert_eq!(rec.adapter().keys_with_color(Color::HIGHLIGHT), ["m1#A"]);
    assert!(rec.adapter().objects.borrow().iter().all(|o| o.edges));
    // the wireframe tint is a global mode, not a ledger episode
    assert_eq!(rec.ledger().len(), 1);

    state.set_display_mode(DisplayMode::Solid);
    rec.apply_display_mode(&state);
    assert!(rec.adapter().keys_with_color(neutral).is_empty());
    assert_eq!(rec.adapter().keys_with_color(Color::HIGHLIGHT), ["m1#A"]);
    assert!(rec.adapter().objects.borrow().iter().all(|o| !o.edges));
}

#[test]
fn test_deselect_in_wireframe_gets_neutral_tint_then_base_in_shaded() {
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    let mut state = ViewerState::new();
    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);

    // selecting a tinted object must not record the tint as its original
    state.select("A", false);
    rec.apply_selection(&state);
    assert_eq!(
        rec.ledger().consume_original(&0),
        Some(Original::NoOverride)
    );

    state.deselect_all();
    rec.apply_selection(&state);
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::NEUTRAL));

    state.set_display_mode(DisplayMode::Shaded);
    rec.apply_display_mode(&state);
    assert_eq!(rec.adapter().object("m1#A").colorize, None);
    assert!(rec.ledger().is_empty());
}

#[test]
fn test_missing_ids_do_not_stop_the_batch() {
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    let report = rec.apply_selection(&selected(&["A", "ghost", "B"]));
    assert_eq!(report.missed, vec!["ghost".to_string()]);
    assert_eq!(report.resolved, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(rec.adapter().keys_with_color(Color::HIGHLIGHT), ["m1#A", "m1#B"]);
}

#[test]
fn test_missing_setter_falls_back_to_batch_api() {
    let scene = FakeScene::with_keys(&["m1#A", "m1#B"])
        .disable("setVisible")
        .disable("setColorize");
    let mut rec = Reconciler::new(scene, &ViewerConfig::with_model_id("m1"));
    let mut state = selected(&["A"]);
    state.set_hidden("B", true);

    let report = rec.reconcile(&state);
    assert!(report.is_clean());
    assert_eq!(rec.adapter().visible_keys(), ["m1#A"]);
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::HIGHLIGHT));
}

#[test]
fn test_missing_capability_is_logged_not_fatal() {
    let scene = FakeScene::with_keys(&["m1#A", "m1#B"])
        .disable("setXRayed")
        .disable("setObjectsXRayed");
    let mut rec = Reconciler::new(scene, &ViewerConfig::with_model_id("m1"));
    let mut state = selected(&["A"]);
    state.set_xray(true);

    let report = rec.reconcile(&state);
    assert_eq!(report.failed, 2);
    assert!(!rec.adapter().object("m1#B").xrayed);
    // the other dimensions still applied
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::HIGHLIGHT));
    assert!(state.xray());
}

#[test]
fn test_failed_restore_keeps_record_for_retry() {
    let mut rec = reconciler(&["m1#A"]);
    rec.apply_selection(&selected(&["A"]));

    // the engine loses every color write path
    rec.adapter().set_enabled("setColorize", false);
    rec.adapter().set_enabled("setObjectsColorized", false);
    let report = rec.apply_selection(&ViewerState::new());
    assert!(report.failed > 0);
    assert_eq!(rec.ledger().len(), 1);
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::HIGHLIGHT));

    rec.adapter().set_enabled("setColorize", true);
    rec.adapter().set_enabled("setObjectsColorized", true);
    let report = rec.apply_selection(&ViewerState::new());
    assert!(report.is_clean());
    assert!(rec.ledger().is_empty());
    assert_eq!(rec.adapter().object("m1#A").colorize, None);
}

#[test]
fn test_wireframe_round_trip_keeps_prior_override() {
    let green = Color::new(0.1, 0.7, 0.2);
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    rec.adapter().objects.borrow_mut()[1].colorize = Some(green);

    let mut state = ViewerState::new();
    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);
    assert_eq!(rec.adapter().keys_with_color(Color::NEUTRAL), ["m1#A", "m1#B"]);

    // a second pass must not record the tint as the covered color
    rec.apply_display_mode(&state);

    state.set_display_mode(DisplayMode::Shaded);
    rec.apply_display_mode(&state);
    assert_eq!(rec.adapter().object("m1#A").colorize, None);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(green));
}

#[test]
fn test_deselect_in_wireframe_then_solid_restores_override() {
    let green = Color::new(0.1, 0.7, 0.2);
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    rec.adapter().objects.borrow_mut()[1].colorize = Some(green);

    let mut state = selected(&["B"]);
    rec.apply_selection(&state);
    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(Color::HIGHLIGHT));

    state.deselect_all();
    rec.apply_selection(&state);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(Color::NEUTRAL));
    assert!(rec.ledger().is_empty());

    state.set_display_mode(DisplayMode::Solid);
    rec.apply_display_mode(&state);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(green));
}

#[test]
fn test_select_while_tinted_restores_covered_override() {
    let green = Color::new(0.1, 0.7, 0.2);
    let mut rec = reconciler(&["m1#A", "m1#B"]);
    rec.adapter().objects.borrow_mut()[1].colorize = Some(green);

    let mut state = ViewerState::new();
    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);

    state.select("B", false);
    rec.apply_selection(&state);
    assert_eq!(rec.ledger().consume_original(&1), Some(Original::Color(green)));

    state.set_display_mode(DisplayMode::Solid);
    rec.apply_display_mode(&state);
    state.deselect_all();
    rec.apply_selection(&state);
    assert_eq!(rec.adapter().object("m1#B").colorize, Some(green));
    assert_eq!(rec.adapter().object("m1#A").colorize, None);
}

#[test]
fn test_failed_untint_is_retried_on_next_mode_switch() {
    let green = Color::new(0.1, 0.7, 0.2);
    let mut rec = reconciler(&["m1#A"]);
    rec.adapter().objects.borrow_mut()[0].colorize = Some(green);

    let mut state = ViewerState::new();
    state.set_display_mode(DisplayMode::Wireframe);
    rec.apply_display_mode(&state);

    rec.adapter().set_enabled("setColorize", false);
    rec.adapter().set_enabled("setObjectsColorized", false);
    state.set_display_mode(DisplayMode::Solid);
    let report = rec.apply_display_mode(&state);
    assert_eq!(report.failed, 1);
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(Color::NEUTRAL));

    rec.adapter().set_enabled("setColorize", true);
    rec.adapter().set_enabled("setObjectsColorized", true);
    let report = rec.apply_display_mode(&state);
    assert!(report.is_clean());
    assert_eq!(rec.adapter().object("m1#A").colorize, Some(green));
}
