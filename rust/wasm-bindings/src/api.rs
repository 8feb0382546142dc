// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for the viewer
//!
//! One `BimViewer` per mounted viewer component:
//!
//! ```javascript
//! const viewer = new BimViewer({ highlightColor: [1, 0.85, 0] });
//! await viewer.mount({
//!   canvas,
//!   engine,                                    // engine instance created by the page
//!   loadModel: (url, id) => loader.load({ id, src: url }),
//!   sceneUrl: `/api/v1/viewer/${fileId}/xkt`,
//!   modelId: fileId,
//!   status,                                    // viewer status response, optional
//!   metadata,                                  // metadata.json, optional
//! });
//! viewer.selectElements(['2O2Fr$t4X7Zf8NOew3FLOH']);
//! ```

use crate::host::{JsEngineHost, SharedViewer};
use crate::js_adapter::JsSceneAdapter;
use crate::utils::{error_to_js, get, string_prop};
use bimview_core::{
    DisplayMode, ElementGroup, Error, MetadataIndex, Result, ViewerConfig, ViewerStatus,
};
use bimview_engine::{LifecycleController, ModelSource, Modifiers, MountGuard, PickEvent, Viewer};
use js_sys::{Function, Promise};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlCanvasElement;

type SharedController = Rc<RefCell<Option<LifecycleController<JsEngineHost>>>>;

/// Deserialize an optional JS value; `undefined`/`null` give `None`.
fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<Option<T>> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|err| Error::Metadata(format!("invalid {what}: {err}")))
}

/// Id list argument of an operation. Bad input is logged and the call skipped.
fn ids_arg(value: JsValue, operation: &str) -> Option<Vec<String>> {
    match from_js::<Vec<String>>(value, "id list") {
        Ok(ids) => Some(ids.unwrap_or_default()),
        Err(err) => {
            tracing::warn!(operation, error = %err, "ignoring call");
            None
        }
    }
}

/// Run `f` on the borrowed value, or log and skip when it is mutably borrowed.
///
/// Engine setters fire events synchronously, so a page listener can call
/// back into the viewer while one of its operations is still running.
fn try_with<T, R>(
    cell: &RefCell<T>,
    operation: &'static str,
    f: impl FnOnce(&T) -> R,
) -> Option<R> {
    match cell.try_borrow() {
        Ok(value) => Some(f(&value)),
        Err(_) => {
            tracing::warn!(operation, "viewer busy, ignoring call");
            None
        }
    }
}

fn try_with_mut<T, R>(
    cell: &RefCell<T>,
    operation: &'static str,
    f: impl FnOnce(&mut T) -> R,
) -> Option<R> {
    match cell.try_borrow_mut() {
        Ok(mut value) => Some(f(&mut value)),
        Err(_) => {
            tracing::warn!(operation, "viewer busy, ignoring call");
            None
        }
    }
}

fn snapshot_to_js(viewer: &Viewer<JsSceneAdapter>) -> JsValue {
    serde_wasm_bindgen::to_value(&viewer.snapshot()).unwrap_or(JsValue::NULL)
}

struct MountOptions {
    canvas: HtmlCanvasElement,
    engine: JsValue,
    loader: Function,
    source: ModelSource,
    status: Option<ViewerStatus>,
    metadata: Option<MetadataIndex>,
}

impl MountOptions {
    fn parse(options: &JsValue, config: &ViewerConfig) -> Result<Self> {
        let canvas = get(options, "canvas")
            .and_then(|c| c.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| Error::Engine("mount options need a canvas element".into()))?;
        let engine =
            get(options, "engine").ok_or_else(|| Error::Engine("mount options need an engine".into()))?;
        let loader = get(options, "loadModel")
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| Error::Engine("mount options need a loadModel function".into()))?;
        let scene_url = string_prop(options, "sceneUrl")
            .ok_or_else(|| Error::Engine("mount options need a sceneUrl".into()))?;
        let model_id = string_prop(options, "modelId").unwrap_or_else(|| config.model_id.clone());

        let status = from_js(get(options, "status").unwrap_or(JsValue::UNDEFINED), "status")?;
        let metadata = from_js::<serde_json::Value>(
            get(options, "metadata").unwrap_or(JsValue::UNDEFINED),
            "metadata",
        )?
        .map(MetadataIndex::from_value)
        .transpose()?;

        Ok(Self {
            canvas,
            engine,
            loader,
            source: ModelSource::new(model_id, scene_url),
            status,
            metadata,
        })
    }
}

/// Viewer component binding
#[wasm_bindgen]
pub struct BimViewer {
    config: ViewerConfig,
    viewer: SharedViewer,
    controller: SharedController,
    guard: Option<MountGuard>,
}

#[wasm_bindgen]
impl BimViewer {
    /// Create a viewer. `config` is an optional partial `ViewerConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<BimViewer, JsValue> {
        let config = from_js::<ViewerConfig>(config, "config")
            .map_err(|err| error_to_js(&err))?
            .unwrap_or_default();
        Ok(Self {
            viewer: Rc::new(RefCell::new(Viewer::new(config.clone()))),
            config,
            controller: Rc::new(RefCell::new(None)),
            guard: None,
        })
    }

    /// Bring the engine up and load the model.
    ///
    /// Resolves with the state snapshot once the model is loaded; rejects with
    /// `{ kind, message, fatal }`. Mounting again tears the previous engine down.
    pub fn mount(&mut self, options: JsValue) -> Promise {
        self.unmount();
        let guard = MountGuard::new();
        self.guard = Some(guard.clone());

        let config = self.config.clone();
        let viewer = self.viewer.clone();
        let controller = self.controller.clone();

        Promise::new(&mut |resolve, reject| {
            let options = options.clone();
            let config = config.clone();
            let viewer = viewer.clone();
            let controller = controller.clone();
            let guard = guard.clone();
            spawn_local(async move {
                match mount_model(options, config, viewer.clone(), controller, guard).await {
                    Ok(()) => {
                        let snapshot = try_with(&viewer, "mount", snapshot_to_js)
                            .unwrap_or(JsValue::UNDEFINED);
                        let _ = resolve.call1(&JsValue::NULL, &snapshot);
                    }
                    Err(err) => {
                        let _ = reject.call1(&JsValue::NULL, &error_to_js(&err));
                    }
                }
            });
        })
    }

    /// Tear the engine down. Safe to call at any time, including mid-mount.
    pub fn unmount(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.unmount();
        }
        // released before teardown so engine callbacks can still read the slot
        let controller = try_with_mut(&self.controller, "unmount", Option::take).flatten();
        if let Some(mut controller) = controller {
            controller.teardown();
        }
        try_with_mut(&self.viewer, "unmount", |viewer| viewer.detach());
    }

    /// Alias of `unmount` for component cleanup hooks.
    pub fn destroy(&mut self) {
        self.unmount();
    }

    #[wasm_bindgen(getter, js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        try_with(&self.viewer, "isReady", |viewer| viewer.is_ready()).unwrap_or(false)
    }

    /// Lifecycle phase name, e.g. `"modelLoaded"`.
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        use bimview_engine::Phase;
        let phase = try_with(&self.controller, "phase", |slot| {
            slot.as_ref().map(|c| c.phase().clone())
        })
        .flatten();
        let phase = match phase {
            None if self.guard.is_some() => "mounting",
            None => "uninitialized",
            Some(Phase::Uninitialized) => "uninitialized",
            Some(Phase::CanvasReady) => "canvasReady",
            Some(Phase::SceneReady) => "sceneReady",
            Some(Phase::ModelLoading) => "modelLoading",
            Some(Phase::ModelLoaded) => "modelLoaded",
            Some(Phase::Failed(_)) => "failed",
            Some(Phase::TornDown) => "tornDown",
        };
        phase.to_string()
    }

    /// Replace the metadata index (`metadata.json` contents).
    #[wasm_bindgen(js_name = setMetadata)]
    pub fn set_metadata(&self, metadata: JsValue) -> std::result::Result<(), JsValue> {
        let value = from_js::<serde_json::Value>(metadata, "metadata")
            .map_err(|err| error_to_js(&err))?
            .unwrap_or_default();
        let index = MetadataIndex::from_value(value).map_err(|err| error_to_js(&err))?;
        try_with_mut(&self.viewer, "setMetadata", |viewer| viewer.set_metadata(index));
        Ok(())
    }

    #[wasm_bindgen(js_name = selectElements)]
    pub fn select_elements(&self, ids: JsValue) {
        if let Some(ids) = ids_arg(ids, "selectElements") {
            try_with_mut(&self.viewer, "selectElements", |viewer| viewer.select_elements(&ids));
        }
    }

    #[wasm_bindgen(js_name = deselectAll)]
    pub fn deselect_all(&self) {
        try_with_mut(&self.viewer, "deselectAll", |viewer| viewer.deselect_all());
    }

    #[wasm_bindgen(js_name = hideElements)]
    pub fn hide_elements(&self, ids: JsValue) {
        if let Some(ids) = ids_arg(ids, "hideElements") {
            try_with_mut(&self.viewer, "hideElements", |viewer| viewer.hide_elements(&ids));
        }
    }

    #[wasm_bindgen(js_name = showElements)]
    pub fn show_elements(&self, ids: JsValue) {
        if let Some(ids) = ids_arg(ids, "showElements") {
            try_with_mut(&self.viewer, "showElements", |viewer| viewer.show_elements(&ids));
        }
    }

    /// `null` ends isolation.
    #[wasm_bindgen(js_name = isolateElements)]
    pub fn isolate_elements(&self, ids: JsValue) {
        let ids = if ids.is_null() || ids.is_undefined() {
            None
        } else {
            match ids_arg(ids, "isolateElements") {
                Some(ids) => Some(ids),
                None => return,
            }
        };
        try_with_mut(&self.viewer, "isolateElements", |viewer| viewer.isolate_elements(ids));
    }

    #[wasm_bindgen(js_name = showAll)]
    pub fn show_all(&self) {
        try_with_mut(&self.viewer, "showAll", |viewer| viewer.show_all());
    }

    #[wasm_bindgen(js_name = isolateGroup)]
    pub fn isolate_group(&self, group: JsValue) {
        match from_js::<ElementGroup>(group, "group") {
            Ok(Some(group)) => {
                try_with_mut(&self.viewer, "isolateGroup", |viewer| viewer.isolate_group(&group));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring isolateGroup"),
        }
    }

    #[wasm_bindgen(js_name = selectGroup)]
    pub fn select_group(&self, group: JsValue) {
        match from_js::<ElementGroup>(group, "group") {
            Ok(Some(group)) => {
                try_with_mut(&self.viewer, "selectGroup", |viewer| viewer.select_group(&group));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring selectGroup"),
        }
    }

    #[wasm_bindgen(js_name = setXrayMode)]
    pub fn set_xray_mode(&self, enabled: bool) {
        try_with_mut(&self.viewer, "setXrayMode", |viewer| viewer.set_xray_mode(enabled));
    }

    /// `"wireframe"`, `"solid"` or `"shaded"`.
    #[wasm_bindgen(js_name = setDisplayMode)]
    pub fn set_display_mode(&self, mode: &str) {
        match mode.parse::<DisplayMode>() {
            Ok(mode) => {
                try_with_mut(&self.viewer, "setDisplayMode", |viewer| {
                    viewer.set_display_mode(mode)
                });
            }
            Err(err) => tracing::warn!(mode, error = %err, "ignoring setDisplayMode"),
        }
    }

    #[wasm_bindgen(js_name = fitToView)]
    pub fn fit_to_view(&self) {
        try_with_mut(&self.viewer, "fitToView", |viewer| viewer.fit_to_view());
    }

    /// Current state snapshot (`selectedIds`, `hiddenIds`, `isolatedIds`, ...).
    pub fn state(&self) -> JsValue {
        try_with(&self.viewer, "state", snapshot_to_js).unwrap_or(JsValue::NULL)
    }

    /// Metadata of the first selected element, or `null`.
    #[wasm_bindgen(js_name = primarySelection)]
    pub fn primary_selection(&self) -> JsValue {
        try_with(&self.viewer, "primarySelection", |viewer| {
            let Some(element) = viewer.primary_selection() else {
                return JsValue::NULL;
            };
            let value = serde_wasm_bindgen::to_value(element).unwrap_or(JsValue::NULL);
            crate::utils::set_js_prop(&value, "id", &JsValue::from_str(&element.id));
            value
        })
        .unwrap_or(JsValue::NULL)
    }

    /// Feed a pick from outside the engine's own event stream.
    /// `key` is the object key, `null` for empty space.
    #[wasm_bindgen(js_name = handlePick)]
    pub fn handle_pick(&self, key: Option<String>, modifiers: JsValue) {
        let modifiers = from_js::<Modifiers>(modifiers, "modifiers").unwrap_or_default();
        let event = PickEvent {
            object_key: key,
            modifiers,
        };
        try_with_mut(&self.viewer, "handlePick", |viewer| viewer.handle_pick(&event));
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, key: &str) {
        try_with_mut(&self.viewer, "keyDown", |viewer| viewer.key_down(key));
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, key: &str) {
        try_with_mut(&self.viewer, "keyUp", |viewer| viewer.key_up(key));
    }

    #[wasm_bindgen(js_name = mouseDown)]
    pub fn mouse_down(&self, modifiers: JsValue) {
        let modifiers = from_js::<Modifiers>(modifiers, "modifiers")
            .ok()
            .flatten()
            .unwrap_or(Modifiers::NONE);
        try_with_mut(&self.viewer, "mouseDown", |viewer| viewer.mouse_down(modifiers));
    }
}

async fn mount_model(
    options: JsValue,
    mut config: ViewerConfig,
    viewer: SharedViewer,
    slot: SharedController,
    guard: MountGuard,
) -> Result<()> {
    let options = MountOptions::parse(&options, &config)?;
    config.model_id = options.source.model_id.clone();

    {
        let mut fresh: Viewer<JsSceneAdapter> = Viewer::new(config.clone());
        let kept = || try_with(&viewer, "mount", |v| v.metadata().cloned()).flatten();
        if let Some(index) = options.metadata.or_else(kept) {
            fresh.set_metadata(index);
        }
        try_with_mut(&viewer, "mount", |v| *v = fresh)
            .ok_or_else(|| Error::Engine("viewer busy".into()))?;
    }

    let host = JsEngineHost::new(options.canvas, options.engine, options.loader, viewer.clone());
    let mut controller = LifecycleController::with_guard(host, config, guard.clone());
    let loaded = controller
        .bring_up(&options.source, options.status.as_ref())
        .await;

    if !guard.is_mounted() {
        // unmounted while the last step settled
        controller.teardown();
        return Err(loaded.err().unwrap_or(Error::Unmounted { stage: "attach" }));
    }
    let adapter = match loaded {
        Ok(adapter) => adapter,
        Err(err) => {
            slot.replace(Some(controller));
            return Err(err);
        }
    };
    let attached = try_with_mut(&viewer, "mount", |v| {
        v.attach(adapter);
    });
    slot.replace(Some(controller));
    attached.ok_or_else(|| Error::Engine("viewer busy".into()))
}
