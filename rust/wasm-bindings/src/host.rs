// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser side of engine bring-up: canvas, scene readiness, model loading
//! and input listeners.

use crate::js_adapter::JsSceneAdapter;
use crate::utils::{bool_prop, call, get, js_message, method, string_prop};
use bimview_core::{Error, Result};
use bimview_engine::{EngineHost, ModelSource, Modifiers, PickEvent, StrategyChain, Viewer};
use js_sys::{Function, Promise};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, RequestInit, Response};

pub(crate) type SharedViewer = Rc<RefCell<Viewer<JsSceneAdapter>>>;

struct DomListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

struct EngineSubscription {
    emitter: JsValue,
    subscription: JsValue,
    _callback: Closure<dyn FnMut(JsValue)>,
}

/// [`EngineHost`] backed by a canvas, an engine instance created by the page,
/// and a page-supplied model loader.
pub struct JsEngineHost {
    canvas: HtmlCanvasElement,
    engine: JsValue,
    /// `(sceneUrl, modelId) => Promise<model | null>`
    loader: Function,
    viewer: SharedViewer,
    dom_listeners: Vec<DomListener>,
    subscriptions: Vec<EngineSubscription>,
}

impl JsEngineHost {
    pub(crate) fn new(
        canvas: HtmlCanvasElement,
        engine: JsValue,
        loader: Function,
        viewer: SharedViewer,
    ) -> Self {
        Self {
            canvas,
            engine,
            loader,
            viewer,
            dom_listeners: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    fn scene(&self) -> Option<JsValue> {
        get(&self.engine, "scene")
    }

    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(web_sys::Event)>,
    ) -> Result<()> {
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|err| Error::Engine(format!("cannot listen to {event}: {}", js_message(&err))))?;
        self.dom_listeners.push(DomListener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    /// Engine event emitter: camera control, scene, or the engine itself.
    fn pick_emitter(&self) -> Result<JsValue> {
        let camera_control = get(&self.engine, "cameraControl");
        let scene = self.scene();
        StrategyChain::new("pick events")
            .then("cameraControl.on", || {
                camera_control.clone().filter(|c| method(c, "on").is_some())
            })
            .then("scene.on", || scene.clone().filter(|s| method(s, "on").is_some()))
            .then("engine.on", || {
                method(&self.engine, "on").map(|_| self.engine.clone())
            })
            .run()
            .map(|applied| applied.value)
    }

    fn subscribe(&mut self, emitter: &JsValue, event: &'static str, empty: bool) {
        let viewer = self.viewer.clone();
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            let pick = if empty {
                PickEvent {
                    modifiers: modifiers_of(&payload),
                    ..PickEvent::empty()
                }
            } else {
                pick_from_js(&payload)
            };
            match viewer.try_borrow_mut() {
                Ok(mut viewer) => viewer.handle_pick(&pick),
                Err(_) => tracing::warn!(event, "viewer busy, dropping pick"),
            }
        });
        match call(emitter, "on", &[event.into(), callback.as_ref().clone()]) {
            Some(subscription) => self.subscriptions.push(EngineSubscription {
                emitter: emitter.clone(),
                subscription,
                _callback: callback,
            }),
            None => tracing::warn!(event, "engine refused pick subscription"),
        }
    }
}

impl EngineHost for JsEngineHost {
    type Adapter = JsSceneAdapter;

    fn canvas_size(&self) -> (u32, u32) {
        (
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    async fn next_frame(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let frame = Promise::new(&mut |resolve, _reject| {
            if window.request_animation_frame(&resolve).is_err() {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(frame).await;
    }

    fn scene_ready(&self) -> bool {
        self.scene()
            .map(|scene| get(&scene, "objects").is_some() || get(&scene, "objectIds").is_some())
            .unwrap_or(false)
    }

    async fn sleep(&self, ms: u32) {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }

    async fn load_model(&mut self, source: &ModelSource) -> Result<Option<JsSceneAdapter>> {
        let returned = self
            .loader
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(&source.scene_url),
                &JsValue::from_str(&source.model_id),
            )
            .map_err(|err| Error::Engine(js_message(&err)))?;

        let model = match returned.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .map_err(|err| Error::Engine(js_message(&err)))?,
            Err(value) => value,
        };
        if model.is_null() || model.is_undefined() {
            return Ok(None);
        }

        let scene = self
            .scene()
            .ok_or_else(|| Error::Engine("engine has no scene".into()))?;
        Ok(Some(JsSceneAdapter::new(self.engine.clone(), scene)))
    }

    async fn probe_asset(&self, url: &str) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let init = RequestInit::new();
        init.set_method("HEAD");
        match JsFuture::from(window.fetch_with_str_and_init(url, &init)).await {
            Ok(response) => response
                .dyn_into::<Response>()
                .map(|r| r.ok())
                .unwrap_or(false),
            Err(err) => {
                tracing::debug!(url, error = %js_message(&err), "asset probe failed");
                false
            }
        }
    }

    fn attach_input(&mut self) -> Result<()> {
        let emitter = self.pick_emitter()?;
        self.subscribe(&emitter, "picked", false);
        self.subscribe(&emitter, "pickedNothing", true);

        let window: EventTarget = web_sys::window()
            .ok_or_else(|| Error::Engine("no window".into()))?
            .into();
        for (event, down) in [("keydown", true), ("keyup", false)] {
            let viewer = self.viewer.clone();
            let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |e: web_sys::Event| {
                let Some(key) = e.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                    return;
                };
                if let Ok(mut viewer) = viewer.try_borrow_mut() {
                    if down {
                        viewer.key_down(&key);
                    } else {
                        viewer.key_up(&key);
                    }
                }
            });
            self.listen(window.clone(), event, callback)?;
        }

        let viewer = self.viewer.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |e: web_sys::Event| {
            let Some(mouse) = e.dyn_ref::<MouseEvent>() else {
                return;
            };
            let modifiers = Modifiers {
                shift: mouse.shift_key(),
                ctrl: mouse.ctrl_key(),
                meta: mouse.meta_key(),
            };
            if let Ok(mut viewer) = viewer.try_borrow_mut() {
                viewer.mouse_down(modifiers);
            }
        });
        self.listen(self.canvas.clone().into(), "mousedown", callback)?;

        tracing::debug!(
            subscriptions = self.subscriptions.len(),
            listeners = self.dom_listeners.len(),
            "input attached"
        );
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        for listener in self.dom_listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
        for sub in self.subscriptions.drain(..) {
            call(&sub.emitter, "off", &[sub.subscription]);
        }
        match method(&self.engine, "destroy") {
            Some(destroy) => destroy
                .call0(&self.engine)
                .map(|_| ())
                .map_err(|err| Error::Engine(js_message(&err))),
            None => Ok(()),
        }
    }
}

/// Modifier flags on a pick payload or the DOM event it wraps.
fn modifiers_of(payload: &JsValue) -> Option<Modifiers> {
    let read = |source: &JsValue| {
        let shift = bool_prop(source, "shiftKey");
        let ctrl = bool_prop(source, "ctrlKey");
        let meta = bool_prop(source, "metaKey");
        (shift.is_some() || ctrl.is_some() || meta.is_some()).then(|| Modifiers {
            shift: shift.unwrap_or(false),
            ctrl: ctrl.unwrap_or(false),
            meta: meta.unwrap_or(false),
        })
    };
    read(payload).or_else(|| get(payload, "event").as_ref().and_then(read))
}

/// `objectKey`, else `entity.id`, else `id`.
fn pick_from_js(payload: &JsValue) -> PickEvent {
    let object_key = string_prop(payload, "objectKey")
        .or_else(|| get(payload, "entity").and_then(|e| string_prop(&e, "id")))
        .or_else(|| string_prop(payload, "id"));
    PickEvent {
        object_key,
        modifiers: modifiers_of(payload),
    }
}
