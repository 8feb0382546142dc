// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reflect helpers for poking at engine objects whose shape is not known
//! ahead of time.

use bimview_core::{Color, Error};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// Set panic hook for better error messages in the browser
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn is_reflectable(target: &JsValue) -> bool {
    target.is_object() || target.is_function()
}

/// Property `key` of `target`, skipping `null` and `undefined`.
pub(crate) fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    if !is_reflectable(target) {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// Whether `target` has a property `key` at all (own or inherited).
pub(crate) fn has(target: &JsValue, key: &str) -> bool {
    is_reflectable(target) && Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
}

pub(crate) fn method(target: &JsValue, name: &str) -> Option<Function> {
    get(target, name)?.dyn_into::<Function>().ok()
}

/// Call `target[name](...args)`. `None` if there is no such method or it threw.
pub(crate) fn call(target: &JsValue, name: &str, args: &[JsValue]) -> Option<JsValue> {
    let function = method(target, name)?;
    let args: Array = args.iter().collect();
    match function.apply(target, &args) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(method = name, error = %js_message(&err), "engine call threw");
            None
        }
    }
}

pub(crate) fn set_js_prop(obj: &JsValue, key: &str, value: &JsValue) -> bool {
    Reflect::set(obj, &JsValue::from_str(key), value).unwrap_or(false)
}

/// Assign `target[key]` only when the property already exists.
pub(crate) fn set_existing(target: &JsValue, key: &str, value: &JsValue) -> Option<()> {
    (has(target, key) && set_js_prop(target, key, value)).then_some(())
}

pub(crate) fn string_prop(target: &JsValue, key: &str) -> Option<String> {
    get(target, key).and_then(|value| value.as_string())
}

pub(crate) fn bool_prop(target: &JsValue, key: &str) -> Option<bool> {
    get(target, key).and_then(|value| value.as_bool())
}

/// Best-effort message of a thrown JS value.
pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| string_prop(value, "message"))
        .unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn color_to_js(color: Color) -> JsValue {
    color
        .to_array()
        .iter()
        .map(|c| JsValue::from_f64(*c as f64))
        .collect::<Array>()
        .into()
}

/// Accepts `[r, g, b]`, typed arrays, and `{ r, g, b }` objects.
pub(crate) fn color_from_js(value: &JsValue) -> Option<Color> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    if Array::is_array(value) || has(value, "length") {
        let components: Vec<f32> = Array::from(value)
            .iter()
            .take(3)
            .filter_map(|c| c.as_f64())
            .map(|c| c as f32)
            .collect();
        return Color::from_slice(&components);
    }
    let channel = |key: &str| get(value, key).and_then(|c| c.as_f64()).map(|c| c as f32);
    Color::from_slice(&[channel("r")?, channel("g")?, channel("b")?])
}

/// `{ kind, message }` object handed to rejected promises.
pub(crate) fn error_to_js(err: &Error) -> JsValue {
    let obj = js_sys::Object::new();
    set_js_prop(&obj, "kind", &err.kind().into());
    set_js_prop(&obj, "message", &err.to_string().into());
    set_js_prop(&obj, "fatal", &err.is_fatal().into());
    obj.into()
}
