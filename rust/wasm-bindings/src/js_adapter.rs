// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`SceneAdapter`] over a live JavaScript rendering engine.
//!
//! Objects are addressed by their registry key, so a handle is just that key.
//! Every effect is applied through a [`StrategyChain`]: the per-object setter
//! first, then the plain field, then the scene-level batch mutator, then the
//! per-mesh fallback for engines that only expose meshes.

use crate::utils::{call, color_from_js, color_to_js, get, has, method, set_existing};
use bimview_core::{Color, Result};
use bimview_engine::{SceneAdapter, StrategyChain};
use js_sys::{Array, Map, Object};
use wasm_bindgen::{JsCast, JsValue};

/// One loaded model in a browser engine.
pub struct JsSceneAdapter {
    viewer: JsValue,
    scene: JsValue,
}

impl JsSceneAdapter {
    pub fn new(viewer: JsValue, scene: JsValue) -> Self {
        Self { viewer, scene }
    }

    fn objects(&self) -> Option<JsValue> {
        get(&self.scene, "objects")
    }

    fn object(&self, key: &str) -> Option<JsValue> {
        let objects = self.objects()?;
        match objects.dyn_ref::<Map>() {
            Some(map) => {
                let obj = map.get(&JsValue::from_str(key));
                (!obj.is_undefined() && !obj.is_null()).then_some(obj)
            }
            None => get(&objects, key),
        }
    }

    fn meshes(obj: &JsValue) -> Vec<JsValue> {
        get(obj, "meshes")
            .filter(Array::is_array)
            .map(|meshes| Array::from(&meshes).iter().collect())
            .unwrap_or_default()
    }

    /// `scene[batch]([key], value)`.
    fn batch(&self, batch: &str, key: &str, value: &JsValue) -> Option<()> {
        let keys: Array = std::iter::once(JsValue::from_str(key)).collect();
        call(&self.scene, batch, &[keys.into(), value.clone()]).map(|_| ())
    }

    /// Boolean flag with setter, field and batch strategies.
    fn set_flag(
        &self,
        effect: &'static str,
        key: &str,
        setter: &'static str,
        field: &'static str,
        batch: &'static str,
        on: bool,
    ) -> Result<()> {
        let obj = self.object(key);
        let value = JsValue::from_bool(on);
        StrategyChain::new(effect)
            .then(setter, || call(obj.as_ref()?, setter, &[value.clone()]).map(|_| ()))
            .then(field, || set_existing(obj.as_ref()?, field, &value))
            .then(batch, || self.batch(batch, key, &value))
            .run()
            .map(|_| ())
    }
}

impl SceneAdapter for JsSceneAdapter {
    type Handle = String;

    fn object_keys(&self) -> Vec<String> {
        let keys = match self.objects() {
            Some(objects) => match objects.dyn_ref::<Map>() {
                Some(map) => map.keys().into_iter().filter_map(|k| k.ok()).collect(),
                None => match objects.dyn_ref::<Object>() {
                    Some(obj) => Object::keys(obj).iter().collect(),
                    None => Vec::new(),
                },
            },
            None => get(&self.scene, "objectIds")
                .map(|ids| Array::from(&ids).iter().collect())
                .unwrap_or_default(),
        };
        keys.into_iter().filter_map(|k| k.as_string()).collect()
    }

    fn lookup(&self, key: &str) -> Vec<String> {
        match self.object(key) {
            Some(_) => vec![key.to_string()],
            None => Vec::new(),
        }
    }

    fn set_visible(&mut self, key: &String, visible: bool) -> Result<()> {
        let obj = self.object(key);
        let value = JsValue::from_bool(visible);
        StrategyChain::new("visible")
            .then("setVisible", || {
                call(obj.as_ref()?, "setVisible", &[value.clone()]).map(|_| ())
            })
            .then("visible field", || set_existing(obj.as_ref()?, "visible", &value))
            .then("setObjectsVisible", || {
                self.batch("setObjectsVisible", key, &value)
            })
            .then("mesh visible", || {
                let meshes = Self::meshes(obj.as_ref()?);
                let applied = meshes
                    .iter()
                    .filter(|mesh| set_existing(mesh, "visible", &value).is_some())
                    .count();
                (applied > 0).then_some(())
            })
            .run()
            .map(|_| ())
    }

    fn read_color(&self, key: &String) -> Result<Option<Color>> {
        let obj = self.object(key);
        StrategyChain::new("read color")
            .then("getColorize", || {
                let obj = obj.as_ref()?;
                method(obj, "getColorize")?;
                Some(call(obj, "getColorize", &[]).and_then(|c| color_from_js(&c)))
            })
            .then("colorize field", || {
                let obj = obj.as_ref()?;
                has(obj, "colorize").then(|| get(obj, "colorize").and_then(|c| color_from_js(&c)))
            })
            .then("material color", || {
                let color = get(&get(obj.as_ref()?, "material")?, "color")?;
                Some(color_from_js(&color))
            })
            .then("mesh material color", || {
                let mesh = Self::meshes(obj.as_ref()?).into_iter().next()?;
                let color = get(&get(&mesh, "material")?, "color")?;
                Some(color_from_js(&color))
            })
            .run()
            .map(|applied| applied.value)
    }

    fn write_color(&mut self, key: &String, color: Color) -> Result<()> {
        let obj = self.object(key);
        let rgb = color_to_js(color);
        StrategyChain::new("colorize")
            .then("setColorize", || {
                call(obj.as_ref()?, "setColorize", &[rgb.clone()]).map(|_| ())
            })
            .then("colorize field", || set_existing(obj.as_ref()?, "colorize", &rgb))
            .then("setObjectsColorized", || {
                self.batch("setObjectsColorized", key, &rgb)
            })
            .then("material color", || {
                let material = get(obj.as_ref()?, "material")?;
                write_material_color(&material, color)
            })
            .then("mesh material color", || {
                let meshes = Self::meshes(obj.as_ref()?);
                let applied = meshes
                    .iter()
                    .filter_map(|mesh| get(mesh, "material"))
                    .filter(|material| write_material_color(material, color).is_some())
                    .count();
                (applied > 0).then_some(())
            })
            .run()
            .map(|_| ())
    }

    fn reset_color(&mut self, key: &String) -> Result<()> {
        let obj = self.object(key);
        StrategyChain::new("reset color")
            .then("colorize field", || {
                set_existing(obj.as_ref()?, "colorize", &JsValue::NULL)
            })
            .then("setObjectsColorized", || {
                self.batch("setObjectsColorized", key, &JsValue::NULL)
            })
            .then("setColorize", || {
                call(obj.as_ref()?, "setColorize", &[JsValue::NULL]).map(|_| ())
            })
            .run()
            .map(|_| ())
    }

    fn set_selected(&mut self, key: &String, selected: bool) -> Result<()> {
        self.set_flag(
            "selected",
            key,
            "setSelected",
            "selected",
            "setObjectsSelected",
            selected,
        )
    }

    fn set_xrayed(&mut self, key: &String, xrayed: bool) -> Result<()> {
        self.set_flag("xray", key, "setXRayed", "xrayed", "setObjectsXRayed", xrayed)
    }

    fn set_edges(&mut self, key: &String, edges: bool) -> Result<()> {
        self.set_flag("edges", key, "setEdges", "edges", "setObjectsEdges", edges)
    }

    fn fit_to_view(&mut self) -> Result<()> {
        let flight = get(&self.viewer, "cameraFlight");
        let scene = self.scene.clone();
        StrategyChain::new("fit to view")
            .then("cameraFlight.flyTo", || {
                call(flight.as_ref()?, "flyTo", &[scene.clone()]).map(|_| ())
            })
            .then("cameraFlight.jumpTo", || {
                call(flight.as_ref()?, "jumpTo", &[scene.clone()]).map(|_| ())
            })
            .then("fitToView", || call(&self.viewer, "fitToView", &[]).map(|_| ()))
            .run()
            .map(|_| ())
    }
}

/// `material.color.setRGB(r, g, b)` for three.js colors, else plain assignment.
fn write_material_color(material: &JsValue, color: Color) -> Option<()> {
    if let Some(current) = get(material, "color") {
        let channels = [color.r, color.g, color.b].map(|c| JsValue::from_f64(c as f64));
        if call(&current, "setRGB", &channels).is_some() {
            return Some(());
        }
    }
    set_existing(material, "color", &color_to_js(color))
}
