// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory scene and host used by the integration tests.

#![allow(dead_code)]

use bimview_core::{Color, Error, Result};
use bimview_engine::{EngineHost, ModelSource, MountGuard, SceneAdapter, StrategyChain};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// Base material color every fake object shows without an override.
pub const BASE: Color = Color::new(0.5, 0.4, 0.3);

#[derive(Debug, Clone, PartialEq)]
pub struct FakeObject {
    pub key: String,
    pub visible: bool,
    /// Engine color override; `None` shows the base material.
    pub colorize: Option<Color>,
    pub selected: bool,
    pub xrayed: bool,
    pub edges: bool,
}

impl FakeObject {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            visible: true,
            colorize: None,
            selected: false,
            xrayed: false,
            edges: false,
        }
    }

    pub fn displayed_color(&self) -> Color {
        self.colorize.unwrap_or(BASE)
    }
}

/// Scene whose objects are addressed by index.
///
/// Each effect has a direct setter and a batch fallback; individual
/// strategies can be switched off to mimic older engine builds.
#[derive(Debug, Default)]
pub struct FakeScene {
    pub objects: RefCell<Vec<FakeObject>>,
    pub disabled: RefCell<HashSet<&'static str>>,
    pub fits: Cell<u32>,
}

impl FakeScene {
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            objects: RefCell::new(keys.iter().map(|k| FakeObject::new(k)).collect()),
            ..Default::default()
        }
    }

    pub fn disable(self, strategy: &'static str) -> Self {
        self.set_enabled(strategy, false);
        self
    }

    /// Switch a strategy on or off while the scene is in use.
    pub fn set_enabled(&self, strategy: &'static str, enabled: bool) {
        let mut disabled = self.disabled.borrow_mut();
        if enabled {
            disabled.remove(strategy);
        } else {
            disabled.insert(strategy);
        }
    }

    pub fn object(&self, key: &str) -> FakeObject {
        self.objects
            .borrow()
            .iter()
            .find(|o| o.key == key)
            .cloned()
            .unwrap_or_else(|| panic!("no object {key}"))
    }

    pub fn visible_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .borrow()
            .iter()
            .filter(|o| o.visible)
            .map(|o| o.key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn keys_with_color(&self, color: Color) -> Vec<String> {
        self.objects
            .borrow()
            .iter()
            .filter(|o| o.colorize.map(|c| c.approx_eq(&color, 1e-3)).unwrap_or(false))
            .map(|o| o.key.clone())
            .collect()
    }

    fn enabled(&self, strategy: &'static str) -> bool {
        !self.disabled.borrow().contains(strategy)
    }

    fn mutate(&self, handle: usize, f: impl FnOnce(&mut FakeObject)) -> Option<()> {
        self.objects.borrow_mut().get_mut(handle).map(f)
    }

    fn flag(
        &self,
        effect: &'static str,
        setter: &'static str,
        batch: &'static str,
        handle: usize,
        f: impl Fn(&mut FakeObject) + Copy,
    ) -> Result<()> {
        StrategyChain::new(effect)
            .then_if(self.enabled(setter), setter, || self.mutate(handle, f))
            .then_if(self.enabled(batch), batch, || self.mutate(handle, f))
            .run()
            .map(|_| ())
    }
}

impl SceneAdapter for FakeScene {
    type Handle = usize;

    fn object_keys(&self) -> Vec<String> {
        self.objects.borrow().iter().map(|o| o.key.clone()).collect()
    }

    fn lookup(&self, key: &str) -> Vec<usize> {
        self.objects
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, o)| o.key == key)
            .map(|(i, _)| i)
            .collect()
    }

    fn set_visible(&mut self, handle: &usize, visible: bool) -> Result<()> {
        self.flag("visible", "setVisible", "setObjectsVisible", *handle, move |o| {
            o.visible = visible
        })
    }

    fn read_color(&self, handle: &usize) -> Result<Option<Color>> {
        if !self.enabled("getColorize") {
            return Err(Error::CapabilityUnavailable { effect: "read color" });
        }
        Ok(self.objects.borrow().get(*handle).and_then(|o| o.colorize))
    }

    fn write_color(&mut self, handle: &usize, color: Color) -> Result<()> {
        self.flag("colorize", "setColorize", "setObjectsColorized", *handle, move |o| {
            o.colorize = Some(color)
        })
    }

    fn reset_color(&mut self, handle: &usize) -> Result<()> {
        self.flag("reset color", "setColorize", "setObjectsColorized", *handle, |o| {
            o.colorize = None
        })
    }

    fn set_selected(&mut self, handle: &usize, selected: bool) -> Result<()> {
        self.flag("selected", "setSelected", "setObjectsSelected", *handle, move |o| {
            o.selected = selected
        })
    }

    fn set_xrayed(&mut self, handle: &usize, xrayed: bool) -> Result<()> {
        self.flag("xray", "setXRayed", "setObjectsXRayed", *handle, move |o| {
            o.xrayed = xrayed
        })
    }

    fn set_edges(&mut self, handle: &usize, edges: bool) -> Result<()> {
        self.flag("edges", "setEdges", "setObjectsEdges", *handle, move |o| o.edges = edges)
    }

    fn fit_to_view(&mut self) -> Result<()> {
        self.fits.set(self.fits.get() + 1);
        Ok(())
    }
}

/// What the fake host's asset loader does.
#[derive(Debug, Clone)]
pub enum LoadBehavior {
    Succeed(Vec<&'static str>),
    NoModel,
    Fail(String),
}

/// Host with scripted readiness. Every suspension resolves immediately.
pub struct FakeHost {
    pub canvas: Cell<(u32, u32)>,
    /// Canvas size reported after the first frame.
    pub canvas_after_frame: (u32, u32),
    /// Scene becomes ready after this many polls; `None` never.
    pub scene_ready_after: Option<u32>,
    pub polls: Cell<u32>,
    pub sleeps: Cell<u32>,
    pub frames: Cell<u32>,
    pub load: LoadBehavior,
    pub reachable: bool,
    pub probes: Cell<u32>,
    pub input_attached: bool,
    /// Shared so tests can observe destruction after the host is dropped.
    pub destroyed: Rc<Cell<bool>>,
    pub destroy_fails: bool,
    /// Unmount this guard while loading the model.
    pub unmount_during_load: Option<MountGuard>,
}

impl FakeHost {
    pub fn ready(keys: Vec<&'static str>) -> Self {
        Self {
            canvas: Cell::new((800, 600)),
            canvas_after_frame: (800, 600),
            scene_ready_after: Some(0),
            polls: Cell::new(0),
            sleeps: Cell::new(0),
            frames: Cell::new(0),
            load: LoadBehavior::Succeed(keys),
            reachable: true,
            probes: Cell::new(0),
            input_attached: false,
            destroyed: Rc::new(Cell::new(false)),
            destroy_fails: false,
            unmount_during_load: None,
        }
    }
}

impl EngineHost for FakeHost {
    type Adapter = FakeScene;

    fn canvas_size(&self) -> (u32, u32) {
        self.canvas.get()
    }

    async fn next_frame(&self) {
        self.frames.set(self.frames.get() + 1);
        self.canvas.set(self.canvas_after_frame);
    }

    fn scene_ready(&self) -> bool {
        let polls = self.polls.get();
        self.polls.set(polls + 1);
        matches!(self.scene_ready_after, Some(after) if polls >= after)
    }

    async fn sleep(&self, _ms: u32) {
        self.sleeps.set(self.sleeps.get() + 1);
    }

    async fn load_model(&mut self, _source: &ModelSource) -> Result<Option<FakeScene>> {
        if let Some(guard) = &self.unmount_during_load {
            guard.unmount();
        }
        match &self.load {
            LoadBehavior::Succeed(keys) => Ok(Some(FakeScene::with_keys(keys))),
            LoadBehavior::NoModel => Ok(None),
            LoadBehavior::Fail(reason) => Err(Error::Engine(reason.clone())),
        }
    }

    async fn probe_asset(&self, _url: &str) -> bool {
        self.probes.set(self.probes.get() + 1);
        self.reachable
    }

    fn attach_input(&mut self) -> Result<()> {
        self.input_attached = true;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroyed.set(true);
        if self.destroy_fails {
            Err(Error::Engine("canvas already detached".into()))
        } else {
            Ok(())
        }
    }
}
