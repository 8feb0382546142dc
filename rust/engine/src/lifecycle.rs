// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle controller: staged engine bring-up and teardown.
//!
//! ```text
//! Uninitialized → CanvasReady → SceneReady → ModelLoading → ModelLoaded
//!                                                     ↘ Failed     ↘ TornDown
//! ```
//!
//! Bring-up suspends only while waiting for a frame, between scene readiness
//! polls, and while the model asset is fetched. A [`MountGuard`] shared with
//! the UI is checked after every suspension point; once it reports unmounted
//! the controller destroys the engine itself and returns `Error::Unmounted`
//! without touching viewer state.

use crate::adapter::SceneAdapter;
use bimview_core::{Error, Result, ViewerConfig, ViewerStatus};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Uninitialized,
    CanvasReady,
    SceneReady,
    ModelLoading,
    ModelLoaded,
    Failed(Error),
    TornDown,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Failed(_) | Phase::TornDown)
    }
}

/// Where the scene asset lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSource {
    pub model_id: String,
    pub scene_url: String,
}

impl ModelSource {
    pub fn new(model_id: impl Into<String>, scene_url: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            scene_url: scene_url.into(),
        }
    }
}

/// Shared "is the viewer still mounted" flag.
#[derive(Debug, Clone)]
pub struct MountGuard(Rc<Cell<bool>>);

impl MountGuard {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.get()
    }

    pub fn unmount(&self) {
        self.0.set(false);
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// The platform side of bring-up: canvas, engine scene, asset loading.
#[allow(async_fn_in_trait)]
pub trait EngineHost {
    type Adapter: SceneAdapter;

    /// Render surface size in CSS pixels.
    fn canvas_size(&self) -> (u32, u32);

    /// Yield until the next animation frame.
    async fn next_frame(&self);

    /// Whether the engine has built its scene graph.
    fn scene_ready(&self) -> bool;

    async fn sleep(&self, ms: u32);

    /// Fetch and parse the scene asset. `Ok(None)` means the engine produced no model.
    async fn load_model(&mut self, source: &ModelSource) -> Result<Option<Self::Adapter>>;

    /// Whether `url` answers at all, used to tell network failures from parse failures.
    async fn probe_asset(&self, url: &str) -> bool;

    /// Subscribe pick, key and mouse listeners.
    fn attach_input(&mut self) -> Result<()>;

    /// Destroy the engine instance.
    fn destroy(&mut self) -> Result<()>;
}

pub struct LifecycleController<H: EngineHost> {
    host: Option<H>,
    config: ViewerConfig,
    phase: Phase,
    guard: MountGuard,
}

impl<H: EngineHost> LifecycleController<H> {
    pub fn new(host: H, config: ViewerConfig) -> Self {
        Self::with_guard(host, config, MountGuard::new())
    }

    /// Use a guard the UI already holds.
    pub fn with_guard(host: H, config: ViewerConfig, guard: MountGuard) -> Self {
        Self {
            host: Some(host),
            config,
            phase: Phase::Uninitialized,
            guard,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Handle the UI flips on unmount.
    pub fn guard(&self) -> MountGuard {
        self.guard.clone()
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    /// Bring the engine up and load `source`.
    ///
    /// `status`, when given, must report a viewable conversion; otherwise the
    /// asset is not requested at all.
    pub async fn bring_up(
        &mut self,
        source: &ModelSource,
        status: Option<&ViewerStatus>,
    ) -> Result<H::Adapter> {
        match self.run(source, status).await {
            Ok(adapter) => {
                self.phase = Phase::ModelLoaded;
                tracing::info!(model_id = %source.model_id, "model loaded");
                Ok(adapter)
            }
            Err(err @ Error::Unmounted { .. }) => {
                tracing::debug!(error = %err, "bring-up cancelled");
                self.teardown();
                Err(err)
            }
            Err(err) => {
                tracing::warn!(model_id = %source.model_id, error = %err, "viewer failed to start");
                self.phase = Phase::Failed(err.clone());
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        source: &ModelSource,
        status: Option<&ViewerStatus>,
    ) -> Result<H::Adapter> {
        if let Some(status) = status {
            if !status.is_viewable() {
                return Err(Error::NotConverted {
                    status: status.describe(),
                });
            }
        }

        let guard = self.guard.clone();
        let config = self.config.clone();
        let host = self
            .host
            .as_mut()
            .ok_or_else(|| Error::Engine("viewer already torn down".into()))?;

        // canvas: bounded wait, then proceed regardless
        let mut size = host.canvas_size();
        let mut frames = 0;
        while (size.0 == 0 || size.1 == 0) && frames < config.canvas_retry_frames {
            host.next_frame().await;
            check_mounted(&guard, "canvas sizing")?;
            frames += 1;
            size = host.canvas_size();
        }
        if size.0 == 0 || size.1 == 0 {
            tracing::warn!(width = size.0, height = size.1, "canvas has no size, continuing");
        }
        self.phase = Phase::CanvasReady;

        // scene: poll with a fixed budget
        let mut attempts = 0;
        while !host.scene_ready() {
            if attempts >= config.scene_poll_attempts {
                return Err(Error::InitializationTimeout {
                    stage: "scene",
                    attempts,
                    waited_ms: config.scene_poll_budget_ms(),
                });
            }
            host.sleep(config.scene_poll_interval_ms).await;
            check_mounted(&guard, "scene construction")?;
            attempts += 1;
        }
        self.phase = Phase::SceneReady;
        tracing::debug!(attempts, "scene ready");

        // model
        self.phase = Phase::ModelLoading;
        let loaded = host.load_model(source).await;
        check_mounted(&guard, "model loading")?;

        let adapter = match loaded {
            Ok(Some(adapter)) => adapter,
            outcome => {
                let reason = match outcome {
                    Err(err) => err.to_string(),
                    _ => "engine returned no model".to_string(),
                };
                let reachable = host.probe_asset(&source.scene_url).await;
                check_mounted(&guard, "asset probe")?;
                return Err(if reachable {
                    Error::AssetParse {
                        url: source.scene_url.clone(),
                        reason,
                    }
                } else {
                    Error::AssetUnreachable {
                        url: source.scene_url.clone(),
                    }
                });
            }
        };

        host.attach_input()?;
        Ok(adapter)
    }

    /// Destroy the engine. Destruction errors are logged, never returned.
    pub fn teardown(&mut self) {
        self.guard.unmount();
        if let Some(mut host) = self.host.take() {
            if let Err(err) = host.destroy() {
                tracing::warn!(error = %err, "engine destroy failed");
            }
        }
        self.phase = Phase::TornDown;
    }
}

fn check_mounted(guard: &MountGuard, stage: &'static str) -> Result<()> {
    if guard.is_mounted() {
        Ok(())
    } else {
        Err(Error::Unmounted { stage })
    }
}
