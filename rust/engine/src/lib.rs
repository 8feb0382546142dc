// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIMView Engine
//!
//! Keeps an opaque, already-loaded 3D scene in line with the viewer state a
//! UI asks for: selection highlight, hidden and isolated elements, x-ray and
//! display mode. Engine specifics live behind [`SceneAdapter`]; bring-up
//! lives behind [`EngineHost`].
//!
//! ## Pieces
//!
//! - [`Resolver`]: element id → live handles (composite, bare, suffix keys)
//! - [`AppearanceLedger`]: original colors of overridden objects
//! - [`Reconciler`]: convergent routines per state dimension
//! - [`LifecycleController`]: canvas → scene → model bring-up, teardown
//! - [`Viewer`]: the operation table exposed to the UI
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut controller = LifecycleController::new(host, config.clone());
//! let adapter = controller.bring_up(&source, Some(&status)).await?;
//!
//! let mut viewer = Viewer::new(config);
//! viewer.attach(adapter);
//! viewer.select_elements(["2O2Fr$t4X7Zf8NOew3FLOH"]);
//! viewer.isolate_elements(Some(["2O2Fr$t4X7Zf8NOew3FLOH"]));
//! ```

pub mod adapter;
pub mod capability;
pub mod input;
pub mod ledger;
pub mod lifecycle;
pub mod reconciler;
pub mod resolver;
pub mod viewer;

pub use adapter::SceneAdapter;
pub use capability::{Applied, StrategyChain, MAX_STRATEGIES};
pub use input::{ModifierTracker, Modifiers, PickEvent, PickIntent};
pub use ledger::{AppearanceLedger, Original};
pub use lifecycle::{EngineHost, LifecycleController, ModelSource, MountGuard, Phase};
pub use reconciler::{ReconcileReport, Reconciler};
pub use resolver::{KeyScheme, Resolution, Resolver};
pub use viewer::Viewer;
