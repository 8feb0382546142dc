// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIMView Core
//!
//! Domain data for the BIMView scene synchronization engine.
//!
//! ## Overview
//!
//! - **Metadata index**: element id → category, family, type, properties,
//!   parsed from the converter's `metadata.json`
//! - **Viewer state**: selection, hidden ids, isolation, x-ray and display mode,
//!   changed only through plain transitions with no engine side effects
//! - **Colors**: highlight and neutral tint with float-tolerant comparison
//! - **Status and groups**: backend conversion status and saved element groups
//!
//! ## Quick Start
//!
//! ```rust
//! use bimview_core::{DisplayMode, ViewerState};
//!
//! let mut state = ViewerState::new();
//! state.select("A", false);
//! state.select("B", true);
//! state.set_hidden("C", true);
//! state.set_display_mode(DisplayMode::Wireframe);
//!
//! assert_eq!(state.primary_selection(), Some("A"));
//! assert!(!state.is_visible("C"));
//! ```

pub mod color;
pub mod config;
pub mod element;
pub mod error;
pub mod group;
pub mod state;
pub mod status;

pub use color::Color;
pub use config::ViewerConfig;
pub use element::{Element, ElementId, MetadataIndex};
pub use error::{Error, Result};
pub use group::ElementGroup;
pub use state::{DisplayMode, StateSnapshot, ViewerState};
pub use status::{ConversionStatus, ViewerStatus};
