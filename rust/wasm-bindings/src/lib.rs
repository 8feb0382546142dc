// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIMView WebAssembly Bindings
//!
//! JavaScript API for the scene synchronization engine built with wasm-bindgen.

use wasm_bindgen::prelude::*;

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

mod api;
mod host;
mod js_adapter;
mod utils;

pub use api::BimViewer;
pub use host::JsEngineHost;
pub use js_adapter::JsSceneAdapter;
pub use utils::set_panic_hook as init_panic_hook;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    if tracing_wasm::try_set_as_global_default().is_err() {
        web_sys::console::warn_1(&"bimview: tracing subscriber already installed".into());
    }
}

/// Get the version of BIMView
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
