//! Incident Pulse - live incident dashboard client
//!
//! Loads a snapshot of recent incidents, then follows the server's SSE push
//! stream from the snapshot cursor. Displays:
//! - A capped, newest-first incident table
//! - Severity-styled markers on a clustered map, fitted once after the snapshot
//! - A status line with row and marker counts
//!
//! `core` is platform-agnostic. The browser dashboard (egui) is built for
//! `wasm32`; the `cli` feature adds a native headless follower.

pub mod core;
pub mod time;

#[cfg(all(not(target_arch = "wasm32"), feature = "cli"))]
pub mod client_native;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod app;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod client_wasm;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod theme;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::app::PulseApp;

    fn canvas() -> Result<web_sys::HtmlCanvasElement, JsValue> {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("canvas"))
            .ok_or_else(|| JsValue::from_str("no canvas element"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("not a canvas element"))
    }

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();

        // Initialize tracing for browser console
        tracing_wasm::set_as_global_default();

        let web_options = eframe::WebOptions::default();

        wasm_bindgen_futures::spawn_local(async {
            let canvas = match canvas() {
                Ok(canvas) => canvas,
                Err(e) => {
                    tracing::error!(error = ?e, "Dashboard canvas missing");
                    return;
                }
            };

            if let Err(e) = eframe::WebRunner::new()
                .start(
                    canvas,
                    web_options,
                    Box::new(|cc| Ok(Box::new(PulseApp::new(cc)))),
                )
                .await
            {
                tracing::error!(error = ?e, "Failed to start eframe");
            }
        });
    }
}
