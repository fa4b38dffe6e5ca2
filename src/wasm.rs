//! WebAssembly bindings for JavaScript/TypeScript.
//!
//! Configuration crosses the boundary as TOML text, the same format the
//! FFI layer and the command-line tool read.

#![cfg(feature = "wasm")]

use crate::config::RenderConfig;
use crate::Renderer;
use wasm_bindgen::prelude::*;

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Render a document to HTML with the default configuration.
///
/// `file_type` is `"md"`, `"tex"`, or anything else for plain text.
#[wasm_bindgen]
pub fn render(content: &str, file_type: &str) -> String {
    console_error_panic_hook::set_once();
    crate::render(content, file_type)
}

/// A configured renderer kept alive across edits of a previewed document.
#[wasm_bindgen]
pub struct Previewer {
    inner: Renderer,
}

#[wasm_bindgen]
impl Previewer {
    /// Build a previewer from optional TOML configuration text.
    ///
    /// Throws when the TOML does not parse or names an invalid custom
    /// environment or macro.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<Previewer, JsError> {
        console_error_panic_hook::set_once();

        let config = match config.as_deref() {
            Some(toml) => RenderConfig::from_toml_str(toml).map_err(js_error)?,
            None => RenderConfig::default(),
        };
        let inner = Renderer::new(config).map_err(js_error)?;
        Ok(Previewer { inner })
    }

    /// Render `content` according to its file-type token.
    pub fn render(&self, content: &str, file_type: &str) -> String {
        self.inner.render(content, file_type)
    }

    /// Whether output is a complete HTML page rather than a fragment.
    #[wasm_bindgen(getter)]
    pub fn standalone(&self) -> bool {
        self.inner.config().standalone
    }
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether an optional cargo feature was compiled in.
#[wasm_bindgen(js_name = hasFeature)]
pub fn has_feature(name: &str) -> bool {
    match name {
        "mathml" => cfg!(feature = "mathml"),
        "katex" => cfg!(feature = "katex"),
        "wasm" => true,
        _ => false,
    }
}

/// ```typescript
/// export function render(content: string, fileType: string): string;
/// export function getVersion(): string;
/// export function hasFeature(name: "mathml" | "katex" | "wasm"): boolean;
///
/// export class Previewer {
///     constructor(config?: string);
///     render(content: string, fileType: string): string;
///     readonly standalone: boolean;
/// }
/// ```
const _: () = ();
