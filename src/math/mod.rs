//! Math rendering backends and the engine wrapper used by the LaTeX pipeline.

mod katex;
mod macros;
mod mathml;

pub use self::katex::{ClientEngine, ClientRenderer};
#[cfg(feature = "katex")]
pub use self::katex::ServerRenderer;
pub use self::macros::{Macro, MacroTable};
pub use self::mathml::MathMLRenderer;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Math rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// KaTeX: rendered in-process with the `katex` feature, otherwise emitted
    /// for client-side rendering.
    #[default]
    KaTeX,
    /// Convert to MathML for native browser rendering.
    MathML,
    /// Output raw LaTeX for MathJax to render client-side.
    MathJax,
}

/// Typesetting mode of a math region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

/// Trait for math renderers.
pub trait MathRenderer: Send + Sync {
    /// Render inline math.
    fn render_inline(&self, latex: &str) -> Result<String>;

    /// Render display math.
    fn render_display(&self, latex: &str) -> Result<String>;

    /// Get any required HTML head content (scripts, styles).
    fn head_content(&self) -> Option<String>;

    /// Render in the given mode.
    fn render(&self, latex: &str, mode: MathMode) -> Result<String> {
        match mode {
            MathMode::Inline => self.render_inline(latex),
            MathMode::Display => self.render_display(latex),
        }
    }
}

/// Create a math renderer for the given backend.
pub fn create_renderer(backend: MathBackend) -> Box<dyn MathRenderer> {
    match backend {
        #[cfg(feature = "katex")]
        MathBackend::KaTeX => Box::new(ServerRenderer),
        #[cfg(not(feature = "katex"))]
        MathBackend::KaTeX => Box::new(ClientRenderer::new(ClientEngine::KaTeX)),
        MathBackend::MathJax => Box::new(ClientRenderer::new(ClientEngine::MathJax)),
        MathBackend::MathML => Box::new(MathMLRenderer::new()),
    }
}

/// A renderer paired with the macro table applied to every region before it.
pub struct MathEngine {
    renderer: Box<dyn MathRenderer>,
    macros: MacroTable,
}

impl MathEngine {
    /// Engine with the built-in macro table extended by `extra`.
    pub fn new(backend: MathBackend, extra: &BTreeMap<String, String>) -> Result<Self> {
        Ok(Self::with_renderer(create_renderer(backend), MacroTable::builtin().extended(extra)?))
    }

    /// Engine around an arbitrary renderer.
    pub fn with_renderer(renderer: Box<dyn MathRenderer>, macros: MacroTable) -> Self {
        Self { renderer, macros }
    }

    /// Expand macros in `tex` and render it.
    pub fn render(&self, tex: &str, mode: MathMode) -> Result<String> {
        let expanded = self.macros.expand(tex)?;
        self.renderer.render(&expanded, mode)
    }

    /// Head content needed by the backend in standalone pages.
    pub fn head_content(&self) -> Option<String> {
        self.renderer.head_content()
    }
}

impl Default for MathEngine {
    fn default() -> Self {
        Self::with_renderer(create_renderer(MathBackend::default()), MacroTable::builtin())
    }
}

impl std::fmt::Debug for MathEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathEngine").field("macros", &self.macros).finish_non_exhaustive()
    }
}
