//! # preview-render
//!
//! Tolerant conversion of LaTeX-dialect and Markdown documents to HTML for
//! document preview surfaces.
//!
//! ## Features
//!
//! - **LaTeX dialect**: theorem-like environments, lists, quotes, verbatim,
//!   inline commands, sectioning, `abstract` and `\maketitle`
//! - **Math**: inline `$...$`/`\(...\)`, display `$$...$$`/`\[...\]` and
//!   amsmath environments, with a fixed macro table and configurable backends
//! - **Pseudocode**: algorithm2e `algorithm` environments as structured HTML
//! - **Markdown**: tables, footnotes, task lists, sub/superscript, emoji and
//!   highlighted code blocks
//! - **Fault tolerance**: a failing math span or algorithm degrades to an
//!   error element holding its source; nothing else is affected
//!
//! ## Quick Start
//!
//! ```rust
//! use preview_render::{render, Renderer, RenderConfig};
//!
//! let html = render(r"\begin{theorem}$x^2 \ge 0$\end{theorem}", "tex");
//! assert!(html.starts_with(r#"<div class="latex-content">"#));
//!
//! let renderer = Renderer::new(RenderConfig::default()).unwrap();
//! let html = renderer.render("# Notes", "md");
//! assert!(html.contains("<h1>Notes</h1>"));
//! ```
//!
//! ## Configuration
//!
//! [`RenderConfig`] is plain data and loads from TOML; see the `config`
//! module for the format.
//!
//! ## Features
//!
//! - `mathml`: MathML backend (requires `latex2mathml`)
//! - `katex`: server-side KaTeX rendering (requires `katex`)
//! - `wasm`: WebAssembly bindings (requires `wasm-bindgen`)
//! - `cli`: the `preview-render` command-line tool

pub mod config;
pub mod document;
pub mod error;
pub mod html;
pub mod latex;
pub mod markdown;
pub mod math;

// FFI module (only for non-WASM builds)
#[cfg(not(target_arch = "wasm32"))]
pub mod ffi;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{CustomEnvironment, Locale, MarkdownConfig, RenderConfig};
pub use document::ContentKind;
pub use error::{ConfigError, Error, RenderError, Result};
pub use latex::LatexRenderer;
pub use markdown::MarkdownRenderer;
pub use math::{MathBackend, MathMode, MathRenderer};

use log::error;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::LazyLock;

/// Dispatches documents to the LaTeX, Markdown or plain-text renderer.
///
/// Immutable after construction, so one instance can serve many threads.
#[derive(Debug)]
pub struct Renderer {
    config: RenderConfig,
    latex: LatexRenderer,
    markdown: MarkdownRenderer,
}

impl Renderer {
    /// Build a renderer; fails on invalid custom environments or macros.
    pub fn new(config: RenderConfig) -> Result<Self> {
        Ok(Self {
            latex: LatexRenderer::new(&config)?,
            markdown: MarkdownRenderer::new(config.markdown.clone()),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `content` according to a file-type token (`md`, `tex`, ...).
    pub fn render(&self, content: &str, file_type: &str) -> String {
        self.render_kind(content, ContentKind::from_file_type(file_type))
    }

    /// Render `content` as `kind`.
    ///
    /// A panic inside a renderer is caught here and the input comes back as a
    /// single `<pre>` block.
    pub fn render_kind(&self, content: &str, kind: ContentKind) -> String {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| match kind {
            ContentKind::Markdown => self.markdown.render(content),
            ContentKind::Latex => self.latex.render(content),
            ContentKind::Plain => render_plain(content),
        }));

        let fragment = match rendered {
            Ok(fragment) => fragment,
            Err(_) => {
                error!("{} renderer failed, falling back to preformatted text", kind);
                render_plain(content)
            }
        };

        if self.config.standalone {
            let head = match kind {
                ContentKind::Latex => self.latex.head_content(),
                _ => None,
            };
            html::standalone_page(&fragment, &self.config, head.as_deref())
        } else {
            fragment
        }
    }

    /// Read a file and render it according to its extension.
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(self.render_kind(&content, ContentKind::from_path(path)))
    }
}

/// The plain-text path: the input verbatim in one `<pre>`.
pub fn render_plain(content: &str) -> String {
    format!("<pre>{}</pre>", content)
}

static DEFAULT_RENDERER: LazyLock<Renderer> = LazyLock::new(|| {
    Renderer::new(RenderConfig::default()).expect("default configuration is valid")
});

/// Render with the default configuration.
pub fn render(content: &str, file_type: &str) -> String {
    DEFAULT_RENDERER.render(content, file_type)
}
