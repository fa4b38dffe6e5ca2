//! Native MathML output.
//!
//! With the `mathml` feature the source is converted server-side by
//! `latex2mathml`. Without it the region is emitted the same way as the KaTeX
//! backend, so the choice of backend never changes which spans fail.

use super::katex::validate;
use super::{MathMode, MathRenderer};
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct MathMLRenderer;

impl MathMLRenderer {
    pub fn new() -> Self {
        MathMLRenderer
    }
}

#[cfg(feature = "mathml")]
fn convert(latex: &str, mode: MathMode) -> Result<String> {
    use crate::error::RenderError;
    use latex2mathml::{latex_to_mathml, DisplayStyle};

    validate(latex)?;
    let style = match mode {
        MathMode::Inline => DisplayStyle::Inline,
        MathMode::Display => DisplayStyle::Block,
    };
    let mathml = latex_to_mathml(latex, style).map_err(|e| RenderError::Math(e.to_string()))?;
    // latex2mathml reports unknown commands inline instead of failing.
    if mathml.contains("[PARSE ERROR:") {
        return Err(RenderError::Math("unsupported command or token".to_string()).into());
    }
    Ok(match mode {
        MathMode::Inline => format!(r#"<span class="math inline">{}</span>"#, mathml),
        MathMode::Display => format!(r#"<div class="math display">{}</div>"#, mathml),
    })
}

#[cfg(not(feature = "mathml"))]
fn convert(latex: &str, mode: MathMode) -> Result<String> {
    use crate::html::escape_html;

    validate(latex)?;
    Ok(match mode {
        MathMode::Inline => format!(r#"<span class="math inline">\({}\)</span>"#, escape_html(latex)),
        MathMode::Display => format!(r#"<div class="math display">\[{}\]</div>"#, escape_html(latex)),
    })
}

impl MathRenderer for MathMLRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        convert(latex, MathMode::Inline)
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        convert(latex, MathMode::Display)
    }

    fn head_content(&self) -> Option<String> {
        Some("<style>math { font-size: 1.1em; } .math-error { color: #b00; font-family: monospace; }</style>".to_string())
    }
}
